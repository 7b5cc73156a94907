//! 提交与评分的纯规则

use chrono::{DateTime, Utc};

use crate::errors::{LmsError, Result};
use crate::models::courses::entities::Assignment;
use crate::models::submissions::entities::SubmissionStatistics;

/// 迟交判定结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lateness {
    pub is_late: bool,
    /// 扣分百分比，仅在迟交且作业设置了扣分时存在
    pub penalty: Option<f64>,
}

/// 下一次提交序号，从 1 开始
pub fn next_attempt_number(latest: Option<i32>) -> i32 {
    latest.unwrap_or(0) + 1
}

pub fn check_attempt_limit(attempt_number: i32, max_attempts: Option<i32>) -> Result<()> {
    match max_attempts {
        Some(max) if attempt_number > max => Err(LmsError::conflict(format!(
            "已达到最大提交次数 ({max})"
        ))),
        _ => Ok(()),
    }
}

/// 按截止时间判定是否迟交；不允许迟交时返回 Validation 错误
pub fn evaluate_lateness(assignment: &Assignment, now: DateTime<Utc>) -> Result<Lateness> {
    let is_late = assignment.due_date.is_some_and(|due| now > due);
    if !is_late {
        return Ok(Lateness {
            is_late: false,
            penalty: None,
        });
    }
    if !assignment.allow_late_submission {
        return Err(LmsError::validation("作业已过截止时间，不允许迟交"));
    }
    Ok(Lateness {
        is_late: true,
        penalty: (assignment.late_penalty_percent > 0.0).then_some(assignment.late_penalty_percent),
    })
}

pub fn check_score_range(score: f64, max_score: f64) -> Result<()> {
    if !score.is_finite() || score < 0.0 || score > max_score {
        return Err(LmsError::validation(format!(
            "分数必须在 0 到 {max_score} 之间"
        )));
    }
    Ok(())
}

/// 扣除迟交惩罚后的有效分数
pub fn effective_score(score: f64, late_penalty: Option<f64>) -> f64 {
    score * (1.0 - late_penalty.unwrap_or(0.0) / 100.0)
}

pub fn is_passed(score: f64, late_penalty: Option<f64>, passing_score: f64) -> bool {
    effective_score(score, late_penalty) >= passing_score
}

/// 汇总 (score, is_passed) 行；无数据时平均分与通过率均为 0
pub fn summarize_scores(assignment_id: &str, rows: &[(Option<f64>, bool)]) -> SubmissionStatistics {
    let total = rows.len();
    let scores: Vec<f64> = rows.iter().filter_map(|(score, _)| *score).collect();
    let passed = rows.iter().filter(|(_, passed)| *passed).count();

    let average_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f64 / total as f64
    };

    SubmissionStatistics {
        assignment_id: assignment_id.to_string(),
        total_submissions: total as i64,
        graded_submissions: scores.len() as i64,
        average_score,
        pass_rate,
    }
}
