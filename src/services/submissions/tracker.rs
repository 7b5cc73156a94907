//! 作业提交跟踪
//!
//! 负责提交序号分配、迟交判定、评分、撤回以及按作业的统计。
//! 角色校验由 HTTP 边界完成，归属校验在此处完成。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::rules;
use crate::cache::{self, ObjectCache};
use crate::errors::{LmsError, Result};
use crate::models::auth::entities::AuthContext;
use crate::models::submissions::{
    entities::{AssignmentSubmission, SubmissionStatistics, SubmissionStatus},
    requests::{GradeCommand, SubmissionListQuery, SubmitCommand},
    responses::SubmissionListResponse,
};
use crate::storage::{GradeUpdate, Storage, SubmissionDraft};
use crate::utils::random_code::generate_id;

pub struct SubmissionTracker {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
    stats_ttl: u64,
}

fn stats_cache_key(assignment_id: &str) -> String {
    format!("assignment_stats:{assignment_id}")
}

impl SubmissionTracker {
    pub fn new(storage: Arc<dyn Storage>, cache: Arc<dyn ObjectCache>, stats_ttl: u64) -> Self {
        Self {
            storage,
            cache,
            stats_ttl,
        }
    }

    /// 提交作业，返回新写入的提交
    pub async fn submit(
        &self,
        auth: &AuthContext,
        command: SubmitCommand,
    ) -> Result<AssignmentSubmission> {
        let assignment = self
            .storage
            .get_assignment_by_id(&command.assignment_id)
            .await?
            .ok_or_else(|| LmsError::not_found(format!("作业不存在: {}", command.assignment_id)))?;

        if let Some(course_id) = &command.course_id
            && course_id != &assignment.course_id
        {
            return Err(LmsError::validation("course_id 与作业所属课程不一致"));
        }

        let now = Utc::now();
        let lateness = rules::evaluate_lateness(&assignment, now)?;

        let user_id = auth.user_id.clone();
        let course_id = assignment.course_id.clone();
        let max_score = assignment.max_score;
        let max_attempts = assignment.max_attempts;
        let module_id = command.module_id.or_else(|| assignment.module_id.clone());
        let lesson_id = command.lesson_id.or_else(|| assignment.lesson_id.clone());
        let assignment_id = assignment.id.clone();

        let draft: SubmissionDraft = Box::new(move |latest| {
            let attempt_number =
                rules::next_attempt_number(latest.map(|s| s.attempt_number));
            rules::check_attempt_limit(attempt_number, max_attempts)?;

            Ok(AssignmentSubmission {
                id: generate_id(),
                user_id,
                assignment_id,
                course_id,
                module_id,
                lesson_id,
                submission_text: command.submission_text,
                file_urls: command.file_urls,
                score: None,
                max_score,
                attempt_number,
                is_passed: false,
                is_late: lateness.is_late,
                late_penalty_applied: lateness.penalty,
                submitted_at: now,
                graded_at: None,
                graded_by: None,
                status: SubmissionStatus::Submitted,
                instructor_feedback: None,
                rubric_scores: None,
                created_at: now,
                updated_at: now,
            })
        });

        let submission = self
            .storage
            .create_submission_attempt(&auth.user_id, &assignment.id, draft)
            .await?;
        self.invalidate_statistics(&assignment.id).await;

        info!(
            "User {} submitted assignment {} (attempt {}, late: {})",
            submission.user_id,
            submission.assignment_id,
            submission.attempt_number,
            submission.is_late
        );
        Ok(submission)
    }

    /// 评分；提交不存在时返回 `Ok(None)`
    pub async fn grade(
        &self,
        submission_id: &str,
        command: GradeCommand,
        grader: &AuthContext,
    ) -> Result<Option<AssignmentSubmission>> {
        let Some(submission) = self.storage.get_submission_by_id(submission_id).await? else {
            return Ok(None);
        };

        let assignment = self
            .storage
            .get_assignment_by_id(&submission.assignment_id)
            .await?
            .ok_or_else(|| {
                LmsError::not_found(format!("作业不存在: {}", submission.assignment_id))
            })?;

        rules::check_score_range(command.score, submission.max_score)?;
        let is_passed = rules::is_passed(
            command.score,
            submission.late_penalty_applied,
            assignment.passing_score,
        );

        let graded = self
            .storage
            .grade_submission(
                submission_id,
                GradeUpdate {
                    score: command.score,
                    is_passed,
                    instructor_feedback: command.instructor_feedback,
                    rubric_scores: command.rubric_scores,
                    graded_by: grader.user_id.clone(),
                    graded_at: Utc::now(),
                },
            )
            .await?;

        if graded.is_some() {
            self.invalidate_statistics(&submission.assignment_id).await;
            info!(
                "Submission {} graded by {}: score {} (passed: {})",
                submission_id, grader.user_id, command.score, is_passed
            );
        }
        Ok(graded)
    }

    /// 撤回本人未评分的提交
    pub async fn delete(&self, auth: &AuthContext, submission_id: &str) -> Result<()> {
        let submission = self
            .storage
            .get_submission_by_id(submission_id)
            .await?
            .ok_or_else(|| LmsError::not_found(format!("提交不存在: {submission_id}")))?;

        if submission.user_id != auth.user_id {
            return Err(LmsError::authorization("只能撤回自己的提交"));
        }
        if submission.status == SubmissionStatus::Graded {
            return Err(LmsError::conflict("已评分的提交不能撤回"));
        }

        // 条件删除：检查之后被评分的提交不会被删掉
        if !self.storage.delete_ungraded_submission(submission_id).await? {
            return Err(LmsError::conflict("提交状态已变化，无法撤回"));
        }
        self.invalidate_statistics(&submission.assignment_id).await;
        Ok(())
    }

    pub async fn get(&self, submission_id: &str) -> Result<Option<AssignmentSubmission>> {
        self.storage.get_submission_by_id(submission_id).await
    }

    pub async fn list(&self, query: SubmissionListQuery) -> Result<SubmissionListResponse> {
        self.storage.list_submissions_with_pagination(query).await
    }

    /// 待评分队列
    pub async fn pending(&self, mut query: SubmissionListQuery) -> Result<SubmissionListResponse> {
        query.status = Some(SubmissionStatus::Submitted);
        self.storage.list_submissions_with_pagination(query).await
    }

    pub async fn latest_attempt(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        self.storage.get_latest_submission(user_id, assignment_id).await
    }

    pub async fn attempt_history(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Vec<AssignmentSubmission>> {
        self.storage.list_user_attempts(user_id, assignment_id).await
    }

    /// 下一次提交是否会超出作业的最大提交次数
    ///
    /// 用于区分提交冲突的原因：次数用尽，或是并发写入撞车。
    pub async fn attempts_exhausted(&self, user_id: &str, assignment_id: &str) -> Result<bool> {
        let Some(assignment) = self.storage.get_assignment_by_id(assignment_id).await? else {
            return Ok(false);
        };
        let latest = self
            .storage
            .get_latest_submission(user_id, assignment_id)
            .await?;
        let next = rules::next_attempt_number(latest.map(|s| s.attempt_number));
        Ok(rules::check_attempt_limit(next, assignment.max_attempts).is_err())
    }

    /// 作业统计（带缓存）
    pub async fn statistics(&self, assignment_id: &str) -> Result<SubmissionStatistics> {
        let key = stats_cache_key(assignment_id);
        if let Some(stats) = cache::get_json::<SubmissionStatistics>(self.cache.as_ref(), &key).await
        {
            debug!("Statistics cache hit for assignment {}", assignment_id);
            return Ok(stats);
        }

        if self
            .storage
            .get_assignment_by_id(assignment_id)
            .await?
            .is_none()
        {
            return Err(LmsError::not_found(format!("作业不存在: {assignment_id}")));
        }

        let rows = self.storage.list_assignment_scores(assignment_id).await?;
        let stats = rules::summarize_scores(assignment_id, &rows);
        cache::insert_json(self.cache.as_ref(), &key, &stats, self.stats_ttl).await;
        Ok(stats)
    }

    async fn invalidate_statistics(&self, assignment_id: &str) {
        self.cache.remove(&stats_cache_key(assignment_id)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::entities::UserRole;
    use crate::services::test_support::{Fixture, TempDatabase, file_fixture, fixture};

    fn submit_command(assignment_id: &str) -> SubmitCommand {
        SubmitCommand {
            assignment_id: assignment_id.to_string(),
            course_id: None,
            module_id: None,
            lesson_id: None,
            submission_text: Some("my essay".to_string()),
            file_urls: vec![],
        }
    }

    fn grade_command(score: f64) -> GradeCommand {
        GradeCommand {
            score,
            instructor_feedback: Some("Good".to_string()),
            rubric_scores: None,
        }
    }

    fn tracker(fx: &Fixture) -> SubmissionTracker {
        SubmissionTracker::new(fx.storage.clone(), fx.cache.clone(), 60)
    }

    #[tokio::test]
    async fn test_submit_grade_resubmit_scenario() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);
        let instructor = AuthContext::new("i1", UserRole::Instructor);

        let first = tracker
            .submit(&student, submit_command(&fx.assignment.id))
            .await
            .unwrap();
        assert_eq!(first.attempt_number, 1);
        assert_eq!(first.status, SubmissionStatus::Submitted);
        assert_eq!(first.course_id, fx.course.id);
        assert_eq!(first.max_score, 100.0);
        assert!(first.score.is_none());

        let graded = tracker
            .grade(&first.id, grade_command(82.0), &instructor)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(graded.status, SubmissionStatus::Graded);
        assert_eq!(graded.score, Some(82.0));
        assert_eq!(graded.instructor_feedback.as_deref(), Some("Good"));
        assert_eq!(graded.graded_by.as_deref(), Some("i1"));
        assert!(graded.graded_at.is_some());
        assert!(graded.is_passed);

        let second = tracker
            .submit(&student, submit_command(&fx.assignment.id))
            .await
            .unwrap();
        assert_eq!(second.attempt_number, 2);
        assert_ne!(second.id, first.id);

        let first_again = tracker.get(&first.id).await.unwrap().unwrap();
        assert_eq!(first_again.score, Some(82.0));
    }

    #[tokio::test]
    async fn test_attempt_numbers_have_no_gaps() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);
        let other = AuthContext::new("u2", UserRole::Student);

        for _ in 0..5 {
            tracker
                .submit(&student, submit_command(&fx.assignment.id))
                .await
                .unwrap();
        }
        tracker
            .submit(&other, submit_command(&fx.assignment.id))
            .await
            .unwrap();

        let history = tracker
            .attempt_history("u1", &fx.assignment.id)
            .await
            .unwrap();
        let numbers: Vec<i32> = history.iter().map(|s| s.attempt_number).collect();
        assert_eq!(numbers, vec![5, 4, 3, 2, 1]);

        let latest = tracker
            .latest_attempt("u2", &fx.assignment.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.attempt_number, 1);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_get_distinct_attempts() {
        let fx = fixture().await;
        let tracker = Arc::new(tracker(&fx));
        let student = AuthContext::new("u1", UserRole::Student);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                let student = student.clone();
                let command = submit_command(&fx.assignment.id);
                tokio::spawn(async move { tracker.submit(&student, command).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            if let Ok(submission) = handle.await.unwrap() {
                numbers.push(submission.attempt_number);
            }
        }
        numbers.sort_unstable();
        let expected: Vec<i32> = (1..=numbers.len() as i32).collect();
        assert_eq!(numbers, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_on_connection_pool() {
        let db = TempDatabase::new();
        let fx = file_fixture(&db, 8).await;
        let tracker = Arc::new(tracker(&fx));
        let student = AuthContext::new("u1", UserRole::Student);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                let student = student.clone();
                let command = submit_command(&fx.assignment.id);
                tokio::spawn(async move { tracker.submit(&student, command).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(submission) => numbers.push(submission.attempt_number),
                // 锁竞争只能表现为冲突，不能是数据库错误
                Err(err) => assert_eq!(err.code(), "E008", "unexpected error: {err}"),
            }
        }
        assert!(!numbers.is_empty());
        numbers.sort_unstable();
        let expected: Vec<i32> = (1..=numbers.len() as i32).collect();
        assert_eq!(numbers, expected);

        let history = tracker
            .attempt_history("u1", &fx.assignment.id)
            .await
            .unwrap();
        assert_eq!(history.len(), numbers.len());
    }

    #[tokio::test]
    async fn test_grade_missing_row_returns_none() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);

        let submission = tracker
            .submit(&student, submit_command(&fx.assignment.id))
            .await
            .unwrap();
        tracker.delete(&student, &submission.id).await.unwrap();

        // 直接走存储层：查到之后、写入之前被撤回的情形
        let graded = fx
            .storage
            .grade_submission(
                &submission.id,
                GradeUpdate {
                    score: 70.0,
                    is_passed: true,
                    instructor_feedback: None,
                    rubric_scores: None,
                    graded_by: "i1".to_string(),
                    graded_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert!(graded.is_none());
    }

    #[tokio::test]
    async fn test_grade_unknown_and_out_of_range() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);
        let instructor = AuthContext::new("i1", UserRole::Instructor);

        assert!(
            tracker
                .grade("missing", grade_command(50.0), &instructor)
                .await
                .unwrap()
                .is_none()
        );

        let submission = tracker
            .submit(&student, submit_command(&fx.assignment.id))
            .await
            .unwrap();
        let err = tracker
            .grade(&submission.id, grade_command(101.0), &instructor)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E006");

        let failing = tracker
            .grade(&submission.id, grade_command(30.0), &instructor)
            .await
            .unwrap()
            .unwrap();
        assert!(!failing.is_passed);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let owner = AuthContext::new("u1", UserRole::Student);
        let stranger = AuthContext::new("u2", UserRole::Admin);
        let instructor = AuthContext::new("i1", UserRole::Instructor);

        let submission = tracker
            .submit(&owner, submit_command(&fx.assignment.id))
            .await
            .unwrap();

        let err = tracker.delete(&stranger, &submission.id).await.unwrap_err();
        assert_eq!(err.code(), "E011");
        assert!(tracker.get(&submission.id).await.unwrap().is_some());

        assert_eq!(
            tracker.delete(&owner, "missing").await.unwrap_err().code(),
            "E007"
        );

        tracker.delete(&owner, &submission.id).await.unwrap();
        assert!(tracker.get(&submission.id).await.unwrap().is_none());

        let graded = tracker
            .submit(&owner, submit_command(&fx.assignment.id))
            .await
            .unwrap();
        tracker
            .grade(&graded.id, grade_command(90.0), &instructor)
            .await
            .unwrap();
        assert_eq!(
            tracker.delete(&owner, &graded.id).await.unwrap_err().code(),
            "E008"
        );
        // 条件删除按状态过滤，已评分的行不受影响
        assert!(
            !fx.storage
                .delete_ungraded_submission(&graded.id)
                .await
                .unwrap()
        );
        assert!(tracker.get(&graded.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_statistics_empty_and_cached_invalidation() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);
        let instructor = AuthContext::new("i1", UserRole::Instructor);

        let empty = tracker.statistics(&fx.assignment.id).await.unwrap();
        assert_eq!(empty.total_submissions, 0);
        assert_eq!(empty.average_score, 0.0);
        assert_eq!(empty.pass_rate, 0.0);

        let submission = tracker
            .submit(&student, submit_command(&fx.assignment.id))
            .await
            .unwrap();
        tracker
            .grade(&submission.id, grade_command(80.0), &instructor)
            .await
            .unwrap();

        let stats = tracker.statistics(&fx.assignment.id).await.unwrap();
        assert_eq!(stats.total_submissions, 1);
        assert_eq!(stats.graded_submissions, 1);
        assert_eq!(stats.average_score, 80.0);
        assert_eq!(stats.pass_rate, 1.0);

        assert_eq!(
            tracker.statistics("missing").await.unwrap_err().code(),
            "E007"
        );
    }

    #[tokio::test]
    async fn test_late_submission_rules() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);
        let instructor = AuthContext::new("i1", UserRole::Instructor);

        let late = fx
            .create_assignment(|a| {
                a.due_date = Some(Utc::now() - chrono::Duration::hours(2));
                a.late_penalty_percent = 10.0;
            })
            .await;
        let submission = tracker
            .submit(&student, submit_command(&late.id))
            .await
            .unwrap();
        assert!(submission.is_late);
        assert_eq!(submission.late_penalty_applied, Some(10.0));

        // 60 分扣 10% 后为 54，低于及格线
        let graded = tracker
            .grade(&submission.id, grade_command(60.0), &instructor)
            .await
            .unwrap()
            .unwrap();
        assert!(!graded.is_passed);

        let closed = fx
            .create_assignment(|a| {
                a.due_date = Some(Utc::now() - chrono::Duration::hours(2));
                a.allow_late_submission = false;
            })
            .await;
        let err = tracker
            .submit(&student, submit_command(&closed.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E006");
    }

    #[tokio::test]
    async fn test_max_attempts_enforced() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);

        let limited = fx.create_assignment(|a| a.max_attempts = Some(2)).await;
        for expected in 1..=2 {
            let s = tracker
                .submit(&student, submit_command(&limited.id))
                .await
                .unwrap();
            assert_eq!(s.attempt_number, expected);
        }
        let err = tracker
            .submit(&student, submit_command(&limited.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
        assert!(tracker.attempts_exhausted("u1", &limited.id).await.unwrap());
        assert!(!tracker.attempts_exhausted("u2", &limited.id).await.unwrap());
        assert!(!tracker.attempts_exhausted("u1", &fx.assignment.id).await.unwrap());
        assert!(!tracker.attempts_exhausted("u1", "missing").await.unwrap());
        assert_eq!(
            tracker
                .attempt_history("u1", &limited.id)
                .await
                .unwrap()
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_submit_unknown_assignment_and_course_mismatch() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let student = AuthContext::new("u1", UserRole::Student);

        let err = tracker
            .submit(&student, submit_command("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let mut command = submit_command(&fx.assignment.id);
        command.course_id = Some("other".to_string());
        let err = tracker.submit(&student, command).await.unwrap_err();
        assert_eq!(err.code(), "E006");
    }

    #[tokio::test]
    async fn test_list_filters_and_pending() {
        let fx = fixture().await;
        let tracker = tracker(&fx);
        let instructor = AuthContext::new("i1", UserRole::Instructor);

        let a = tracker
            .submit(&AuthContext::new("u1", UserRole::Student), submit_command(&fx.assignment.id))
            .await
            .unwrap();
        tracker
            .submit(&AuthContext::new("u2", UserRole::Student), submit_command(&fx.assignment.id))
            .await
            .unwrap();
        tracker
            .grade(&a.id, grade_command(70.0), &instructor)
            .await
            .unwrap();

        let all = tracker
            .list(SubmissionListQuery {
                course_id: Some(fx.course.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let by_grader = tracker
            .list(SubmissionListQuery {
                graded_by: Some("i1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_grader.items.len(), 1);
        assert_eq!(by_grader.items[0].id, a.id);

        let pending = tracker.pending(SubmissionListQuery::default()).await.unwrap();
        assert_eq!(pending.items.len(), 1);
        assert_eq!(pending.items[0].user_id, "u2");
    }
}
