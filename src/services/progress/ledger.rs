//! 学习进度台账
//!
//! 按自然键新增或合并进度行，并把必修单元按权重汇总为选课完成度。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::rules;
use crate::errors::{LmsError, Result};
use crate::models::auth::entities::AuthContext;
use crate::models::courses::entities::Enrollment;
use crate::models::progress::{
    entities::{CourseProgress, ProgressStatus},
    requests::{ProgressListQuery, RecordProgressCommand},
    responses::{CourseCompletionResponse, ProgressListResponse},
};
use crate::storage::{ProgressMerge, ProgressPatch, Storage};
use crate::utils::random_code::generate_id;

pub struct ProgressLedger {
    storage: Arc<dyn Storage>,
}

impl ProgressLedger {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    async fn load_enrollment(&self, enrollment_id: &str) -> Result<Enrollment> {
        self.storage
            .get_enrollment_by_id(enrollment_id)
            .await?
            .ok_or_else(|| LmsError::not_found(format!("选课记录不存在: {enrollment_id}")))
    }

    /// 记录进度，返回 (进度行, 是否新建)
    pub async fn record(
        &self,
        auth: &AuthContext,
        command: RecordProgressCommand,
    ) -> Result<(CourseProgress, bool)> {
        let enrollment = self.load_enrollment(&command.enrollment_id).await?;
        if enrollment.user_id != auth.user_id {
            return Err(LmsError::authorization("只能记录自己的学习进度"));
        }
        if enrollment.course_id != command.key.course_id {
            return Err(LmsError::validation("course_id 与选课记录不一致"));
        }
        if let Some(assignment_id) = &command.key.assignment_id {
            match self.storage.get_assignment_by_id(assignment_id).await? {
                Some(a) if a.course_id == enrollment.course_id => {}
                Some(_) => return Err(LmsError::validation("作业不属于该课程")),
                None => return Err(LmsError::not_found(format!("作业不存在: {assignment_id}"))),
            }
        }

        let now = Utc::now();
        let key = command.key.clone();
        let enrollment_id = command.enrollment_id.clone();
        let changes = command.changes;
        let merge: ProgressMerge = Box::new(move |existing| {
            let mut row = existing
                .unwrap_or_else(|| rules::new_progress(generate_id(), &enrollment_id, &key, now));
            rules::apply_changes(&mut row, changes, now);
            row
        });

        let (row, created) = self.storage.upsert_progress(&command.key, merge).await?;
        debug!(
            "Progress {} for {} {} ({})",
            if created { "created" } else { "merged" },
            row.progress_type,
            row.id,
            row.status
        );

        self.refresh_enrollment(&row.enrollment_id).await?;
        Ok((row, created))
    }

    /// 进度行存在时检查归属，返回 None 表示不存在
    async fn owned_row(&self, auth: &AuthContext, progress_id: &str) -> Result<Option<CourseProgress>> {
        let Some(row) = self.storage.get_progress_by_id(progress_id).await? else {
            return Ok(None);
        };
        if row.user_id != auth.user_id {
            return Err(LmsError::authorization("只能修改自己的学习进度"));
        }
        Ok(Some(row))
    }

    async fn mutate(
        &self,
        auth: &AuthContext,
        progress_id: &str,
        patch: ProgressPatch,
    ) -> Result<Option<CourseProgress>> {
        if self.owned_row(auth, progress_id).await?.is_none() {
            return Ok(None);
        }
        let updated = self.storage.update_progress_by_id(progress_id, patch).await?;
        if let Some(row) = &updated {
            self.refresh_enrollment(&row.enrollment_id).await?;
        }
        Ok(updated)
    }

    /// 只更新完成百分比
    pub async fn update_progress(
        &self,
        auth: &AuthContext,
        progress_id: &str,
        percentage: f64,
    ) -> Result<Option<CourseProgress>> {
        let now = Utc::now();
        let patch: ProgressPatch = Box::new(move |mut row| {
            rules::set_percentage(&mut row, percentage, now);
            rules::touch(&mut row, now);
            row
        });
        self.mutate(auth, progress_id, patch).await
    }

    /// 只更新状态
    pub async fn update_status(
        &self,
        auth: &AuthContext,
        progress_id: &str,
        status: ProgressStatus,
    ) -> Result<Option<CourseProgress>> {
        let now = Utc::now();
        let patch: ProgressPatch = Box::new(move |mut row| {
            rules::set_status(&mut row, status, now);
            if status == ProgressStatus::Completed {
                row.completion_percentage = 100.0;
            }
            rules::touch(&mut row, now);
            row
        });
        self.mutate(auth, progress_id, patch).await
    }

    pub async fn get(&self, progress_id: &str) -> Result<Option<CourseProgress>> {
        self.storage.get_progress_by_id(progress_id).await
    }

    pub async fn list(&self, query: ProgressListQuery) -> Result<ProgressListResponse> {
        self.storage.list_progress_with_pagination(query).await
    }

    /// 选课完成度（本人或讲师/管理员），同时回写到选课记录
    pub async fn course_completion(
        &self,
        auth: &AuthContext,
        enrollment_id: &str,
    ) -> Result<CourseCompletionResponse> {
        let enrollment = self.load_enrollment(enrollment_id).await?;
        if !auth.can_access_user(&enrollment.user_id) {
            return Err(LmsError::authorization("没有查看该选课进度的权限"));
        }

        let rows = self.storage.list_enrollment_progress(enrollment_id).await?;
        let rollup = rules::weighted_completion(&rows);
        let enrollment = self.store_rollup(enrollment, rollup.completion_percentage).await?;

        Ok(CourseCompletionResponse {
            enrollment_id: enrollment.id.clone(),
            completion_percentage: rollup.completion_percentage,
            mandatory_units: rollup.mandatory_units,
            completed_units: rollup.completed_units,
            enrollment,
        })
    }

    /// 重新汇总并写入选课完成度
    pub async fn refresh_enrollment(&self, enrollment_id: &str) -> Result<Enrollment> {
        let enrollment = self.load_enrollment(enrollment_id).await?;
        let rows = self.storage.list_enrollment_progress(enrollment_id).await?;
        let rollup = rules::weighted_completion(&rows);
        self.store_rollup(enrollment, rollup.completion_percentage).await
    }

    async fn store_rollup(&self, enrollment: Enrollment, percentage: f64) -> Result<Enrollment> {
        let (status, completed_at) = rules::enrollment_state(&enrollment, percentage, Utc::now());
        let previous = enrollment.status;

        let updated = self
            .storage
            .update_enrollment_progress(&enrollment.id, percentage, status, completed_at)
            .await?
            .ok_or_else(|| LmsError::not_found(format!("选课记录不存在: {}", enrollment.id)))?;

        if previous != status {
            info!(
                "Enrollment {} of user {}: {} -> {} ({}%)",
                updated.id, updated.user_id, previous, status, percentage
            );
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::entities::UserRole;
    use crate::models::courses::entities::EnrollmentStatus;
    use crate::models::progress::{
        entities::{ProgressKey, ProgressType},
        requests::ProgressChanges,
    };
    use crate::services::test_support::{Fixture, fixture};

    fn lesson_command(fx: &Fixture, lesson_id: &str, changes: ProgressChanges) -> RecordProgressCommand {
        RecordProgressCommand {
            enrollment_id: fx.enrollment.id.clone(),
            key: ProgressKey {
                user_id: "u1".into(),
                course_id: fx.course.id.clone(),
                progress_type: ProgressType::Lesson,
                module_id: None,
                lesson_id: Some(lesson_id.into()),
                quiz_id: None,
                assignment_id: None,
            },
            changes,
        }
    }

    fn student() -> AuthContext {
        AuthContext::new("u1", UserRole::Student)
    }

    async fn record_lesson(ledger: &ProgressLedger, fx: &Fixture, lesson: &str, pct: f64) {
        let changes = ProgressChanges {
            completion_percentage: Some(pct),
            ..Default::default()
        };
        ledger
            .record(&student(), lesson_command(fx, lesson, changes))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_record_twice_merges_into_one_row() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());

        let (first, created) = ledger
            .record(
                &student(),
                lesson_command(
                    &fx,
                    "l1",
                    ProgressChanges {
                        status: Some(ProgressStatus::InProgress),
                        completion_percentage: Some(40.0),
                        notes: Some("intro".into()),
                        time_spent_minutes: Some(12),
                        ..Default::default()
                    },
                ),
            )
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.status, ProgressStatus::InProgress);
        assert!(first.started_at.is_some());

        let (second, created) = ledger
            .record(
                &student(),
                lesson_command(
                    &fx,
                    "l1",
                    ProgressChanges {
                        status: Some(ProgressStatus::Completed),
                        completion_percentage: Some(100.0),
                        time_spent_minutes: Some(8),
                        ..Default::default()
                    },
                ),
            )
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);
        assert_eq!(second.completion_percentage, 100.0);
        assert_eq!(second.status, ProgressStatus::Completed);
        assert!(second.completed_at.is_some());
        assert_eq!(second.notes.as_deref(), Some("intro"));
        assert_eq!(second.time_spent_minutes, 20);

        let rows = ledger
            .list(ProgressListQuery {
                enrollment_id: Some(fx.enrollment.id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rows.pagination.total, 1);
    }

    #[tokio::test]
    async fn test_percentage_is_clamped() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());

        let (row, _) = ledger
            .record(
                &student(),
                lesson_command(
                    &fx,
                    "l1",
                    ProgressChanges {
                        completion_percentage: Some(140.0),
                        ..Default::default()
                    },
                ),
            )
            .await
            .unwrap();
        assert_eq!(row.completion_percentage, 100.0);

        let updated = ledger
            .update_progress(&student(), &row.id, -20.0)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.completion_percentage, 0.0);
        // 已完成的行不会因百分比下降而回退状态
        assert_eq!(updated.status, ProgressStatus::Completed);
    }

    #[tokio::test]
    async fn test_narrow_mutators() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());

        assert!(
            ledger
                .update_status(&student(), "missing", ProgressStatus::Completed)
                .await
                .unwrap()
                .is_none()
        );

        let (row, _) = ledger
            .record(&student(), lesson_command(&fx, "l1", ProgressChanges::default()))
            .await
            .unwrap();
        assert_eq!(row.status, ProgressStatus::NotStarted);

        let other = AuthContext::new("u2", UserRole::Student);
        let err = ledger
            .update_progress(&other, &row.id, 50.0)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E011");

        let updated = ledger
            .update_status(&student(), &row.id, ProgressStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, ProgressStatus::Completed);
        assert_eq!(updated.completion_percentage, 100.0);
        assert!(updated.started_at.is_some());
        assert!(updated.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_record_checks_enrollment() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());

        let mut command = lesson_command(&fx, "l1", ProgressChanges::default());
        command.enrollment_id = "missing".into();
        assert_eq!(
            ledger.record(&student(), command).await.unwrap_err().code(),
            "E007"
        );

        let mut command = lesson_command(&fx, "l1", ProgressChanges::default());
        command.key.user_id = "u2".into();
        let other = AuthContext::new("u2", UserRole::Student);
        assert_eq!(
            ledger.record(&other, command).await.unwrap_err().code(),
            "E011"
        );
    }

    #[tokio::test]
    async fn test_course_completion_rollup() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());

        let empty = ledger
            .course_completion(&student(), &fx.enrollment.id)
            .await
            .unwrap();
        assert_eq!(empty.completion_percentage, 0.0);
        assert_eq!(empty.mandatory_units, 0);

        for (lesson, pct, mandatory) in [("l1", 100.0, true), ("l2", 50.0, true), ("l3", 0.0, false)] {
            ledger
                .record(
                    &student(),
                    lesson_command(
                        &fx,
                        lesson,
                        ProgressChanges {
                            completion_percentage: Some(pct),
                            is_mandatory: Some(mandatory),
                            ..Default::default()
                        },
                    ),
                )
                .await
                .unwrap();
        }

        let completion = ledger
            .course_completion(&student(), &fx.enrollment.id)
            .await
            .unwrap();
        assert_eq!(completion.completion_percentage, 75.0);
        assert_eq!(completion.mandatory_units, 2);
        assert_eq!(completion.completed_units, 1);
        assert_eq!(completion.enrollment.progress_percentage, 75.0);
        assert_eq!(completion.enrollment.status, EnrollmentStatus::Active);

        let stranger = AuthContext::new("u2", UserRole::Student);
        assert_eq!(
            ledger
                .course_completion(&stranger, &fx.enrollment.id)
                .await
                .unwrap_err()
                .code(),
            "E011"
        );

        ledger
            .record(
                &student(),
                lesson_command(
                    &fx,
                    "l2",
                    ProgressChanges {
                        completion_percentage: Some(100.0),
                        ..Default::default()
                    },
                ),
            )
            .await
            .unwrap();
        let enrollment = ledger.refresh_enrollment(&fx.enrollment.id).await.unwrap();
        assert_eq!(enrollment.progress_percentage, 100.0);
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert!(enrollment.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_enrollment_completion_tracks_new_units() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());
        record_lesson(&ledger, &fx, "l1", 100.0).await;
        let enrollment = fx.storage.get_enrollment_by_id(&fx.enrollment.id).await.unwrap().unwrap();
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert!(enrollment.completed_at.is_some());

        // 第二个必修单元出现后不再是 100%
        record_lesson(&ledger, &fx, "l2", 0.0).await;
        let enrollment = fx.storage.get_enrollment_by_id(&fx.enrollment.id).await.unwrap().unwrap();
        assert_eq!(enrollment.progress_percentage, 50.0);
        assert_eq!(enrollment.status, EnrollmentStatus::Active);
        assert!(enrollment.completed_at.is_none());

        record_lesson(&ledger, &fx, "l2", 100.0).await;
        let enrollment = fx.storage.get_enrollment_by_id(&fx.enrollment.id).await.unwrap().unwrap();
        assert_eq!(enrollment.progress_percentage, 100.0);
        assert_eq!(enrollment.status, EnrollmentStatus::Completed);
        assert!(enrollment.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_assignment_progress_requires_known_assignment() {
        let fx = fixture().await;
        let ledger = ProgressLedger::new(fx.storage.clone());

        let mut command = lesson_command(&fx, "l1", ProgressChanges::default());
        command.key.progress_type = ProgressType::Assignment;
        command.key.lesson_id = None;
        command.key.assignment_id = Some("missing".into());
        assert_eq!(
            ledger.record(&student(), command.clone()).await.unwrap_err().code(),
            "E007"
        );

        command.key.assignment_id = Some(fx.assignment.id.clone());
        let (row, created) = ledger.record(&student(), command).await.unwrap();
        assert!(created);
        assert_eq!(row.assignment_id.as_deref(), Some(fx.assignment.id.as_str()));
    }
}
