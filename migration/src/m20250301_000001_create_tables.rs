use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建课程表
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::Description).text().null())
                    .col(ColumnDef::new(Courses::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Courses::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建选课表
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollments::UserId).string().not_null())
                    .col(
                        ColumnDef::new(Enrollments::CourseId)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::Status).string().not_null())
                    .col(
                        ColumnDef::new(Enrollments::ProgressPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Enrollments::EnrolledAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::CompletedAt).big_integer().null())
                    .col(
                        ColumnDef::new(Enrollments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作业定义表
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignments::Id)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Assignments::CourseId)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignments::ModuleId).string().null())
                    .col(ColumnDef::new(Assignments::LessonId).string().null())
                    .col(ColumnDef::new(Assignments::Title).string().not_null())
                    .col(ColumnDef::new(Assignments::Description).text().null())
                    .col(ColumnDef::new(Assignments::MaxScore).double().not_null())
                    .col(ColumnDef::new(Assignments::PassingScore).double().not_null())
                    .col(ColumnDef::new(Assignments::DueDate).big_integer().null())
                    .col(
                        ColumnDef::new(Assignments::AllowLateSubmission)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Assignments::LatePenaltyPercent)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Assignments::MaxAttempts).integer().null())
                    .col(ColumnDef::new(Assignments::CreatedBy).string().not_null())
                    .col(
                        ColumnDef::new(Assignments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assignments::Table, Assignments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作业提交表
        manager
            .create_table(
                Table::create()
                    .table(AssignmentSubmissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssignmentSubmissions::Id)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::UserId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::AssignmentId)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::CourseId)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentSubmissions::ModuleId).string().null())
                    .col(ColumnDef::new(AssignmentSubmissions::LessonId).string().null())
                    .col(
                        ColumnDef::new(AssignmentSubmissions::SubmissionText)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::FileUrls)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AssignmentSubmissions::Score).double().null())
                    .col(
                        ColumnDef::new(AssignmentSubmissions::MaxScore)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::AttemptNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::IsPassed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::IsLate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::LatePenaltyApplied)
                            .double()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::SubmittedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::GradedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(AssignmentSubmissions::GradedBy).string().null())
                    .col(
                        ColumnDef::new(AssignmentSubmissions::Status)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::InstructorFeedback)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::RubricScores)
                            .text()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentSubmissions::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                AssignmentSubmissions::Table,
                                AssignmentSubmissions::AssignmentId,
                            )
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AssignmentSubmissions::Table, AssignmentSubmissions::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建学习进度表
        manager
            .create_table(
                Table::create()
                    .table(CourseProgress::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CourseProgress::Id)
                            .string_len(20)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CourseProgress::ProgressKey).string().not_null())
                    .col(
                        ColumnDef::new(CourseProgress::EnrollmentId)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::CourseId)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CourseProgress::UserId).string().not_null())
                    .col(ColumnDef::new(CourseProgress::ModuleId).string().null())
                    .col(ColumnDef::new(CourseProgress::LessonId).string().null())
                    .col(ColumnDef::new(CourseProgress::QuizId).string().null())
                    .col(
                        ColumnDef::new(CourseProgress::AssignmentId)
                            .string_len(20)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::ProgressType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CourseProgress::Status).string().not_null())
                    .col(
                        ColumnDef::new(CourseProgress::CompletionPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::TimeSpentMinutes)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CourseProgress::StartedAt).big_integer().null())
                    .col(
                        ColumnDef::new(CourseProgress::CompletedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::LastAccessedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CourseProgress::Score).double().null())
                    .col(ColumnDef::new(CourseProgress::MaxScore).double().null())
                    .col(
                        ColumnDef::new(CourseProgress::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CourseProgress::MaxAttempts).integer().null())
                    .col(
                        ColumnDef::new(CourseProgress::IsMandatory)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::Weight)
                            .double()
                            .not_null()
                            .default(1.0),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::CurrentPosition)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CourseProgress::Bookmarks).text().null())
                    .col(ColumnDef::new(CourseProgress::Notes).text().null())
                    .col(
                        ColumnDef::new(CourseProgress::DifficultyRating)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(CourseProgress::Feedback).text().null())
                    .col(
                        ColumnDef::new(CourseProgress::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CourseProgress::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CourseProgress::Table, CourseProgress::EnrollmentId)
                            .to(Enrollments::Table, Enrollments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CourseProgress::Table, CourseProgress::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(CourseProgress::Table, CourseProgress::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 选课唯一约束：同一用户同一课程只能选一次
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_enrollments_user_course")
                    .table(Enrollments::Table)
                    .col(Enrollments::UserId)
                    .col(Enrollments::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_course_id")
                    .table(Assignments::Table)
                    .col(Assignments::CourseId)
                    .to_owned(),
            )
            .await?;

        // 提交序号唯一约束，防止并发重复提交产生相同的 attempt_number
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_submissions_user_assignment_attempt")
                    .table(AssignmentSubmissions::Table)
                    .col(AssignmentSubmissions::UserId)
                    .col(AssignmentSubmissions::AssignmentId)
                    .col(AssignmentSubmissions::AttemptNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_course_id")
                    .table(AssignmentSubmissions::Table)
                    .col(AssignmentSubmissions::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_submissions_status")
                    .table(AssignmentSubmissions::Table)
                    .col(AssignmentSubmissions::Status)
                    .to_owned(),
            )
            .await?;

        // 进度自然键唯一约束
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_course_progress_key")
                    .table(CourseProgress::Table)
                    .col(CourseProgress::ProgressKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_course_progress_enrollment_id")
                    .table(CourseProgress::Table)
                    .col(CourseProgress::EnrollmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_course_progress_user_id")
                    .table(CourseProgress::Table)
                    .col(CourseProgress::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(CourseProgress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentSubmissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    Id,
    Title,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    #[sea_orm(iden = "enrollments")]
    Table,
    Id,
    UserId,
    CourseId,
    Status,
    ProgressPercentage,
    EnrolledAt,
    CompletedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    #[sea_orm(iden = "assignments")]
    Table,
    Id,
    CourseId,
    ModuleId,
    LessonId,
    Title,
    Description,
    MaxScore,
    PassingScore,
    DueDate,
    AllowLateSubmission,
    LatePenaltyPercent,
    MaxAttempts,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentSubmissions {
    #[sea_orm(iden = "assignment_submissions")]
    Table,
    Id,
    UserId,
    AssignmentId,
    CourseId,
    ModuleId,
    LessonId,
    SubmissionText,
    FileUrls,
    Score,
    MaxScore,
    AttemptNumber,
    IsPassed,
    IsLate,
    LatePenaltyApplied,
    SubmittedAt,
    GradedAt,
    GradedBy,
    Status,
    InstructorFeedback,
    RubricScores,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CourseProgress {
    #[sea_orm(iden = "course_progress")]
    Table,
    Id,
    ProgressKey,
    EnrollmentId,
    CourseId,
    UserId,
    ModuleId,
    LessonId,
    QuizId,
    AssignmentId,
    ProgressType,
    Status,
    CompletionPercentage,
    TimeSpentMinutes,
    StartedAt,
    CompletedAt,
    LastAccessedAt,
    Score,
    MaxScore,
    Attempts,
    MaxAttempts,
    IsMandatory,
    Weight,
    CurrentPosition,
    Bookmarks,
    Notes,
    DifficultyRating,
    Feedback,
    CreatedAt,
    UpdatedAt,
}
