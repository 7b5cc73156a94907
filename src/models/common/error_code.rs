use serde::Serialize;
use ts_rs::TS;

/// 业务错误码（随响应体返回，与 HTTP 状态码互补）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    Conflict = 1005,
    InternalServerError = 1006,

    // 作业提交
    SubmissionNotFound = 2001,
    AssignmentNotFound = 2002,
    SubmissionAlreadyGraded = 2003,
    AttemptLimitReached = 2004,
    // 并发提交撞车，可重试
    SubmissionConflict = 2005,

    // 学习进度
    ProgressNotFound = 3001,
    EnrollmentNotFound = 3002,
    AlreadyEnrolled = 3003,

    // 课程
    CourseNotFound = 4001,
}
