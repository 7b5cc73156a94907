//! 预导入模块，方便使用

pub use super::assignment_submissions::{
    ActiveModel as SubmissionActiveModel, Entity as AssignmentSubmissions,
    Model as SubmissionModel,
};
pub use super::assignments::{
    ActiveModel as AssignmentActiveModel, Entity as Assignments, Model as AssignmentModel,
};
pub use super::course_progress::{
    ActiveModel as ProgressActiveModel, Entity as CourseProgress, Model as ProgressModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::enrollments::{
    ActiveModel as EnrollmentActiveModel, Entity as Enrollments, Model as EnrollmentModel,
};
