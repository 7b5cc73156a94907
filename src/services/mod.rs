pub mod courses;
pub mod progress;
pub mod submissions;

#[cfg(test)]
pub(crate) mod test_support;

pub use courses::CourseService;
pub use progress::{ProgressLedger, ProgressService};
pub use submissions::{SubmissionService, SubmissionTracker};
