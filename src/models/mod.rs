pub mod auth;
pub mod common;
pub mod courses;
pub mod progress;
pub mod submissions;

pub use common::error_code::ErrorCode;
pub use common::pagination::{PaginatedResponse, PaginationInfo, PaginationQuery};
pub use common::response::ApiResponse;
pub use common::validation::{FieldError, FieldErrors};

