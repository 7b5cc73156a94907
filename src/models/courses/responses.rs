use crate::models::PaginatedResponse;
use crate::models::courses::entities::{Assignment, Enrollment};

pub type EnrollmentListResponse = PaginatedResponse<Enrollment>;

pub type AssignmentListResponse = Vec<Assignment>;
