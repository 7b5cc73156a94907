pub mod assignments;
pub mod courses;
pub mod enrollments;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::auth::entities::AuthContext;
use crate::models::courses::requests::{
    CreateAssignmentRequest, CreateCourseRequest, EnrollmentListQuery,
};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        req: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        courses::create_course(self, request, auth, req).await
    }

    pub async fn get_course(
        &self,
        request: &HttpRequest,
        course_id: String,
    ) -> ActixResult<HttpResponse> {
        courses::get_course(self, request, course_id).await
    }

    pub async fn create_assignment(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        course_id: String,
        req: CreateAssignmentRequest,
    ) -> ActixResult<HttpResponse> {
        assignments::create_assignment(self, request, auth, course_id, req).await
    }

    pub async fn get_assignment(
        &self,
        request: &HttpRequest,
        assignment_id: String,
    ) -> ActixResult<HttpResponse> {
        assignments::get_assignment(self, request, assignment_id).await
    }

    pub async fn list_assignments(
        &self,
        request: &HttpRequest,
        course_id: String,
    ) -> ActixResult<HttpResponse> {
        assignments::list_assignments(self, request, course_id).await
    }

    /// 选修课程
    pub async fn enroll(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        course_id: String,
    ) -> ActixResult<HttpResponse> {
        enrollments::enroll(self, request, auth, course_id).await
    }

    pub async fn get_enrollment(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        enrollment_id: String,
    ) -> ActixResult<HttpResponse> {
        enrollments::get_enrollment(self, request, auth, enrollment_id).await
    }

    pub async fn list_enrollments(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        query: EnrollmentListQuery,
    ) -> ActixResult<HttpResponse> {
        enrollments::list_enrollments(self, request, auth, query).await
    }
}
