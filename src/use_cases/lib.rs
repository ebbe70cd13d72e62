use std::fmt::Debug;

pub mod constants;
pub mod pipelines;
pub mod signals;
pub mod users;

#[derive(Debug)]
pub enum UseCaseError {
    BadRequest(String),          // 400
    NotFound(String),            // 404
    Conflict(String),            // 409
    InternalServerError(String), // 500
}

pub(crate) fn error_500(e: impl Debug) -> UseCaseError {
    UseCaseError::InternalServerError(format!("{:?}", e))
}

impl From<pipelines::PipelineError> for UseCaseError {
    fn from(e: pipelines::PipelineError) -> Self {
        match e {
            pipelines::PipelineError::Validation(errors) => UseCaseError::BadRequest(
                serde_json::to_string(&errors).unwrap_or_else(|_| errors.to_string()),
            ),
            e => error_500(e),
        }
    }
}
