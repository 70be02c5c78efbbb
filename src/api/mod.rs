use actix_web::HttpResponse;

use crate::domain::error::ApprovalError;

pub mod attendance;
pub mod duty;
pub mod employee;
pub mod request;
pub mod schedule;
pub mod site;
pub mod stats;

/// One JSON shape for every approval precondition failure, so clients can
/// branch on the code instead of parsing text.
pub(crate) fn approval_error_response(err: &ApprovalError) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.code(),
        "message": err.to_string(),
    });
    match err {
        ApprovalError::NotFound => HttpResponse::NotFound().json(body),
        ApprovalError::AlreadyDecided => HttpResponse::Conflict().json(body),
        ApprovalError::ReasonRequired => HttpResponse::BadRequest().json(body),
    }
}
