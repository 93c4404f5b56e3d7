use poem::{http::StatusCode, web::Json, IntoResponse, Response};
use serde_json::json;

/// Failures reported by a [`crate::store::Store`] backend.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("write rejected: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug)]
pub enum TriageError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Failed to store report: {0}")]
    ReportInsert(#[source] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl TriageError {
    pub fn status(&self) -> StatusCode {
        match self {
            TriageError::MissingFields(_)
            | TriageError::InvalidBody(_)
            | TriageError::ReportInsert(_) => StatusCode::BAD_REQUEST,
            TriageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TriageError {
    fn into_response(self) -> Response {
        let status = self.status();
        Json(json!({ "success": false, "error": self.to_string() }))
            .with_status(status)
            .into_response()
    }
}
