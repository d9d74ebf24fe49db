use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::WikiError;
use crate::model::Pagination;

pub type AppState<S> = Arc<S>;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            error: message.to_string(),
        }
    }
}

/// Map a domain error to its HTTP status and JSON body
pub fn api_error(err: WikiError) -> ApiError {
    let status = match &err {
        WikiError::NotFound(_) => StatusCode::NOT_FOUND,
        WikiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        WikiError::Locked(_) => StatusCode::LOCKED,
        WikiError::NotAllowed(_) => StatusCode::FORBIDDEN,
        WikiError::ConcurrentModification { .. } => StatusCode::CONFLICT,
        WikiError::Internal(e) => {
            log::error!("internal error: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse::new(err.code(), &err.to_string())))
}

/// `?limit=&offset=` of the history endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Result<Pagination, ApiError> {
        Pagination::new(self.limit, self.offset).map_err(api_error)
    }
}
