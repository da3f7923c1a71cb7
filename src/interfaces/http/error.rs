use crate::error::OrderError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// Error type returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    Order(OrderError),
    BadRequest(String),
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        ApiError::Order(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Order(e) => match e {
                OrderError::ValidationError(_) | OrderError::UnknownPlan(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                OrderError::NotFound(_) => StatusCode::NOT_FOUND,
                OrderError::InvalidSignature => StatusCode::UNAUTHORIZED,
                OrderError::MalformedEvent(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Order(e) if status.is_server_error() => {
                error!(error = %e, "request failed");
                "internal error".to_string()
            }
            ApiError::Order(e) => e.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
