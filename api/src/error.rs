use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shared::ServiceError;
use tracing::error;

/// Error envelope for API responses.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    Db(String),
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Service(e) => match e {
                ServiceError::UnsupportedTimeframe(_)
                | ServiceError::InvalidPeriod(_)
                | ServiceError::OutOfRange { .. } => StatusCode::BAD_REQUEST,
                ServiceError::Fetch(_) => StatusCode::BAD_GATEWAY,
                ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
                ServiceError::Persistence(_) | ServiceError::Misconfigured => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Service(e) => write!(f, "{}", e),
            ApiError::Db(msg) => write!(f, "storage error: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Db(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = json!({ "ok": false, "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
