use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use blog_server_service::Error;
use serde_json::json;
use thiserror::Error;

const INTERNAL_SERVER_ERROR: &str = "internal server error";

/// Failure of a handler, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Service(#[from] Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(err) if err.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Service(err) if err.is_already_existed() => StatusCode::BAD_REQUEST,
            ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(message) => {
                tracing::debug!(%message, "bad request");
                message.clone()
            }
            ApiError::Service(err) if status.is_client_error() => {
                tracing::debug!(error = %err, "request rejected");
                err.root().to_string()
            }
            ApiError::Service(err) => {
                tracing::error!(error = %err, "request failed");
                INTERNAL_SERVER_ERROR.to_owned()
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
