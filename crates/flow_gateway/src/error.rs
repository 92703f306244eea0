use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flow_core::FlowError;
use serde_json::json;

/// Handler error carrying the status it maps to.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// `Json` extractor whose rejections come back as `{error}` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            message: "planning timed out".to_string(),
        }
    }
}

fn status_for(err: &FlowError) -> StatusCode {
    match err {
        FlowError::Validation(_) | FlowError::Serialization(_) => StatusCode::BAD_REQUEST,
        FlowError::NotFound { .. } => StatusCode::NOT_FOUND,
        FlowError::Storage(_) | FlowError::Llm(_) | FlowError::Fatal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<FlowError>() {
            Some(flow) => Self {
                status: status_for(flow),
                message: flow.to_string(),
            },
            None => {
                tracing::error!("Request failed: {:#}", err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: format!("{err:#}"),
                }
            }
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        Self {
            status: status_for(&err),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let nf: ApiError = anyhow::Error::from(FlowError::not_found("task", "1")).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "task '1' not found");

        let bad: ApiError = FlowError::validation("nope").into();
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);

        let other: ApiError = anyhow::anyhow!("disk full").into();
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
