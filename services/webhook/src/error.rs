use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use storybot_common::error::StorybotError;

pub struct ApiError(pub StorybotError);

impl From<StorybotError> for ApiError {
    fn from(err: StorybotError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StorybotError::Decode(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
