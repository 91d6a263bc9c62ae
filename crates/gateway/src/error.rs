//! Maps orchestrator errors onto HTTP responses.

use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    vetrina_integrations::IntegrationError,
};

/// Response-side wrapper so handlers can return orchestrator errors with
/// `?`. The body is always `{ "error": <message>, "code": <stable code> }`;
/// clients key off `code`, not the message text.
pub struct ApiError(IntegrationError);

impl From<IntegrationError> for ApiError {
    fn from(e: IntegrationError) -> Self {
        Self(e)
    }
}

/// HTTP status for each stable error code.
#[must_use]
pub fn status_for(code: &str) -> StatusCode {
    match code {
        "invalid_state" => StatusCode::BAD_REQUEST,
        "decryption" => StatusCode::UNAUTHORIZED,
        "not_found" => StatusCode::NOT_FOUND,
        "conflict" => StatusCode::CONFLICT,
        "precondition" => StatusCode::UNPROCESSABLE_ENTITY,
        "oauth_exchange" | "publish" | "publish_unretryable" => StatusCode::BAD_GATEWAY,
        // configuration, partial_publish, storage, and anything unknown
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.error_code();
        let status = status_for(code);
        if status.is_server_error() {
            tracing::error!(code, error = %self.0, "request failed");
        } else {
            tracing::debug!(code, error = %self.0, "request rejected");
        }
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "code": code,
        }));
        (status, body).into_response()
    }
}
