//! Maps [`flow_core::errors::EngineError`] onto the `{success, error}`
//! response envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flow_core::errors::EngineError;
use serde::Serialize;

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    error: ErrorEnvelope<'a>,
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    code: &'a str,
    message: String,
}

/// Newtype so we can impl `IntoResponse` for an `EngineError` returned from a
/// handler without `flow-core` depending on axum.
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Envelope { success: false, error: ErrorEnvelope { code: self.0.code(), message: self.0.to_string() } };
        (status, Json(body)).into_response()
    }
}
