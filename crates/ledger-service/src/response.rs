//! Success envelope shared by every handler.

use axum::Json;
use serde::Serialize;

/// `{ "success": true, "message": …, "data": … }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always `true`; failures go through [`ApiError`](crate::ApiError).
    pub success: bool,
    /// Short human-readable summary.
    pub message: String,
    /// Payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` in a success envelope.
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}
