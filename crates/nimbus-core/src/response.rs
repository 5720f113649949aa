//! JSON response envelope.
//!
//! Every success body is `{"data": ...}`; every failure body is
//! `{"error": {"code", "message", "details"?}}`. Service error enums
//! build their `IntoResponse` impls on top of [`error_body`].

use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Success envelope: serializes as `{"data": <inner>}`.
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

/// Wrap a payload in the success envelope.
pub fn data<T: Serialize>(value: T) -> Json<Data<T>> {
    Json(Data { data: value })
}

/// Build the failure envelope body.
///
/// `details` is omitted from the JSON when `None`; most errors carry
/// only a code and a human-readable message.
pub fn error_body(
    code: &str,
    message: &str,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message,
    });
    if let Some(details) = details {
        error["details"] = details;
    }
    json!({ "error": error })
}
