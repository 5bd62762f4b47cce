pub mod openapi;
pub mod validate;
pub mod validate_sse;

use axum::{response::IntoResponse, Json};

pub use openapi::openapi;
pub use validate::validate;
pub use validate_sse::validate_sse;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "fhir-validator-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
