use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    error::AppError, models::ValidationRequest, server::AppState,
    services::artifact::PayloadArtifact,
};

/// Validate a payload and answer with the validator's full console output.
///
/// The run is tied to this request: if the client goes away, the handler
/// future is dropped and the validator is killed. The output is passed on as
/// the validator wrote it, minus color codes, even when it is not valid UTF-8.
pub async fn validate(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let request = ValidationRequest::from_body(&body)?;
    let artifact = PayloadArtifact::create(&state.config.work_dir, request.payload())?;

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    match state
        .validator
        .run_buffered(artifact, request.args(), cancel)
        .await
    {
        Ok(output) => {
            info!("Validation completed, returning {} bytes of output", output.len());
            Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], output).into_response())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e)
        }
    }
}
