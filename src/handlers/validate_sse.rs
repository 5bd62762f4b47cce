use std::borrow::Cow;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use crate::{
    error::AppError,
    models::{ValidationRequest, ValidatorEvent},
    server::AppState,
    services::artifact::PayloadArtifact,
};

pub const CONSOLE_OUT_EVENT: &str = "console_out";
pub const SERVER_ERROR_EVENT: &str = "server_error";

/// Validate a payload and stream the validator's console output as SSE.
///
/// Each output line becomes a `console_out` event. SSE data cannot carry a
/// bare `\r`, so one inside a line is sent as the two characters `\r`. A failed run ends with a
/// single `server_error` event. The stream closes when the run is over.
pub async fn validate_sse(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, AppError> {
    let request = ValidationRequest::from_body(&body)?;
    let artifact = PayloadArtifact::create(&state.config.work_dir, request.payload())?;

    let cancel = CancellationToken::new();
    let events = state
        .validator
        .spawn_streaming(artifact, request.args(), cancel.clone())?;

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::TRANSFER_ENCODING, "chunked"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Sse::new(ValidatorEventStream::new(events, cancel)),
    )
        .into_response())
}

/// Body of an SSE validation response.
///
/// The response body is dropped when the client disconnects; the drop guard
/// then cancels the run so the validator does not outlive the request.
pub struct ValidatorEventStream {
    events: ReceiverStream<ValidatorEvent>,
    finished: bool,
    _cancel_on_drop: DropGuard,
}

impl ValidatorEventStream {
    pub fn new(events: mpsc::Receiver<ValidatorEvent>, cancel: CancellationToken) -> Self {
        Self {
            events: ReceiverStream::new(events),
            finished: false,
            _cancel_on_drop: cancel.drop_guard(),
        }
    }
}

impl Stream for ValidatorEventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.events).poll_next(cx) {
            Poll::Ready(Some(event)) => Poll::Ready(Some(Ok(to_sse_event(event)))),
            Poll::Ready(None) => {
                if !self.finished {
                    self.finished = true;
                    debug!("SSE stream finished");
                }
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for ValidatorEventStream {
    fn drop(&mut self) {
        if !self.finished {
            info!("Client disconnected, cancelling validator");
        }
    }
}

fn to_sse_event(event: ValidatorEvent) -> Event {
    match event {
        ValidatorEvent::Line(line) => Event::default()
            .event(CONSOLE_OUT_EVENT)
            .data(escape_carriage_returns(&line.text)),
        ValidatorEvent::Failed(err) => Event::default()
            .event(SERVER_ERROR_EVENT)
            .data(err.to_string()),
    }
}

/// Carriage returns left inside a line are written as a literal `\r`.
fn escape_carriage_returns(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace('\r', "\\r"))
    } else {
        Cow::Borrowed(text)
    }
}
