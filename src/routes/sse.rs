use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse",
    responses((status = 200, description = "Public SSE stream: a `state` event on connect and after every change", content_type = "text/event-stream", body = String))
)]
/// Stream game snapshots to connected displays.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    info!("New public SSE connection");
    sse_service::public_stream(state).await
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(public_stream))
}
