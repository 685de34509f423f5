use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::{
    dto::sse::ServerEvent,
    services::sse_events::EVENT_STATE,
    state::SharedState,
};

/// Open the public stream: the current snapshot first, then every later update.
pub async fn public_stream(
    state: SharedState,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // subscribe before reading so no update falls between the two
    let receiver = state.public_sse().subscribe();
    let snapshot = state.snapshot().await;
    let initial = match ServerEvent::json(Some(EVENT_STATE.to_string()), &snapshot) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize initial snapshot");
            None
        }
    };
    to_sse_stream(receiver, initial)
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Option<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(initial) = initial {
            if tx.send(Ok(to_event(initial))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // the next state event supersedes whatever was missed
                            tracing::debug!(skipped, "public SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        tracing::info!("Public SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
