use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{PadInboundMessage, PadOutboundMessage},
    state::{
        CONTROLLER_COUNT, PadConnection, SharedState,
        arbiter::{Button, ButtonFrame, single_press},
    },
};

/// Handle the full lifecycle of a virtual controller WebSocket connection.
///
/// A virtual controller may press buttons on any of the physical controllers;
/// each press is fed to the polling loop as a press frame followed by a
/// release frame.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps light updates flowing while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let pad_id = Uuid::new_v4();
    state.pads().insert(
        pad_id,
        PadConnection {
            id: pad_id,
            tx: outbound_tx.clone(),
        },
    );
    info!(id = %pad_id, "virtual controller connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match PadInboundMessage::from_json_str(&text) {
                Ok(PadInboundMessage::Press { controller, button }) => {
                    if !press(&state, controller, button.into()) {
                        warn!(id = %pad_id, "controller input closed, dropping press");
                    }
                }
                Ok(PadInboundMessage::Unknown) => {
                    debug!(id = %pad_id, payload = %text, "ignoring unknown pad message");
                }
                Err(err) => {
                    warn!(id = %pad_id, error = %err, "failed to parse pad message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(id = %pad_id, "virtual controller closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(id = %pad_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.pads().remove(&pad_id);
    info!(id = %pad_id, "virtual controller disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Queue a press and release of `button` on `controller`.
fn press(state: &SharedState, controller: usize, button: Button) -> bool {
    if controller >= CONTROLLER_COUNT {
        warn!(controller, "ignoring press on unknown controller");
        return true;
    }
    state.push_frame(single_press(controller, button))
        && state.push_frame(ButtonFrame::default())
}

/// Mirror a light change on every connected virtual controller.
pub fn broadcast_lights(state: &SharedState, controllers: &[usize], on: bool) {
    let message = PadOutboundMessage::Lights {
        controllers: controllers.to_vec(),
        on,
    };
    let mut closed = Vec::new();
    for pad in state.pads().iter() {
        if send_message_to_websocket(&pad.tx, &message).is_err() {
            closed.push(pad.id);
        }
    }
    // removal must wait until the iteration guard is released
    for id in closed {
        debug!(id = %id, "writer closed, removing virtual controller");
        state.pads().remove(&id);
    }
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are logged and swallowed; `Err` means the writer is gone.
fn send_message_to_websocket<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> Result<(), ()>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };
    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
