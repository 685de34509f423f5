use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameSnapshot,
        sse::{ServerEvent, SystemStatus},
    },
    state::SseHub,
};

pub(crate) const EVENT_STATE: &str = "state";
const EVENT_SYSTEM: &str = "system";

/// Broadcast a fresh game snapshot to public subscribers.
pub fn broadcast_state(hub: &SseHub, snapshot: &GameSnapshot) {
    send_public_event(hub, EVENT_STATE, snapshot);
}

/// Broadcast whether the light actuator is currently failing.
pub fn broadcast_system_status(hub: &SseHub, degraded: bool) {
    send_public_event(hub, EVENT_SYSTEM, &SystemStatus { degraded });
}

fn send_public_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
