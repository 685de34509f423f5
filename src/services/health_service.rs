use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report degraded mode and the number of connected virtual controllers.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let degraded = state.is_degraded();
    if degraded {
        debug!("light actuator failing (degraded mode)");
    }
    HealthResponse::new(degraded, state.pads().len())
}
