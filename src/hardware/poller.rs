use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::{
    hardware::input::ControllerInput,
    state::{SharedState, engine::BuzzOutcome},
};

/// Poll `input` every `interval` and feed each pending frame to the engine.
///
/// Returns once the input reports that it is closed.
pub async fn run(state: SharedState, mut input: impl ControllerInput, interval: Duration) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(interval_ms = interval.as_millis() as u64, "controller polling started");

    loop {
        ticker.tick().await;
        while let Some(frame) = input.poll() {
            match state.feed_frame(frame).await {
                BuzzOutcome::NoChange => {}
                outcome => debug!(?outcome, "controller frame handled"),
            }
        }
        if input.is_closed() {
            break;
        }
    }
    info!("controller polling stopped");
}
