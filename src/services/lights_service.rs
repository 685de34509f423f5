use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    hardware::lights::LightActuator,
    services::{sse_events::broadcast_system_status, websocket_service::broadcast_lights},
    state::{SharedState, engine::LightCommand},
};

/// Execute light changes in the order the engine produced them.
///
/// Actuator failures are logged and put the service in degraded mode until
/// the next successful call.
pub async fn run(
    state: SharedState,
    actuator: Arc<dyn LightActuator>,
    mut commands: mpsc::UnboundedReceiver<LightCommand>,
) {
    while let Some(LightCommand { controllers, on }) = commands.recv().await {
        if controllers.is_empty() {
            continue;
        }
        broadcast_lights(&state, &controllers, on);

        let degraded = match actuator.set_lights(controllers.clone(), on).await {
            Ok(()) => {
                debug!(?controllers, on, "lights updated");
                false
            }
            Err(err) => {
                warn!(?controllers, on, error = %err, "failed to drive lights");
                true
            }
        };

        if state.set_degraded(degraded) {
            if degraded {
                warn!("light actuator failing; entering degraded mode");
            } else {
                info!("light actuator healthy again; leaving degraded mode");
            }
            broadcast_system_status(state.public_sse(), degraded);
        }
    }
    debug!("lights worker stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        hardware::lights::ActuatorError,
        state::{
            AppState,
            clock::ManualClock,
            engine::tests::engine_with,
            questions::tests::sample_bank,
        },
    };

    #[derive(Default)]
    struct FlakyLights {
        failing: AtomicBool,
        calls: Mutex<Vec<(Vec<usize>, bool)>>,
    }

    impl LightActuator for FlakyLights {
        fn set_lights(
            &self,
            controllers: Vec<usize>,
            on: bool,
        ) -> BoxFuture<'static, Result<(), ActuatorError>> {
            self.calls.lock().unwrap().push((controllers, on));
            let result = if self.failing.load(Ordering::SeqCst) {
                Err(ActuatorError::Unavailable("unplugged".into()))
            } else {
                Ok(())
            };
            Box::pin(async move { result })
        }
    }

    #[tokio::test]
    async fn failures_toggle_degraded_mode_and_notify_displays() {
        let clock = ManualClock::new();
        let (state, _workers) =
            AppState::new(engine_with(sample_bank(), &clock), Arc::new(clock), None);
        let mut events = state.public_sse().subscribe();
        let lights = Arc::new(FlakyLights::default());
        lights.failing.store(true, Ordering::SeqCst);

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(LightCommand {
            controllers: vec![0, 1],
            on: true,
        })
        .unwrap();
        tx.send(LightCommand {
            controllers: vec![],
            on: false,
        })
        .unwrap();
        drop(tx);
        run(state.clone(), lights.clone(), rx).await;

        assert!(state.is_degraded());
        assert_eq!(events.recv().await.unwrap().data, r#"{"degraded":true}"#);
        assert_eq!(*lights.calls.lock().unwrap(), vec![(vec![0, 1], true)]);

        lights.failing.store(false, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(LightCommand {
            controllers: vec![2],
            on: false,
        })
        .unwrap();
        drop(tx);
        run(state.clone(), lights, rx).await;

        assert!(!state.is_degraded());
        assert_eq!(events.recv().await.unwrap().data, r#"{"degraded":false}"#);
    }
}
