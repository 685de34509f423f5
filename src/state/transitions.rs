use tracing::debug;

use crate::{
    dao::models::SavedGameEntity,
    dto::game::GameSnapshot,
    error::{GameError, ServiceError},
    services::{save_service::SaveRequest, sse_events::broadcast_state},
    state::{
        AppState, CONTROLLER_COUNT,
        arbiter::{Button, ButtonFrame},
        engine::{BuzzOutcome, GameEngine, GameProgress, LightCommand},
    },
};

/// Side effects of one engine step.
struct Effects {
    snapshot: GameSnapshot,
    save: Option<SaveRequest>,
    lights: Vec<LightCommand>,
}

impl AppState {
    /// Run a moderator command against the engine and publish its effects.
    ///
    /// The snapshot, save and light changes are only published on success.
    /// Effects are queued before the lock is released, so saves and light
    /// changes keep version order.
    pub async fn run_command<T>(
        &self,
        action: &'static str,
        work: impl FnOnce(&mut GameEngine) -> Result<T, GameError>,
    ) -> Result<T, ServiceError> {
        let mut engine = self.engine.lock().await;
        let result = work(&mut engine);
        match &result {
            Ok(_) => {
                let effects = self.capture(&mut engine, action);
                self.publish(effects);
            }
            Err(_) => {
                engine.take_light_commands();
            }
        }
        result.map_err(Into::into)
    }

    /// Feed one controller frame to the engine.
    pub async fn feed_frame(&self, frame: ButtonFrame) -> BuzzOutcome {
        let mut engine = self.engine.lock().await;
        let outcome = engine.handle_frame(frame);
        self.publish_input(&mut engine, &outcome);
        outcome
    }

    /// Simulate a button press; published like a frame from the hardware.
    pub async fn simulate_press(
        &self,
        controller: usize,
        button: Button,
    ) -> Result<BuzzOutcome, ServiceError> {
        let mut engine = self.engine.lock().await;
        let outcome = engine.buzz(controller, button)?;
        self.publish_input(&mut engine, &outcome);
        Ok(outcome)
    }

    /// Swap the live engine for one rebuilt from a save.
    pub async fn replace_engine(&self, progress: GameProgress) -> GameSnapshot {
        let mut engine = self.engine.lock().await;
        *engine = GameEngine::restore(progress, self.settings, self.clock.clone());
        let snapshot = GameSnapshot::from(&*engine);

        self.send_lights(vec![LightCommand {
            controllers: (0..CONTROLLER_COUNT).collect(),
            on: false,
        }]);
        broadcast_state(self.public_sse(), &snapshot);
        snapshot
    }

    /// Current snapshot without mutating anything.
    pub async fn snapshot(&self) -> GameSnapshot {
        let engine = self.engine.lock().await;
        GameSnapshot::from(&*engine)
    }

    /// Read the engine under the lock.
    pub async fn read_engine<T>(&self, read: impl FnOnce(&GameEngine) -> T) -> T {
        let engine = self.engine.lock().await;
        read(&engine)
    }

    fn publish_input(&self, engine: &mut GameEngine, outcome: &BuzzOutcome) {
        let action = match outcome {
            BuzzOutcome::Admitted(_) => "buzz",
            BuzzOutcome::Voted(_) => "vote",
            BuzzOutcome::NoChange | BuzzOutcome::Penalized(_) => {
                let lights = engine.take_light_commands();
                self.send_lights(lights);
                return;
            }
        };
        let effects = self.capture(engine, action);
        self.publish(effects);
    }

    fn capture(&self, engine: &mut GameEngine, action: &'static str) -> Effects {
        let save = self.save_store.as_ref().map(|_| SaveRequest {
            action,
            game: SavedGameEntity::from(&engine.progress()),
        });
        Effects {
            snapshot: GameSnapshot::from(&*engine),
            save,
            lights: engine.take_light_commands(),
        }
    }

    fn publish(&self, effects: Effects) {
        let Effects {
            snapshot,
            save,
            lights,
        } = effects;
        self.send_lights(lights);
        broadcast_state(self.public_sse(), &snapshot);
        if let Some(request) = save {
            debug!(action = request.action, "queueing save");
            if self.saves.send(request).is_err() {
                debug!("save worker stopped, dropping save");
            }
        }
    }

    fn send_lights(&self, commands: Vec<LightCommand>) {
        for command in commands {
            if self.lights.send(command).is_err() {
                debug!("lights worker stopped, dropping light command");
                break;
            }
        }
    }
}
