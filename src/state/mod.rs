pub mod actions;
pub mod arbiter;
pub mod clock;
pub mod engine;
pub mod questions;
mod sse;
pub mod state_machine;
pub mod teams;
pub mod transitions;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc, watch};
use uuid::Uuid;

use crate::{
    dao::save_store::SaveStore,
    hardware::input::ChannelInput,
    services::save_service::SaveRequest,
    state::{
        arbiter::ButtonFrame,
        clock::Clock,
        engine::{EngineSettings, GameEngine, LightCommand},
    },
};

pub use self::sse::SseHub;
pub use self::state_machine::{ApplyError, InvalidTransition};

/// Number of physical controllers (and therefore of teams).
pub const CONTROLLER_COUNT: usize = 4;

pub type SharedState = Arc<AppState>;

#[derive(Clone)]
/// Handle used to push messages to a connected virtual controller.
pub struct PadConnection {
    pub id: Uuid,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Receiving ends handed to the background workers at startup.
pub struct Workers {
    /// Frames coming from the virtual controllers.
    pub input: ChannelInput,
    /// Light changes to execute, in order.
    pub lights: mpsc::UnboundedReceiver<LightCommand>,
    /// Snapshots to persist, in order.
    pub saves: mpsc::UnboundedReceiver<SaveRequest>,
}

/// Central application state: the game engine and the channels around it.
///
/// The engine lock is never held across an `.await`.
pub struct AppState {
    engine: Mutex<GameEngine>,
    settings: EngineSettings,
    clock: Arc<dyn Clock>,
    sse: SseHub,
    pads: DashMap<Uuid, PadConnection>,
    frames: mpsc::UnboundedSender<ButtonFrame>,
    lights: mpsc::UnboundedSender<LightCommand>,
    saves: mpsc::UnboundedSender<SaveRequest>,
    save_store: Option<Arc<dyn SaveStore>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Saves are disabled when `save_store` is `None`.
    pub fn new(
        engine: GameEngine,
        clock: Arc<dyn Clock>,
        save_store: Option<Arc<dyn SaveStore>>,
    ) -> (SharedState, Workers) {
        let (frames, input) = ChannelInput::new();
        let (lights_tx, lights_rx) = mpsc::unbounded_channel();
        let (saves_tx, saves_rx) = mpsc::unbounded_channel();
        let (degraded, _rx) = watch::channel(false);
        let settings = *engine.settings();

        let state = Arc::new(Self {
            engine: Mutex::new(engine),
            settings,
            clock,
            sse: SseHub::new(64),
            pads: DashMap::new(),
            frames,
            lights: lights_tx,
            saves: saves_tx,
            save_store,
            degraded,
        });
        let workers = Workers {
            input,
            lights: lights_rx,
            saves: saves_rx,
        };
        (state, workers)
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Registry of connected virtual controllers.
    pub fn pads(&self) -> &DashMap<Uuid, PadConnection> {
        &self.pads
    }

    /// Queue a controller frame for the polling loop.
    pub fn push_frame(&self, frame: ButtonFrame) -> bool {
        self.frames.send(frame).is_ok()
    }

    /// Save store, when saves are enabled.
    pub fn save_store(&self) -> Option<Arc<dyn SaveStore>> {
        self.save_store.clone()
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, returning whether it changed.
    pub fn set_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }
}
