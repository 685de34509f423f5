/// Controller input sources.
pub mod input;
/// Light actuators.
pub mod lights;
/// Fixed-interval loop feeding controller frames to the engine.
pub mod poller;
