/// Persisted representation of a game.
pub mod models;
/// Snapshot store keyed by monotonic save ids.
pub mod save_store;
/// Storage error types shared by backends.
pub mod storage;
