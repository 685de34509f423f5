use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod game;
pub mod health;
pub mod public;
pub mod sse;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(sse::router())
        .merge(websocket::router())
        .merge(game::router())
        .merge(admin::router())
        .merge(public::router())
        .merge(docs::router())
        .with_state(state)
}
