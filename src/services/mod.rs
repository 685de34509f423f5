/// Manual corrections applied by the moderator.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Moderator commands driving the game.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Light actuator worker.
pub mod lights_service;
/// Read-only projections for the displays.
pub mod public_service;
/// Save worker and save management.
pub mod save_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming.
pub mod sse_service;
/// Virtual controller WebSocket handling.
pub mod websocket_service;
