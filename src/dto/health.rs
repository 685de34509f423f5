use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while the light actuator is failing.
    pub status: String,
    /// Number of virtual controllers connected.
    pub virtual_pads: usize,
}

impl HealthResponse {
    pub fn new(degraded: bool, virtual_pads: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            virtual_pads,
        }
    }
}
