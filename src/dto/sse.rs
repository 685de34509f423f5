use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the light actuator starts or stops failing.
pub struct SystemStatus {
    pub degraded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_event_carries_name_and_payload() {
        let event = ServerEvent::json(Some("system".to_string()), &SystemStatus { degraded: true })
            .unwrap();
        assert_eq!(event.event.as_deref(), Some("system"));
        assert_eq!(event.data, r#"{"degraded":true}"#);
    }
}
