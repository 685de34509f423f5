use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::admin::ButtonName;

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
/// Messages accepted from virtual controller WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadInboundMessage {
    /// Momentary press of one button.
    Press {
        controller: usize,
        button: ButtonName,
    },
    #[serde(other)]
    Unknown,
}

impl PadInboundMessage {
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
/// Messages pushed to virtual controllers.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PadOutboundMessage {
    /// Turn the lights of `controllers` on or off.
    Lights { controllers: Vec<usize>, on: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_message_parses() {
        let msg =
            PadInboundMessage::from_json_str(r#"{"type":"press","controller":2,"button":"orange"}"#)
                .unwrap();
        assert_eq!(
            msg,
            PadInboundMessage::Press {
                controller: 2,
                button: ButtonName::Orange
            }
        );
        assert_eq!(
            PadInboundMessage::from_json_str(r#"{"type":"hello"}"#).unwrap(),
            PadInboundMessage::Unknown
        );
    }

    #[test]
    fn lights_message_serializes_with_tag() {
        let json = serde_json::to_string(&PadOutboundMessage::Lights {
            controllers: vec![0, 3],
            on: true,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"lights","controllers":[0,3],"on":true}"#);
    }
}
