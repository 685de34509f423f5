//! Request and response payloads for the moderator command surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::save_store::SaveMeta,
    dto::{format_system_time, phase::VisibleGamePhase, validation::validate_rosters},
    state::arbiter::Button,
};

/// Team rosters, one list of member names per team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetTeamsRequest {
    #[validate(custom(function = "validate_rosters"))]
    pub teams: Vec<Vec<String>>,
}

/// Board question to play.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectQuestionRequest {
    pub id: i64,
}

/// Moderator verdict on the answer being given.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    pub correct: bool,
}

/// Whether the host should move on from the question.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// False only when the question goes back to reading for the remaining teams.
    pub skip: bool,
}

/// Button name on the wire.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ButtonName {
    Red,
    Yellow,
    Green,
    Orange,
    Blue,
}

impl From<ButtonName> for Button {
    fn from(value: ButtonName) -> Self {
        match value {
            ButtonName::Red => Button::Red,
            ButtonName::Yellow => Button::Yellow,
            ButtonName::Green => Button::Green,
            ButtonName::Orange => Button::Orange,
            ButtonName::Blue => Button::Blue,
        }
    }
}

fn default_button() -> ButtonName {
    ButtonName::Red
}

/// Simulated button press.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BuzzRequest {
    #[validate(range(max = 3))]
    pub controller: usize,
    #[serde(default = "default_button")]
    pub button: ButtonName,
}

/// Outcome of a simulated button press.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuzzResponse {
    NoChange,
    Penalized { controllers: Vec<usize> },
    Admitted { controller: usize },
    Voted { controllers: Vec<usize> },
}

/// Manual score correction.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustPointsRequest {
    pub team: usize,
    pub points: i32,
}

/// Forced phase change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ForceStateRequest {
    pub state: VisibleGamePhase,
}

/// Manual hand-over of the board.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SetSelectingRequest {
    #[validate(range(max = 3))]
    pub team: usize,
}

/// Saved game listed for the moderator.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaveListItem {
    pub id: u64,
    /// Command that produced the save.
    pub action: String,
    /// RFC 3339 timestamp.
    pub saved_at: String,
}

impl From<SaveMeta> for SaveListItem {
    fn from(meta: SaveMeta) -> Self {
        Self {
            id: meta.id,
            action: meta.action,
            saved_at: format_system_time(meta.saved_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buzz_request_defaults_to_red() {
        let request: BuzzRequest = serde_json::from_str(r#"{"controller": 2}"#).unwrap();
        assert_eq!(request.button, ButtonName::Red);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn out_of_range_controller_fails_validation() {
        let request: BuzzRequest =
            serde_json::from_str(r#"{"controller": 4, "button": "green"}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn save_timestamps_are_rfc3339() {
        let item = SaveListItem::from(SaveMeta {
            id: 3,
            action: "buzz".into(),
            saved_at: std::time::SystemTime::UNIX_EPOCH,
        });
        assert_eq!(item.saved_at, "1970-01-01T00:00:00Z");
    }

    #[test]
    fn buzz_response_is_tagged() {
        let json = serde_json::to_value(BuzzResponse::Admitted { controller: 1 }).unwrap();
        assert_eq!(json["outcome"], "admitted");
        assert_eq!(json["controller"], 1);
    }
}
