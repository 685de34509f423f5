use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Game phase as exposed to clients (REST/SSE) and accepted by the override endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for the teams.
    Starting,
    /// The selecting team picks a question.
    SelectingQuestion,
    /// The host reads the question.
    ReadingQuestion,
    /// Buzzers are open.
    AnsweringQuestion,
    /// A team buzzed in.
    TeamSelected,
    /// Winning team members vote.
    SplitOrSteal,
    /// Final scores.
    Over,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Starting => VisibleGamePhase::Starting,
            GamePhase::SelectingQuestion => VisibleGamePhase::SelectingQuestion,
            GamePhase::ReadingQuestion => VisibleGamePhase::ReadingQuestion,
            GamePhase::AnsweringQuestion => VisibleGamePhase::AnsweringQuestion,
            GamePhase::TeamSelected => VisibleGamePhase::TeamSelected,
            GamePhase::SplitOrSteal => VisibleGamePhase::SplitOrSteal,
            GamePhase::Over => VisibleGamePhase::Over,
        }
    }
}

impl From<VisibleGamePhase> for GamePhase {
    fn from(value: VisibleGamePhase) -> Self {
        match value {
            VisibleGamePhase::Starting => GamePhase::Starting,
            VisibleGamePhase::SelectingQuestion => GamePhase::SelectingQuestion,
            VisibleGamePhase::ReadingQuestion => GamePhase::ReadingQuestion,
            VisibleGamePhase::AnsweringQuestion => GamePhase::AnsweringQuestion,
            VisibleGamePhase::TeamSelected => GamePhase::TeamSelected,
            VisibleGamePhase::SplitOrSteal => GamePhase::SplitOrSteal,
            VisibleGamePhase::Over => GamePhase::Over,
        }
    }
}
