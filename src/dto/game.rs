use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::phase::VisibleGamePhase,
    state::{
        actions::ActionSignals,
        engine::GameEngine,
        questions::Question,
        state_machine::GamePhase,
        teams::Team,
    },
};

/// Team as shown on the scoreboard.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct TeamSummary {
    pub id: usize,
    pub names: Vec<String>,
    pub balance: i32,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            names: team.names.clone(),
            balance: team.balance,
        }
    }
}

/// Question as shown on the board.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
pub struct QuestionSummary {
    pub id: usize,
    pub statement: String,
    pub answer: String,
    pub image: Option<String>,
    pub value: i32,
    pub category: String,
    pub answered: bool,
    /// Length of the buzz window in milliseconds.
    pub time_to_answer_ms: u64,
}

impl From<&Question> for QuestionSummary {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            statement: question.statement.clone(),
            answer: question.answer.clone(),
            image: question.image.clone(),
            value: question.value,
            category: question.category.clone(),
            answered: question.answered,
            time_to_answer_ms: question.time_to_answer.as_millis() as u64,
        }
    }
}

/// Presentation cues raised by the last change.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq)]
pub struct ActionsSnapshot {
    pub play_correct_sound: bool,
    pub play_wrong_sound: bool,
    pub play_start_accepting: bool,
    pub play_buzzer_sound: bool,
    pub play_end_sound: bool,
    pub stop_timer: bool,
    pub show_split_or_steal: bool,
}

impl From<&ActionSignals> for ActionsSnapshot {
    fn from(actions: &ActionSignals) -> Self {
        Self {
            play_correct_sound: actions.play_correct_sound,
            play_wrong_sound: actions.play_wrong_sound,
            play_start_accepting: actions.play_start_accepting,
            play_buzzer_sound: actions.play_buzzer_sound,
            play_end_sound: actions.play_end_sound,
            stop_timer: actions.stop_timer,
            show_split_or_steal: actions.show_split_or_steal,
        }
    }
}

/// Full game state pushed to displays after every change.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GameSnapshot {
    pub teams: Vec<TeamSummary>,
    pub questions: Vec<QuestionSummary>,
    pub state: VisibleGamePhase,
    /// Increments on every phase transition.
    pub version: usize,
    pub current_question: QuestionSummary,
    pub current_team: Option<usize>,
    pub selecting_team: Option<usize>,
    /// Controllers that already buzzed on the current question.
    pub already_answered: Vec<usize>,
    /// One entry per playing controller: `true` steal, `false` split, `null` not voted.
    /// Empty outside of split-or-steal and the final scoreboard.
    pub split_or_steal_votes: Vec<Option<bool>>,
    pub actions: ActionsSnapshot,
}

impl From<&GameEngine> for GameSnapshot {
    fn from(engine: &GameEngine) -> Self {
        let teams = engine.teams();
        let split_or_steal_votes = match engine.phase() {
            GamePhase::SplitOrSteal | GamePhase::Over => teams
                .playing()
                .iter()
                .map(|c| engine.votes().get(c).copied())
                .collect(),
            _ => Vec::new(),
        };

        Self {
            teams: teams.teams().iter().map(TeamSummary::from).collect(),
            questions: engine
                .questions()
                .regular()
                .iter()
                .map(QuestionSummary::from)
                .collect(),
            state: engine.phase().into(),
            version: engine.version(),
            current_question: engine.current_question().into(),
            current_team: teams.current().map(|t| t.id),
            selecting_team: teams.selecting().map(|t| t.id),
            already_answered: engine.used().iter().copied().collect(),
            split_or_steal_votes,
            actions: engine.actions().into(),
        }
    }
}

/// Board questions grouped by category, in board order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoriesResponse {
    #[schema(value_type = Object)]
    pub categories: IndexMap<String, Vec<QuestionSummary>>,
}

impl CategoriesResponse {
    pub fn from_questions<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Self {
        let mut categories: IndexMap<String, Vec<QuestionSummary>> = IndexMap::new();
        for question in questions {
            categories
                .entry(question.category.clone())
                .or_default()
                .push(question.into());
        }
        Self { categories }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::{
        arbiter::Button,
        clock::ManualClock,
        engine::tests::{engine_with, settings},
        questions::tests::{answer_time, regular, sample_bank, tiebreak},
        questions::QuestionBank,
    };

    #[test]
    fn snapshot_reflects_the_engine() {
        let clock = ManualClock::new();
        let mut engine = engine_with(sample_bank(), &clock);
        engine
            .set_teams(vec![vec!["ann".into()], vec!["bob".into()]])
            .unwrap();
        engine.select_question(1).unwrap();
        engine.begin_answering().unwrap();
        engine.buzz(1, Button::Red).unwrap();

        let snapshot = GameSnapshot::from(&engine);
        assert_eq!(snapshot.state, VisibleGamePhase::TeamSelected);
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.questions.len(), 4);
        assert_eq!(snapshot.current_question.id, 1);
        assert_eq!(snapshot.current_team, Some(1));
        assert_eq!(snapshot.already_answered, vec![1]);
        assert!(snapshot.split_or_steal_votes.is_empty());
        assert!(snapshot.actions.play_buzzer_sound);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "team_selected");
        assert_eq!(json["current_question"]["time_to_answer_ms"], 20_000);
    }

    #[test]
    fn votes_are_listed_per_playing_controller() {
        let clock = ManualClock::new();
        let bank =
            QuestionBank::new(vec![regular("Music", 300)], vec![tiebreak("t")], answer_time())
                .unwrap();
        let mut engine = crate::state::engine::GameEngine::new(
            bank,
            settings(),
            Arc::new(clock.clone()),
        );
        engine
            .set_teams(vec![vec!["a".into(), "b".into()], vec!["c".into()]])
            .unwrap();
        engine.select_question(0).unwrap();
        engine.begin_answering().unwrap();
        engine.buzz(0, Button::Red).unwrap();
        engine.answer_question(true).unwrap();
        engine.begin_answering().unwrap();
        engine.buzz(1, Button::Orange).unwrap();

        let snapshot = GameSnapshot::from(&engine);
        assert_eq!(snapshot.state, VisibleGamePhase::SplitOrSteal);
        assert_eq!(snapshot.split_or_steal_votes, vec![None, Some(true)]);
    }

    #[test]
    fn categories_keep_board_order() {
        let bank = sample_bank();
        let response = CategoriesResponse::from_questions(bank.regular());
        let keys: Vec<_> = response.categories.keys().cloned().collect();
        assert_eq!(keys, vec!["Music", "Cinema"]);
        assert_eq!(response.categories["Cinema"].len(), 2);
    }
}
