//! Read-only projections of the current game for the displays.

use crate::{
    dto::game::{CategoriesResponse, GameSnapshot, QuestionSummary, TeamSummary},
    error::ServiceError,
    state::SharedState,
};

/// Full snapshot of the game.
pub async fn get_state(state: &SharedState) -> GameSnapshot {
    state.snapshot().await
}

/// Regular questions grouped by category, in board order.
pub async fn get_questions(state: &SharedState) -> CategoriesResponse {
    state
        .read_engine(|engine| CategoriesResponse::from_questions(engine.questions().regular()))
        .await
}

/// One board question.
pub async fn get_question(state: &SharedState, id: usize) -> Result<QuestionSummary, ServiceError> {
    state
        .read_engine(|engine| engine.questions().get(id).map(QuestionSummary::from))
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("question `{id}` not found")))
}

/// Teams in controller order.
pub async fn get_teams(state: &SharedState) -> Vec<TeamSummary> {
    state
        .read_engine(|engine| engine.teams().teams().iter().map(TeamSummary::from).collect())
        .await
}

/// Teams ordered by balance, best first. Ties keep controller order.
pub async fn get_winners(state: &SharedState) -> Vec<TeamSummary> {
    let mut teams = get_teams(state).await;
    teams.sort_by(|a, b| b.balance.cmp(&a.balance));
    teams
}
