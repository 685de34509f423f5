//! Moderator commands driving the game. Each command runs under the engine
//! lock, which also covers queueing the resulting snapshot, lights and save.

use crate::{
    dto::{
        admin::{AnswerResponse, BuzzResponse, ButtonName},
        game::GameSnapshot,
    },
    error::{GameError, ServiceError},
    state::{
        SharedState,
        engine::{BuzzOutcome, GameEngine},
        state_machine::GamePhase,
    },
};

/// Run `work` and return the snapshot it left behind.
async fn command(
    state: &SharedState,
    action: &'static str,
    work: impl FnOnce(&mut GameEngine) -> Result<(), GameError>,
) -> Result<GameSnapshot, ServiceError> {
    state
        .run_command(action, |engine| {
            work(engine)?;
            Ok(GameSnapshot::from(&*engine))
        })
        .await
}

/// Register the teams and open the board.
pub async fn set_teams(
    state: &SharedState,
    teams: Vec<Vec<String>>,
) -> Result<GameSnapshot, ServiceError> {
    command(state, "set_teams", |engine| engine.set_teams(teams)).await
}

/// Put a board question in play.
pub async fn select_question(state: &SharedState, id: i64) -> Result<GameSnapshot, ServiceError> {
    command(state, "select_question", |engine| engine.select_question(id)).await
}

/// Open the buzz window (or the split-or-steal vote).
pub async fn begin_answering(state: &SharedState) -> Result<GameSnapshot, ServiceError> {
    command(state, "buzz_start", |engine| engine.begin_answering()).await
}

/// Judge the answer given by the admitted team.
pub async fn answer(state: &SharedState, correct: bool) -> Result<AnswerResponse, ServiceError> {
    let phase = state
        .run_command("answer", |engine| {
            engine.answer_question(correct)?;
            Ok(engine.phase())
        })
        .await?;
    Ok(AnswerResponse {
        skip: phase != GamePhase::ReadingQuestion,
    })
}

/// Close the current question without awarding it.
pub async fn skip(state: &SharedState) -> Result<GameSnapshot, ServiceError> {
    command(state, "skip", |engine| engine.skip_question()).await
}

/// Ask the displays to stop their countdown.
pub async fn stop_timer(state: &SharedState) -> Result<GameSnapshot, ServiceError> {
    command(state, "stop_timer", |engine| engine.stop_timer()).await
}

/// Settle the split-or-steal votes and end the game.
pub async fn reveal_split_or_steal(state: &SharedState) -> Result<GameSnapshot, ServiceError> {
    command(state, "split_or_steal", |engine| engine.reveal_split_or_steal()).await
}

/// Simulate one press of a controller button.
pub async fn buzz(
    state: &SharedState,
    controller: usize,
    button: ButtonName,
) -> Result<BuzzResponse, ServiceError> {
    let outcome = state.simulate_press(controller, button.into()).await?;
    Ok(outcome.into())
}

impl From<BuzzOutcome> for BuzzResponse {
    fn from(value: BuzzOutcome) -> Self {
        match value {
            BuzzOutcome::NoChange => BuzzResponse::NoChange,
            BuzzOutcome::Penalized(controllers) => BuzzResponse::Penalized { controllers },
            BuzzOutcome::Admitted(controller) => BuzzResponse::Admitted { controller },
            BuzzOutcome::Voted(votes) => BuzzResponse::Voted {
                controllers: votes.into_iter().map(|(controller, _)| controller).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::state::{
        AppState, clock::ManualClock, engine::tests::engine_with, questions::tests::sample_bank,
    };

    #[tokio::test]
    async fn set_teams_returns_the_opened_board() {
        let clock = ManualClock::new();
        let (state, _workers) =
            AppState::new(engine_with(sample_bank(), &clock), Arc::new(clock), None);

        let snapshot = set_teams(&state, vec![vec!["ann".into()], vec!["bob".into()]])
            .await
            .unwrap();
        assert_eq!(snapshot.teams.len(), 2);
        assert_eq!(snapshot.selecting_team, Some(0));
        assert!(matches!(
            set_teams(&state, vec![vec!["cy".into()]]).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
