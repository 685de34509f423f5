//! Manual corrections applied by the moderator outside the normal flow.

use tracing::info;

use crate::{
    dto::{game::GameSnapshot, phase::VisibleGamePhase},
    error::ServiceError,
    state::SharedState,
};

/// Add (or remove, when negative) points to a team.
pub async fn adjust_points(
    state: &SharedState,
    team: usize,
    points: i32,
) -> Result<GameSnapshot, ServiceError> {
    let snapshot = state
        .run_command("fix_points", |engine| {
            engine.add_points(team, points)?;
            Ok(GameSnapshot::from(&*engine))
        })
        .await?;
    info!(team, points, "score corrected");
    Ok(snapshot)
}

/// Jump straight to a phase.
pub async fn force_state(
    state: &SharedState,
    phase: VisibleGamePhase,
) -> Result<GameSnapshot, ServiceError> {
    state
        .run_command("fix_state", |engine| {
            engine.force_state(phase.into())?;
            Ok(GameSnapshot::from(&*engine))
        })
        .await
}

/// Hand the board to another team.
pub async fn set_selecting(state: &SharedState, team: usize) -> Result<GameSnapshot, ServiceError> {
    state
        .run_command("fix_selecting", |engine| {
            engine.set_selecting(team)?;
            Ok(GameSnapshot::from(&*engine))
        })
        .await
}
