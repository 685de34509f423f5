use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::game::{CategoriesResponse, GameSnapshot, QuestionSummary, TeamSummary},
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints used by the displays.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/state", get(get_state))
        .route("/questions", get(get_questions))
        .route("/question/{id}", get(get_question))
        .route("/teams", get(get_teams))
        .route("/winners", get(get_winners))
}

#[utoipa::path(
    get,
    path = "/state",
    tag = "public",
    responses((status = 200, description = "Full game snapshot", body = GameSnapshot))
)]
/// Return the full game snapshot.
pub async fn get_state(State(state): State<SharedState>) -> Json<GameSnapshot> {
    Json(public_service::get_state(&state).await)
}

#[utoipa::path(
    get,
    path = "/questions",
    tag = "public",
    responses((status = 200, description = "Board questions by category", body = CategoriesResponse))
)]
/// Return the board grouped by category.
pub async fn get_questions(State(state): State<SharedState>) -> Json<CategoriesResponse> {
    Json(public_service::get_questions(&state).await)
}

#[utoipa::path(
    get,
    path = "/question/{id}",
    tag = "public",
    params(("id" = usize, Path, description = "Board question identifier")),
    responses(
        (status = 200, description = "Question", body = QuestionSummary),
        (status = 404, description = "Unknown question")
    )
)]
pub async fn get_question(
    State(state): State<SharedState>,
    Path(id): Path<usize>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(public_service::get_question(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/teams",
    tag = "public",
    responses((status = 200, description = "Teams in controller order", body = [TeamSummary]))
)]
pub async fn get_teams(State(state): State<SharedState>) -> Json<Vec<TeamSummary>> {
    Json(public_service::get_teams(&state).await)
}

#[utoipa::path(
    get,
    path = "/winners",
    tag = "public",
    responses((status = 200, description = "Teams by balance, best first", body = [TeamSummary]))
)]
/// Return the scoreboard.
pub async fn get_winners(State(state): State<SharedState>) -> Json<Vec<TeamSummary>> {
    Json(public_service::get_winners(&state).await)
}
