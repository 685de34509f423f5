use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{
            AnswerRequest, AnswerResponse, BuzzRequest, BuzzResponse, SelectQuestionRequest,
            SetTeamsRequest,
        },
        game::GameSnapshot,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Moderator commands driving the normal flow of a game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", post(set_teams))
        .route("/question", post(select_question))
        .route("/buzz_start", post(begin_answering))
        .route("/answer", post(answer))
        .route("/skip", post(skip))
        .route("/stop_timer", post(stop_timer))
        .route("/buzz", post(buzz))
        .route("/split_or_steal/reveal", post(reveal_split_or_steal))
}

/// Register the teams and open the board.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "game",
    request_body = SetTeamsRequest,
    responses(
        (status = 200, description = "Teams registered", body = GameSnapshot),
        (status = 400, description = "Invalid rosters"),
        (status = 409, description = "Game already started")
    )
)]
pub async fn set_teams(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SetTeamsRequest>>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(game_service::set_teams(&state, payload.teams).await?))
}

/// Put a board question in play.
#[utoipa::path(
    post,
    path = "/question",
    tag = "game",
    request_body = SelectQuestionRequest,
    responses(
        (status = 200, description = "Question selected", body = GameSnapshot),
        (status = 400, description = "Unknown question"),
        (status = 409, description = "Not selecting a question")
    )
)]
pub async fn select_question(
    State(state): State<SharedState>,
    Json(payload): Json<SelectQuestionRequest>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(game_service::select_question(&state, payload.id).await?))
}

/// Open the buzz window, or the split-or-steal vote.
#[utoipa::path(
    post,
    path = "/buzz_start",
    tag = "game",
    responses(
        (status = 200, description = "Buzzers armed", body = GameSnapshot),
        (status = 409, description = "No question being read")
    )
)]
pub async fn begin_answering(
    State(state): State<SharedState>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(game_service::begin_answering(&state).await?))
}

/// Judge the answer of the team that buzzed in.
#[utoipa::path(
    post,
    path = "/answer",
    tag = "game",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer judged", body = AnswerResponse),
        (status = 409, description = "No team is answering")
    )
)]
pub async fn answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    Ok(Json(game_service::answer(&state, payload.correct).await?))
}

#[utoipa::path(
    post,
    path = "/skip",
    tag = "game",
    responses(
        (status = 200, description = "Question skipped", body = GameSnapshot),
        (status = 409, description = "No question in play")
    )
)]
pub async fn skip(State(state): State<SharedState>) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(game_service::skip(&state).await?))
}

#[utoipa::path(
    post,
    path = "/stop_timer",
    tag = "game",
    responses(
        (status = 200, description = "Timer stop signalled", body = GameSnapshot),
        (status = 409, description = "Game over")
    )
)]
pub async fn stop_timer(State(state): State<SharedState>) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(game_service::stop_timer(&state).await?))
}

/// Simulate a controller button press.
#[utoipa::path(
    post,
    path = "/buzz",
    tag = "game",
    request_body = BuzzRequest,
    responses(
        (status = 200, description = "Press handled", body = BuzzResponse),
        (status = 400, description = "Unknown controller")
    )
)]
pub async fn buzz(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<BuzzRequest>>,
) -> Result<Json<BuzzResponse>, AppError> {
    Ok(Json(
        game_service::buzz(&state, payload.controller, payload.button).await?,
    ))
}

/// Settle the split-or-steal votes.
#[utoipa::path(
    post,
    path = "/split_or_steal/reveal",
    tag = "game",
    responses(
        (status = 200, description = "Votes revealed", body = GameSnapshot),
        (status = 409, description = "Not every player has voted")
    )
)]
pub async fn reveal_split_or_steal(
    State(state): State<SharedState>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(game_service::reveal_split_or_steal(&state).await?))
}
