use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{AdjustPointsRequest, ForceStateRequest, SaveListItem, SetSelectingRequest},
        game::GameSnapshot,
    },
    error::AppError,
    services::{admin_service, save_service},
    state::SharedState,
};

/// Manual corrections and save management.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/fix/points", post(adjust_points))
        .route("/fix/state", post(force_state))
        .route("/fix/selecting", post(set_selecting))
        .route("/saves", get(list_saves))
        .route("/saves/{id}/load", post(load_save))
}

/// Correct the balance of a team.
#[utoipa::path(
    post,
    path = "/fix/points",
    tag = "admin",
    request_body = AdjustPointsRequest,
    responses(
        (status = 200, description = "Score corrected", body = GameSnapshot),
        (status = 400, description = "Unknown team")
    )
)]
pub async fn adjust_points(
    State(state): State<SharedState>,
    Json(payload): Json<AdjustPointsRequest>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(
        admin_service::adjust_points(&state, payload.team, payload.points).await?,
    ))
}

/// Force the game into a phase.
#[utoipa::path(
    post,
    path = "/fix/state",
    tag = "admin",
    request_body = ForceStateRequest,
    responses(
        (status = 200, description = "Phase forced", body = GameSnapshot),
        (status = 409, description = "Game over")
    )
)]
pub async fn force_state(
    State(state): State<SharedState>,
    Json(payload): Json<ForceStateRequest>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(admin_service::force_state(&state, payload.state).await?))
}

/// Give the board to another team.
#[utoipa::path(
    post,
    path = "/fix/selecting",
    tag = "admin",
    request_body = SetSelectingRequest,
    responses(
        (status = 200, description = "Selecting team changed", body = GameSnapshot),
        (status = 400, description = "Unknown team")
    )
)]
pub async fn set_selecting(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SetSelectingRequest>>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(
        admin_service::set_selecting(&state, payload.team).await?,
    ))
}

/// List saved games, oldest first.
#[utoipa::path(
    get,
    path = "/saves",
    tag = "admin",
    responses(
        (status = 200, description = "Saved games", body = [SaveListItem]),
        (status = 503, description = "Saves disabled or unreadable")
    )
)]
pub async fn list_saves(
    State(state): State<SharedState>,
) -> Result<Json<Vec<SaveListItem>>, AppError> {
    Ok(Json(save_service::list_saves(&state).await?))
}

/// Rewind the game to a save; later saves are deleted.
#[utoipa::path(
    post,
    path = "/saves/{id}/load",
    tag = "admin",
    params(("id" = u64, Path, description = "Identifier of the save to load")),
    responses(
        (status = 200, description = "Save loaded", body = GameSnapshot),
        (status = 404, description = "Save not found"),
        (status = 503, description = "Saves disabled or unreadable")
    )
)]
pub async fn load_save(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<GameSnapshot>, AppError> {
    Ok(Json(save_service::load_save(&state, id).await?))
}
