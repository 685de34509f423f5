use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::game::set_teams,
        crate::routes::game::select_question,
        crate::routes::game::begin_answering,
        crate::routes::game::answer,
        crate::routes::game::skip,
        crate::routes::game::stop_timer,
        crate::routes::game::buzz,
        crate::routes::game::reveal_split_or_steal,
        crate::routes::admin::adjust_points,
        crate::routes::admin::force_state,
        crate::routes::admin::set_selecting,
        crate::routes::admin::list_saves,
        crate::routes::admin::load_save,
        crate::routes::public::get_state,
        crate::routes::public::get_questions,
        crate::routes::public::get_question,
        crate::routes::public::get_teams,
        crate::routes::public::get_winners,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::game::GameSnapshot,
            crate::dto::game::TeamSummary,
            crate::dto::game::QuestionSummary,
            crate::dto::game::ActionsSnapshot,
            crate::dto::game::CategoriesResponse,
            crate::dto::admin::SetTeamsRequest,
            crate::dto::admin::SelectQuestionRequest,
            crate::dto::admin::AnswerRequest,
            crate::dto::admin::AnswerResponse,
            crate::dto::admin::ButtonName,
            crate::dto::admin::BuzzRequest,
            crate::dto::admin::BuzzResponse,
            crate::dto::admin::AdjustPointsRequest,
            crate::dto::admin::ForceStateRequest,
            crate::dto::admin::SetSelectingRequest,
            crate::dto::admin::SaveListItem,
            crate::dto::sse::SystemStatus,
            crate::dto::ws::PadInboundMessage,
            crate::dto::ws::PadOutboundMessage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Moderator commands"),
        (name = "admin", description = "Manual corrections and saves"),
        (name = "public", description = "Read-only views for the displays"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "controllers", description = "WebSocket operations for virtual controllers"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/teams",
            "/buzz",
            "/split_or_steal/reveal",
            "/fix/state",
            "/saves/{id}/load",
            "/question/{id}",
            "/sse",
            "/ws/controllers",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
