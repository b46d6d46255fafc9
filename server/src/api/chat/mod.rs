pub mod send;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/chat endpoints (mounted at /api/chat)
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(send::send_message))
}

#[derive(OpenApi)]
#[openapi(
    paths(send::send_message),
    components(schemas(send::SendMessageRequest, send::ChatResponse))
)]
pub struct ApiDoc;
