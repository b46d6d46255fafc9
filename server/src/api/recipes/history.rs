use crate::api::{kitchen_error_response, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use sous_core::{ChatTurn, Kitchen, TurnRole};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatMessageResponse {
    pub role: TurnRole,
    pub content: String,
}

impl From<ChatTurn> for ChatMessageResponse {
    fn from(turn: ChatTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatHistoryResponse {
    /// Oldest first
    pub messages: Vec<ChatMessageResponse>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/messages",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Conversation about the recipe", body = ChatHistoryResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn chat_history(
    AuthUser(user): AuthUser,
    State(kitchen): State<Arc<Kitchen>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match kitchen.chat_history(user.id, id).await {
        Ok(turns) => (
            StatusCode::OK,
            Json(ChatHistoryResponse {
                messages: turns.into_iter().map(ChatMessageResponse::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => kitchen_error_response(e),
    }
}
