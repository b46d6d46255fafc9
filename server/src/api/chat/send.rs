use crate::api::recipes::get::RecipeResponse;
use crate::api::{kitchen_error_response, ClassificationSummary, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sous_core::{ChatMessageRequest, ChatOutcome, Kitchen};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// The recipe being discussed. Without one, only general questions get an answer.
    pub recipe_id: Option<i64>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
    /// The recipe after this message changed it
    pub updated_recipe: Option<RecipeResponse>,
    pub classification: ClassificationSummary,
    /// True when the reply is a canned retry message
    pub fallback: bool,
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        Self {
            classification: ClassificationSummary::from(&outcome.classification),
            reply: outcome.reply,
            updated_recipe: outcome.updated_recipe.map(RecipeResponse::from),
            fallback: outcome.fallback,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "chat",
    request_body(content = SendMessageRequest, example = json!({"recipe_id": 1, "message": "make it spicier"})),
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn send_message(
    AuthUser(user): AuthUser,
    State(kitchen): State<Arc<Kitchen>>,
    Json(req): Json<SendMessageRequest>,
) -> impl IntoResponse {
    let request = ChatMessageRequest {
        recipe_id: req.recipe_id,
        message: req.message,
    };
    match kitchen.handle_chat_message(user.id, request).await {
        Ok(outcome) => (StatusCode::OK, Json(ChatResponse::from(outcome))).into_response(),
        Err(e) => kitchen_error_response(e),
    }
}
