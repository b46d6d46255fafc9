use crate::api::{kitchen_error_response, ClassificationSummary, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sous_core::{Kitchen, RecipeOutcome, RecipeRequest, UserPreferences};
use std::sync::Arc;
use utoipa::ToSchema;

use super::get::RecipeResponse;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GenerateRecipeRequest {
    /// What to cook, in the user's own words. Empty means "surprise me".
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    /// Words, cuisines or techniques to steer away from
    #[serde(default)]
    pub avoid: Vec<String>,
}

impl From<GenerateRecipeRequest> for RecipeRequest {
    fn from(req: GenerateRecipeRequest) -> Self {
        Self {
            text: req.text,
            preferences: req.preferences,
            avoid: req.avoid,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenerateRecipeResponse {
    pub recipe: RecipeResponse,
    pub classification: ClassificationSummary,
    /// Present when the recipe is a placeholder and the user should retry
    pub message: Option<String>,
}

impl From<RecipeOutcome> for GenerateRecipeResponse {
    fn from(outcome: RecipeOutcome) -> Self {
        Self {
            classification: ClassificationSummary::from(&outcome.classification),
            recipe: RecipeResponse::from(outcome.recipe),
            message: outcome.message,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/recipes/generate",
    tag = "recipes",
    request_body(content = GenerateRecipeRequest, example = json!({"text": "Rick Stein's pan-seared sea bass with lemon butter"})),
    responses(
        (status = 201, description = "Recipe generated and saved", body = GenerateRecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_recipe(
    AuthUser(user): AuthUser,
    State(kitchen): State<Arc<Kitchen>>,
    Json(req): Json<GenerateRecipeRequest>,
) -> impl IntoResponse {
    match kitchen.handle_recipe_request(user.id, req.into()).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(GenerateRecipeResponse::from(outcome)),
        )
            .into_response(),
        Err(e) => kitchen_error_response(e),
    }
}
