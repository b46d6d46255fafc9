use crate::api::{kitchen_error_response, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sous_core::{Kitchen, StoredRecipe};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub total_time_minutes: u32,
    pub image_url: Option<String>,
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredRecipe> for RecipeSummary {
    fn from(stored: StoredRecipe) -> Self {
        Self {
            id: stored.id,
            total_time_minutes: stored.recipe.total_time_minutes(),
            title: stored.recipe.title,
            description: stored.recipe.description,
            image_url: stored.recipe.image_url,
            fallback: stored.meta.fallback,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListRecipesResponse {
    /// Newest first
    pub recipes: Vec<RecipeSummary>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "List of user's recipes", body = ListRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_recipes(
    AuthUser(user): AuthUser,
    State(kitchen): State<Arc<Kitchen>>,
) -> impl IntoResponse {
    match kitchen.list_recipes(user.id).await {
        Ok(recipes) => (
            StatusCode::OK,
            Json(ListRecipesResponse {
                recipes: recipes.into_iter().map(RecipeSummary::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => kitchen_error_response(e),
    }
}
