use crate::api::{kitchen_error_response, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sous_core::{Ingredient, Kitchen, StoredRecipe};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub servings: u32,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    pub total_time_minutes: u32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    /// Model that wrote the recipe
    pub model: String,
    /// True when this is the placeholder served after a failed generation
    pub fallback: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredRecipe> for RecipeResponse {
    fn from(stored: StoredRecipe) -> Self {
        let total_time_minutes = stored.recipe.total_time_minutes();
        let recipe = stored.recipe;
        Self {
            id: stored.id,
            title: recipe.title,
            description: recipe.description,
            servings: recipe.servings,
            prep_time_minutes: recipe.prep_time_minutes,
            cook_time_minutes: recipe.cook_time_minutes,
            total_time_minutes,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            image_url: recipe.image_url,
            model: stored.meta.model,
            fallback: stored.meta.fallback,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    AuthUser(user): AuthUser,
    State(kitchen): State<Arc<Kitchen>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match kitchen.get_recipe(user.id, id).await {
        Ok(stored) => (StatusCode::OK, Json(RecipeResponse::from(stored))).into_response(),
        Err(e) => kitchen_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sous_core::{fallback_recipe, GenerationMeta};
    use uuid::Uuid;

    #[test]
    fn test_response_flattens_stored_recipe() {
        let now = Utc::now();
        let stored = StoredRecipe {
            id: 3,
            owner_id: Uuid::new_v4(),
            recipe: fallback_recipe(),
            meta: GenerationMeta {
                model: "gpt-4o-mini".to_string(),
                fallback: true,
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        };
        let expected_total = stored.recipe.total_time_minutes();

        let response = RecipeResponse::from(stored);
        assert_eq!(response.id, 3);
        assert_eq!(response.title, "Simple Tomato Pasta");
        assert_eq!(response.total_time_minutes, expected_total);
        assert!(response.fallback);
    }
}
