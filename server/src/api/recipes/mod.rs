pub mod delete;
pub mod generate;
pub mod get;
pub mod history;
pub mod list;
pub mod titles;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes))
        .route("/generate", post(generate::generate_recipe))
        .route("/titles", post(titles::suggest_titles))
        .route(
            "/{id}",
            get(get::get_recipe).delete(delete::delete_recipe),
        )
        .route("/{id}/messages", get(history::chat_history))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        generate::generate_recipe,
        titles::suggest_titles,
        list::list_recipes,
        get::get_recipe,
        delete::delete_recipe,
        history::chat_history,
    ),
    components(schemas(
        generate::GenerateRecipeRequest,
        generate::GenerateRecipeResponse,
        titles::TitleIdeasRequest,
        titles::TitleIdeasResponse,
        list::ListRecipesResponse,
        list::RecipeSummary,
        get::RecipeResponse,
        history::ChatHistoryResponse,
        history::ChatMessageResponse,
        sous_core::Ingredient,
        sous_core::UserPreferences,
        sous_core::Budget,
        sous_core::SkillLevel,
        sous_core::Intent,
        sous_core::SpecificityTier,
        sous_core::ModelTier,
        sous_core::TurnRole,
    ))
)]
pub struct ApiDoc;
