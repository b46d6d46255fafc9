use crate::api::{kitchen_error_response, ClassificationSummary, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use sous_core::{Kitchen, UserPreferences};
use std::sync::Arc;
use utoipa::ToSchema;

const DEFAULT_COUNT: u32 = 3;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TitleIdeasRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    /// How many ideas to return (1-6, default 3)
    pub count: Option<u32>,
}

impl From<TitleIdeasRequest> for sous_core::TitleIdeasRequest {
    fn from(req: TitleIdeasRequest) -> Self {
        Self {
            text: req.text,
            preferences: req.preferences,
            count: req.count.unwrap_or(DEFAULT_COUNT),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TitleIdeasResponse {
    /// Distinct titles; failed slots are left out
    pub titles: Vec<String>,
    pub classification: ClassificationSummary,
}

#[utoipa::path(
    post,
    path = "/api/recipes/titles",
    tag = "recipes",
    request_body(content = TitleIdeasRequest, example = json!({"text": "something cosy for a rainy night", "count": 3})),
    responses(
        (status = 200, description = "Title ideas", body = TitleIdeasResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn suggest_titles(
    AuthUser(user): AuthUser,
    State(kitchen): State<Arc<Kitchen>>,
    Json(req): Json<TitleIdeasRequest>,
) -> impl IntoResponse {
    match kitchen.suggest_titles(user.id, req.into()).await {
        Ok(ideas) => (
            StatusCode::OK,
            Json(TitleIdeasResponse {
                classification: ClassificationSummary::from(&ideas.classification),
                titles: ideas.titles,
            }),
        )
            .into_response(),
        Err(e) => kitchen_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_defaults_to_three() {
        let req: TitleIdeasRequest = serde_json::from_str(r#"{"text": "pasta"}"#).unwrap();
        let core: sous_core::TitleIdeasRequest = req.into();
        assert_eq!(core.count, 3);
        assert!(core.validate().is_ok());
    }
}
