pub mod chat;
pub mod public;
pub mod recipes;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sous_core::{
    ClassificationResult, ClassificationSource, Intent, KitchenError, ModelTier, SpecificityTier,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Map a pipeline error to its HTTP status with a message safe to show users.
pub fn kitchen_error_response(err: KitchenError) -> Response {
    match err {
        KitchenError::Validation(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        KitchenError::NotFoundOrForbidden => {
            error_response(StatusCode::NOT_FOUND, "Recipe not found")
        }
        KitchenError::Store(message) => {
            tracing::error!(error = %message, "Recipe storage failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong saving your recipe. Please try again.",
            )
        }
    }
}

/// How a request was understood.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassificationSummary {
    pub intent: Intent,
    pub confidence: f32,
    pub specificity_tier: SpecificityTier,
    pub model_tier: ModelTier,
    pub requires_context: bool,
    /// `rule:<name>`, `model` or `safe_default`
    pub source: String,
}

impl From<&ClassificationResult> for ClassificationSummary {
    fn from(c: &ClassificationResult) -> Self {
        let source = match &c.source {
            ClassificationSource::Rule(name) => format!("rule:{}", name),
            ClassificationSource::Model => "model".to_string(),
            ClassificationSource::SafeDefault => "safe_default".to_string(),
        };
        Self {
            intent: c.intent,
            confidence: c.confidence,
            specificity_tier: c.specificity_tier,
            model_tier: c.model_tier_hint,
            requires_context: c.requires_context,
            source,
        }
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "sous", description = "Recipe generation API"),
        components(schemas(ErrorResponse, ClassificationSummary))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        chat::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use sous_core::ValidationError;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (
                KitchenError::Validation(ValidationError::Empty("message")),
                StatusCode::BAD_REQUEST,
            ),
            (KitchenError::NotFoundOrForbidden, StatusCode::NOT_FOUND),
            (
                KitchenError::Store("connection reset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(kitchen_error_response(err).status(), status);
        }
    }

    #[test]
    fn test_openapi_lists_every_route() {
        let spec = openapi();
        for path in [
            "/api/auth/signup",
            "/api/auth/login",
            "/api/recipes",
            "/api/recipes/generate",
            "/api/recipes/titles",
            "/api/recipes/{id}",
            "/api/recipes/{id}/messages",
            "/api/chat",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(spec
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }

    #[test]
    fn test_summary_names_rule_source() {
        let mut result = ClassificationResult::new(
            Intent::NewRecipe,
            0.95,
            SpecificityTier::CrystalClear,
        );
        result.source = ClassificationSource::Rule("possessive_chef");
        let summary = ClassificationSummary::from(&result);
        assert_eq!(summary.source, "rule:possessive_chef");
        assert_eq!(summary.model_tier, result.model_tier_hint);
    }
}
