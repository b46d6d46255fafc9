//! The catch-all rule: one call to the cheap classification model.

use serde_json::Value;
use thiserror::Error;

use super::{
    ClassificationResult, ClassificationSource, Classifier, ClassifyContext, ExtractedElements,
    Intent, SpecificityTier,
};
use crate::ai::{estimate_cost_usd, AiError, ChatMessage, ChatRequest};
use crate::generate::repair::sanitize_json;
use crate::prompts::classify::{
    render_classify_system_prompt, render_classify_user_prompt, CLASSIFY_PROMPT_NAME,
};

/// Why the fallback model could not classify an input.
///
/// Never leaves this module's caller: [`Classifier::classify`] recovers
/// every variant with the safe default.
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Classifier model call failed: {0}")]
    Provider(#[from] AiError),

    #[error("Classifier model timed out")]
    Timeout,

    #[error("Classifier output was not JSON: {0}")]
    Unparsable(String),
}

const FALLBACK_MAX_TOKENS: u32 = 100;
const MISSING_CONFIDENCE: f32 = 0.5;

impl Classifier {
    pub(super) async fn classify_with_model(
        &self,
        text: &str,
        context: &ClassifyContext,
    ) -> Result<ClassificationResult, ClassificationError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(render_classify_system_prompt(self.variant.requires_recipe())),
                ChatMessage::user(render_classify_user_prompt(
                    text,
                    context.current_recipe.as_ref(),
                    &context.history,
                )),
            ],
            model: Some(self.model.clone()),
            max_tokens: Some(FALLBACK_MAX_TOKENS),
            temperature: Some(0.0),
            json_response: true,
        };

        let response = tokio::time::timeout(
            self.timeout,
            self.client.complete(CLASSIFY_PROMPT_NAME, request),
        )
        .await
        .map_err(|_| ClassificationError::Timeout)??;

        let mut result = parse_classification(&response.content, self.variant.default_intent())?;
        result.estimated_cost_usd = estimate_cost_usd(&response.model, &response.usage);

        tracing::debug!(
            model = %response.model,
            intent = result.intent.as_str(),
            tier = result.specificity_tier.as_str(),
            confidence = result.confidence,
            cached = response.cached,
            "Classified by model fallback"
        );

        Ok(result)
    }
}

/// Parse the model's JSON verdict. Missing or unknown fields take the
/// documented defaults; only non-JSON content is an error.
pub(super) fn parse_classification(
    content: &str,
    default_intent: Intent,
) -> Result<ClassificationResult, ClassificationError> {
    let cleaned = sanitize_json(content);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| ClassificationError::Unparsable(e.to_string()))?;
    let Value::Object(fields) = value else {
        return Err(ClassificationError::Unparsable(
            "expected a JSON object".to_string(),
        ));
    };

    let intent = fields
        .get("intent")
        .and_then(Value::as_str)
        .and_then(Intent::parse)
        .unwrap_or(default_intent);
    let tier = fields
        .get("specificity")
        .or_else(|| fields.get("specificity_tier"))
        .and_then(Value::as_str)
        .and_then(SpecificityTier::parse)
        .unwrap_or(SpecificityTier::SomewhatVague);
    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c as f32)
        .unwrap_or(MISSING_CONFIDENCE);
    let extracted = fields
        .get("elements")
        .cloned()
        .and_then(|v| serde_json::from_value::<ExtractedElements>(v).ok())
        .unwrap_or_default();

    let mut result = ClassificationResult::new(intent, confidence, tier);
    result.extracted = extracted;
    result.source = ClassificationSource::Model;
    Ok(result)
}
