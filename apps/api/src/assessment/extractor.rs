//! Extraction pipeline: pick a template, call the provider, parse the reply.

use serde_json::Value;
use tracing::{info, warn};

use crate::assessment::models::{AssessmentKind, ExtractionSummary};
use crate::assessment::prompts::{build_extraction_prompt, extraction_system};
use crate::errors::AppError;
use crate::llm_client::{parse_json_reply, CompletionProvider};

/// Extracts questions and suggested answers from `content`.
///
/// The parsed reply is returned exactly as the model produced it. Field names and
/// shapes are requested in the prompt but never enforced here.
pub async fn extract_assessment(
    content: &str,
    provider: &dyn CompletionProvider,
) -> Result<Value, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content cannot be empty".to_string()));
    }

    let kind = AssessmentKind::detect(content);
    info!(
        kind = kind.as_str(),
        chars = content.len(),
        provider = provider.display_name(),
        "Extracting assessment"
    );

    let prompt = build_extraction_prompt(kind, content);
    let reply = provider
        .complete(&prompt, &extraction_system())
        .await
        .map_err(|e| AppError::from_llm(provider.display_name(), e))?;

    let parsed: Value =
        parse_json_reply(&reply).map_err(|e| AppError::MalformedModelOutput {
            provider: provider.display_name().to_string(),
            detail: e.to_string(),
        })?;

    let summary = ExtractionSummary::from_value(&parsed);
    if summary.disagrees_with(kind) {
        warn!(
            prompted = kind.as_str(),
            reported = ?summary.reported_type,
            "Model reported a different assessment type"
        );
    }
    info!(
        questions = summary.question_count,
        case_study_context = summary.has_case_study_context,
        "Assessment extracted"
    );

    Ok(parsed)
}
