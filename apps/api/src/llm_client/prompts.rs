// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps extracted text faithful to the source document.
pub const VERBATIM_INSTRUCTION: &str = "\
    CRITICAL: Copy questions, instructions and answer points exactly as written. \
    Do NOT shorten, paraphrase, merge or invent content. \
    If a field is not present in the document, use null (or an empty string for text context).";
