// Assessment extraction
// Implements: template selection, provider call, reply parsing, document intake.
// All LLM calls go through llm_client, no direct provider calls here.

pub mod document;
pub mod extractor;
pub mod handlers;
pub mod models;
pub mod prompts;
