use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The configured provider. Tests swap in a mock.
    pub provider: Arc<dyn CompletionProvider>,
    pub config: Config,
}
