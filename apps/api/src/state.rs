use std::sync::Arc;

use crate::config::Config;
use crate::cosmos::texture::TextureCache;
use crate::extraction::ContentExtractor;
use crate::llm_client::TextCompletion;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Model boundary. `LlmClient` in production.
    pub llm: Arc<dyn TextCompletion>,
    /// PDF/web text boundary. `HttpExtractor` in production.
    pub extractor: Arc<dyn ContentExtractor>,
    /// The only cross-request state; content-addressed and byte-budgeted.
    pub textures: Arc<TextureCache>,
}
