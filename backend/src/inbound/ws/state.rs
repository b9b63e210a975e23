//! Shared WebSocket adapter state.
//!
//! WebSocket entry points depend on the search pipeline and the identity
//! port instead of constructing adapters directly. This makes the adapter
//! testable with deterministic test doubles and keeps side effects out of the
//! session loop.

use std::sync::Arc;

use super::AllowedOrigins;
use crate::domain::SearchPipeline;
use crate::domain::ports::IdentityProvider;

/// Dependency bundle for WebSocket handlers and sessions.
#[derive(Clone)]
pub struct WsState {
    pub pipeline: Arc<SearchPipeline>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub allowed_origins: Arc<AllowedOrigins>,
}

impl WsState {
    /// Construct state from explicit port implementations.
    pub fn new(
        pipeline: Arc<SearchPipeline>,
        identity_provider: Arc<dyn IdentityProvider>,
        allowed_origins: AllowedOrigins,
    ) -> Self {
        Self {
            pipeline,
            identity_provider,
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
