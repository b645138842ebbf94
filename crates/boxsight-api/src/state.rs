//! Shared application state.

use std::sync::Arc;

use boxsight_core::{BearerGuard, PromptSource, ServiceConfig, UploadPolicy};
use boxsight_inference::VisionBackend;

/// Read-only state shared by every handler. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub guard: Arc<BearerGuard>,
    pub policy: UploadPolicy,
    pub prompt: PromptSource,
    /// None when `OPENAI_API_KEY` is unset.
    pub vision: Option<Arc<dyn VisionBackend>>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        prompt: PromptSource,
        vision: Option<Arc<dyn VisionBackend>>,
    ) -> Self {
        Self {
            guard: Arc::new(BearerGuard::from_config(&config)),
            policy: UploadPolicy::from_config(&config),
            config: Arc::new(config),
            prompt,
            vision,
        }
    }
}
