use std::sync::Arc;
use async_trait::async_trait;
use crate::models::errors::PushError;
use crate::models::push::{PermissionState, PlatformCapabilities, PushSubscription, SubscribeOptions};

/// Process-wide push facilities of the host: permission prompt and the
/// background worker registry. Shared by every open page, never owned.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    fn capabilities(&self) -> PlatformCapabilities;

    /// Resolves once the user has answered the prompt.
    async fn request_permission(&self) -> Result<PermissionState, PushError>;

    /// Registers the worker script, or returns the registration that already exists.
    async fn register_worker(&self, script_url: &str) -> Result<Arc<dyn WorkerRegistration>, PushError>;
}

/// A registered background worker and its push manager.
#[async_trait]
pub trait WorkerRegistration: Send + Sync {
    async fn get_subscription(&self) -> Result<Option<PushSubscription>, PushError>;

    async fn subscribe(&self, options: SubscribeOptions) -> Result<PushSubscription, PushError>;
}
