use std::sync::Arc;
use log::Level;
use serde_json::{json, Map};
use crate::models::errors::PushError;
use crate::models::push::{PermissionState, PushSubscription, PushSubscriptionRecord, SubscribeOptions, SubscribeParams};
use crate::platform::push_platform::PushPlatform;
use crate::services::push_key_exchange::PushKeyExchange;
use crate::utilities::config::{push_path, DEFAULT_WORKER_SCRIPT};
use crate::utilities::logging::{log_event, log_info};
use crate::utilities::requests::{ApiRequest, RequestLayer};

/// Opt-in flow for queue push alerts.
///
/// Steps run strictly in order and the first failure ends the attempt:
/// capability check, permission prompt, worker registration, key exchange,
/// subscription reuse-or-create, server registration. Every failure is
/// reported to the caller as `false`.
pub struct SubscriptionManager {
    platform: Arc<dyn PushPlatform>,
    requests: Arc<dyn RequestLayer>,
    key_exchange: PushKeyExchange,
    worker_script: String,
}

impl SubscriptionManager {
    pub fn new(platform: Arc<dyn PushPlatform>, requests: Arc<dyn RequestLayer>) -> Self {
        Self {
            platform,
            key_exchange: PushKeyExchange::new(requests.clone()),
            requests,
            worker_script: DEFAULT_WORKER_SCRIPT.to_string(),
        }
    }

    pub fn with_worker_script(mut self, script_url: impl Into<String>) -> Self {
        self.worker_script = script_url.into();
        self
    }

    pub async fn ensure_subscription(&self, params: &SubscribeParams) -> bool {
        match self.subscribe(params).await {
            Ok(endpoint) => {
                log_info("PushSubscribe", &format!("Booking {} subscribed at {}", params.booking_id, endpoint));
                true
            }
            Err(e) => {
                let mut fields = Map::new();
                fields.insert("bookingId".to_string(), json!(params.booking_id));
                fields.insert("error".to_string(), json!(e.to_string()));
                log_event(Level::Warn, "PushSubscribeFailed", fields);
                false
            }
        }
    }

    async fn subscribe(&self, params: &SubscribeParams) -> Result<String, PushError> {
        let capabilities = self.platform.capabilities();
        if !capabilities.background_worker {
            return Err(PushError::CapabilityUnsupported("background workers".to_string()));
        }
        if !capabilities.push_manager {
            return Err(PushError::CapabilityUnsupported("push delivery".to_string()));
        }

        let permission = self.platform.request_permission().await.unwrap_or_else(|e| {
            log::warn!("Permission prompt unavailable: {}", e);
            PermissionState::Denied
        });
        if permission != PermissionState::Granted {
            return Err(PushError::PermissionDenied(permission));
        }

        let registration = self.platform.register_worker(&self.worker_script).await?;
        let application_server_key = self.key_exchange.fetch_application_server_key().await?;

        let subscription = match registration.get_subscription().await? {
            Some(existing) => {
                log::info!("♻️ Reusing push subscription {}", existing.endpoint);
                existing
            }
            None => {
                let created = registration
                    .subscribe(SubscribeOptions::user_visible(application_server_key))
                    .await?;
                log::info!("🆕 Created push subscription {}", created.endpoint);
                created
            }
        };

        let endpoint = subscription.endpoint.clone();
        let record = PushSubscriptionRecord::new(subscription, params);
        let res = self.requests.send(ApiRequest::post(push_path("/subscribe"), &record)?).await;
        if !res.is_success() {
            return Err(PushError::Network(res.status));
        }

        Ok(endpoint)
    }

    /// Asks the server to stop sending to `subscription`.
    pub async fn unsubscribe(&self, subscription: &PushSubscription) -> bool {
        let request = match ApiRequest::post(push_path("/unsubscribe"), subscription) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("Could not serialize subscription: {}", e);
                return false;
            }
        };

        let res = self.requests.send(request).await;
        if !res.is_success() {
            log::warn!("Unsubscribe for {} failed with {}", subscription.endpoint, res.status);
            return false;
        }

        log_info("PushUnsubscribe", &format!("Unsubscribed {}", subscription.endpoint));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utilities::requests::ApiResponse;
    use crate::utilities::test::{FakePushPlatform, FakeRequestLayer};
    use crate::models::push::PlatformCapabilities;

    fn params() -> SubscribeParams {
        SubscribeParams {
            booking_id: "BK-88".into(),
            temple: "somnath".into(),
            queue_number: 12,
            time_slot: Some("06:00-08:00".into()),
            enabled: true,
        }
    }

    fn happy_server() -> Arc<FakeRequestLayer> {
        let requests = Arc::new(FakeRequestLayer::new());
        requests.respond("/api/v1/push/vapid-public-key", ApiResponse::new(200, r#"{"publicKey":"aGVsbG8"}"#));
        requests.respond("/api/v1/push/subscribe", ApiResponse::new(200, r#"{"status":"subscribed","subscriptionId":"s-1"}"#));
        requests.respond("/api/v1/push/unsubscribe", ApiResponse::new(200, r#"{"status":"unsubscribed"}"#));
        requests
    }

    #[tokio::test]
    async fn test_subscribe_happy_path() {
        let platform = Arc::new(FakePushPlatform::granting());
        let requests = happy_server();
        let manager = SubscriptionManager::new(platform.clone(), requests.clone());

        assert!(manager.ensure_subscription(&params()).await);

        assert_eq!(platform.subscribe_calls(), 1);
        let options = platform.last_subscribe_options().expect("subscribe options");
        assert!(options.user_visible_only);
        assert_eq!(options.application_server_key, b"hello".to_vec());
        assert_eq!(platform.registered_scripts(), vec!["/service-worker.js".to_string()]);

        let body = requests.last_body("/api/v1/push/subscribe").expect("subscribe body");
        assert_eq!(body["bookingId"], "BK-88");
        assert_eq!(body["timeSlot"], "06:00-08:00");
        assert_eq!(body["subscription"]["endpoint"], platform.endpoint());
    }

    #[tokio::test]
    async fn test_repeat_calls_reuse_subscription() {
        let platform = Arc::new(FakePushPlatform::granting());
        let manager = SubscriptionManager::new(platform.clone(), happy_server());

        assert!(manager.ensure_subscription(&params()).await);
        assert!(manager.ensure_subscription(&params()).await);

        assert_eq!(platform.subscribe_calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_opt_ins_share_one_subscription() {
        let platform = Arc::new(FakePushPlatform::granting());
        let requests = happy_server();
        let first_page = SubscriptionManager::new(platform.clone(), requests.clone());
        let second_page = SubscriptionManager::new(platform.clone(), requests.clone());

        let first_params = params();
        let second_params = params();
        let (first, second) = tokio::join!(
            first_page.ensure_subscription(&first_params),
            second_page.ensure_subscription(&second_params),
        );

        assert!(first && second);
        assert_eq!(platform.subscriptions_created(), 1);
        let endpoints: Vec<_> = requests
            .requests()
            .into_iter()
            .filter(|r| r.path == "/api/v1/push/subscribe")
            .filter_map(|r| r.body)
            .map(|body| body["subscription"]["endpoint"].clone())
            .collect();
        assert_eq!(endpoints.len(), 2);
        assert!(endpoints.iter().all(|e| e == platform.endpoint()));
    }

    #[tokio::test]
    async fn test_permission_denied_is_false() {
        let platform = Arc::new(FakePushPlatform::with_permission(PermissionState::Denied));
        let requests = happy_server();
        let manager = SubscriptionManager::new(platform.clone(), requests.clone());

        assert!(!manager.ensure_subscription(&params()).await);
        assert!(platform.registered_scripts().is_empty());
        assert!(requests.requests().is_empty());
    }

    #[tokio::test]
    async fn test_dismissed_prompt_is_false() {
        let platform = Arc::new(FakePushPlatform::with_permission(PermissionState::Default));
        let manager = SubscriptionManager::new(platform, happy_server());

        assert!(!manager.ensure_subscription(&params()).await);
    }

    #[tokio::test]
    async fn test_unsupported_platform_is_false() {
        let platform = Arc::new(FakePushPlatform::granting().with_capabilities(PlatformCapabilities {
            background_worker: true,
            push_manager: false,
        }));
        let manager = SubscriptionManager::new(platform.clone(), happy_server());

        assert!(!manager.ensure_subscription(&params()).await);
        assert_eq!(platform.permission_prompts(), 0);
    }

    #[tokio::test]
    async fn test_key_endpoint_failure_is_false() {
        let platform = Arc::new(FakePushPlatform::granting());
        let requests = Arc::new(FakeRequestLayer::new());
        requests.respond("/api/v1/push/vapid-public-key", ApiResponse::new(503, "{}"));
        let manager = SubscriptionManager::new(platform.clone(), requests.clone());

        assert!(!manager.ensure_subscription(&params()).await);
        assert_eq!(platform.subscribe_calls(), 0);
        assert!(requests.last_body("/api/v1/push/subscribe").is_none());
    }

    #[tokio::test]
    async fn test_server_rejection_is_false() {
        let platform = Arc::new(FakePushPlatform::granting());
        let requests = Arc::new(FakeRequestLayer::new());
        requests.respond("/api/v1/push/vapid-public-key", ApiResponse::new(200, r#"{"publicKey":"aGVsbG8"}"#));
        requests.respond("/api/v1/push/subscribe", ApiResponse::new(422, r#"{"detail":"invalid"}"#));
        let manager = SubscriptionManager::new(platform, requests);

        assert!(!manager.ensure_subscription(&params()).await);
    }

    #[tokio::test]
    async fn test_registration_failure_is_false() {
        let platform = Arc::new(FakePushPlatform::granting().failing_registration());
        let manager = SubscriptionManager::new(platform, happy_server()).with_worker_script("/sw.js");

        assert!(!manager.ensure_subscription(&params()).await);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let platform = Arc::new(FakePushPlatform::granting());
        let requests = happy_server();
        let manager = SubscriptionManager::new(platform.clone(), requests.clone());
        let subscription = platform.sample_subscription();

        assert!(manager.unsubscribe(&subscription).await);
        let body = requests.last_body("/api/v1/push/unsubscribe").expect("unsubscribe body");
        assert_eq!(body["endpoint"], subscription.endpoint);
    }
}
