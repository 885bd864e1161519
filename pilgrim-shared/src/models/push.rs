use std::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Default,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
            PermissionState::Default => write!(f, "default"),
        }
    }
}

/// What the host platform can do for background delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatformCapabilities {
    pub background_worker: bool,
    pub push_manager: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Platform-issued subscription, in the shape of its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(default)]
    pub expiration_time: Option<i64>,
    pub keys: SubscriptionKeys,
}

/// Options handed to the platform when a new subscription must be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    pub user_visible_only: bool,
    pub application_server_key: Vec<u8>,
}

impl SubscribeOptions {
    /// Silent pushes are never requested.
    pub fn user_visible(application_server_key: Vec<u8>) -> Self {
        Self {
            user_visible_only: true,
            application_server_key,
        }
    }
}

/// Booking context the user opts in with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeParams {
    pub booking_id: String,
    pub temple: String,
    pub queue_number: i64,
    pub time_slot: Option<String>,
    pub enabled: bool,
}

/// Body of `POST /push/subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscriptionRecord {
    pub subscription: PushSubscription,
    pub booking_id: String,
    pub temple: String,
    pub queue_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_slot: Option<String>,
    pub enabled: bool,
}

impl PushSubscriptionRecord {
    pub fn new(subscription: PushSubscription, params: &SubscribeParams) -> Self {
        Self {
            subscription,
            booking_id: params.booking_id.clone(),
            temple: params.temple.clone(),
            queue_number: params.queue_number,
            time_slot: params.time_slot.clone(),
            enabled: params.enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidPublicKeyResponse {
    pub public_key: Option<String>,
}
