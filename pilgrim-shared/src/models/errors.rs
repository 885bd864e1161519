use std::fmt;
use thiserror::Error;
use serde_json::Error as SerdeJsonError;
use crate::models::push::PermissionState;

#[derive(Debug, Error)]
pub enum QueueStatusError {
    #[error("Queue status request failed with HTTP {0}")]
    NetworkFailure(u16),

    #[error("Malformed queue status body: {0}")]
    MalformedResponse(String),
}

impl From<SerdeJsonError> for QueueStatusError {
    fn from(err: SerdeJsonError) -> Self {
        QueueStatusError::MalformedResponse(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    CapabilityUnsupported(String),
    PermissionDenied(PermissionState),
    KeyUnavailable(String),
    DecodeFailure(String),
    Registration(String),
    Subscription(String),
    Network(u16),
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::CapabilityUnsupported(what) => write!(f, "Platform does not support {}", what),
            PushError::PermissionDenied(state) => write!(f, "Notification permission not granted ({})", state),
            PushError::KeyUnavailable(msg) => write!(f, "Push public key unavailable: {}", msg),
            PushError::DecodeFailure(msg) => write!(f, "Push public key could not be decoded: {}", msg),
            PushError::Registration(msg) => write!(f, "Background worker registration failed: {}", msg),
            PushError::Subscription(msg) => write!(f, "Push subscription failed: {}", msg),
            PushError::Network(status) => write!(f, "Push request failed with HTTP {}", status),
        }
    }
}

impl std::error::Error for PushError {}

impl From<base64::DecodeError> for PushError {
    fn from(err: base64::DecodeError) -> Self {
        PushError::DecodeFailure(err.to_string())
    }
}

impl From<SerdeJsonError> for PushError {
    fn from(err: SerdeJsonError) -> Self {
        PushError::Subscription(format!("Serialization failed: {}", err))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} must be set")]
    MissingEnv(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
