use std::sync::Arc;
use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use crate::models::errors::PushError;
use crate::models::push::VapidPublicKeyResponse;
use crate::utilities::config::push_path;
use crate::utilities::requests::{ApiRequest, RequestLayer};

// Browsers' atob ignores non-zero bits after the last full byte
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decodes an unpadded URL-safe base64 key into the raw bytes the push
/// subsystem expects: pad to a multiple of 4, map `-`/`_` to `+`/`/`, then
/// standard base64.
pub fn url_base64_to_bytes(encoded: &str) -> Result<Vec<u8>, PushError> {
    let padding = (4 - encoded.len() % 4) % 4;
    let standard: String = encoded
        .chars()
        .chain(std::iter::repeat('=').take(padding))
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    Ok(LENIENT_STANDARD.decode(standard)?)
}

pub struct PushKeyExchange {
    requests: Arc<dyn RequestLayer>,
}

impl PushKeyExchange {
    pub fn new(requests: Arc<dyn RequestLayer>) -> Self {
        Self { requests }
    }

    /// Fetches the server's VAPID public key and returns it decoded.
    pub async fn fetch_application_server_key(&self) -> Result<Vec<u8>, PushError> {
        let res = self.requests.send(ApiRequest::get(push_path("/vapid-public-key"))).await;
        if !res.is_success() {
            return Err(PushError::KeyUnavailable(format!("HTTP {}", res.status)));
        }

        let key = res
            .json::<VapidPublicKeyResponse>()
            .map_err(|e| PushError::KeyUnavailable(format!("Unreadable key response: {}", e)))?
            .public_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| PushError::KeyUnavailable("Response has no publicKey".to_string()))?;

        url_base64_to_bytes(&key)
    }
}
