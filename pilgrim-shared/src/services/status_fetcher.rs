use std::sync::Arc;
use async_trait::async_trait;
use crate::models::errors::QueueStatusError;
use crate::models::queue::{BookingIdentity, QueueSnapshot};
use crate::utilities::config::live_path;
use crate::utilities::requests::{ApiRequest, RequestLayer};

/// Interface
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, identity: &BookingIdentity) -> Result<QueueSnapshot, QueueStatusError>;
}

/// One `POST /live/queue/status` per call. No retries, no caching.
pub struct QueueStatusService {
    requests: Arc<dyn RequestLayer>,
}

impl QueueStatusService {
    pub fn new(requests: Arc<dyn RequestLayer>) -> Self {
        Self { requests }
    }
}

#[async_trait]
impl StatusSource for QueueStatusService {
    async fn fetch_status(&self, identity: &BookingIdentity) -> Result<QueueSnapshot, QueueStatusError> {
        let request = ApiRequest::post(live_path("/queue/status"), identity)?;
        let res = self.requests.send(request).await;

        if !res.is_success() {
            log::warn!("Queue status for {} failed with {}", identity.booking_id, res.status);
            return Err(QueueStatusError::NetworkFailure(res.status));
        }

        let snapshot: QueueSnapshot = res.json()?;
        log::debug!(
            "Queue status for {}: position {} of {}",
            snapshot.booking_id,
            snapshot.position,
            snapshot.total
        );
        Ok(snapshot)
    }
}
