use async_trait::async_trait;
use crate::models::errors::PushError;
use crate::models::notifications::{ClientWindow, NotificationPayload, NotificationRef};

/// What the background context can do with notifications and windows.
#[async_trait]
pub trait NotificationHost: Send + Sync {
    /// The context is kept alive until this resolves.
    async fn show_notification(&self, payload: &NotificationPayload) -> Result<(), PushError>;

    fn close_notification(&self, notification: &NotificationRef);

    /// Open windows, including ones not yet controlled by the worker.
    async fn window_clients(&self) -> Vec<ClientWindow>;

    async fn focus(&self, client: &ClientWindow) -> Result<(), PushError>;

    fn can_open_window(&self) -> bool;

    async fn open_window(&self, url: &str) -> Result<(), PushError>;
}
