use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Temple Crowd Management";
pub const FALLBACK_NOTIFICATION_TITLE: &str = "Notification";
pub const DEFAULT_NOTIFICATION_URL: &str = "/";

/// A delivered push, normalised and ready to show.
///
/// `data` always holds a `url` entry unless the sender's own `data` replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub data: Map<String, Value>,
}

impl NotificationPayload {
    pub fn url(&self) -> &str {
        url_from_data(&self.data)
    }

    pub fn to_ref(&self) -> NotificationRef {
        NotificationRef {
            tag: self.tag.clone(),
            data: self.data.clone(),
        }
    }
}

/// Handle to a notification already on screen, as passed back on a click.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationRef {
    pub tag: Option<String>,
    pub data: Map<String, Value>,
}

impl NotificationRef {
    pub fn url(&self) -> &str {
        url_from_data(&self.data)
    }
}

fn url_from_data(data: &Map<String, Value>) -> &str {
    data.get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .unwrap_or(DEFAULT_NOTIFICATION_URL)
}

/// An open application window known to the background context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
    pub focusable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// Raw push bytes; `None` when the push carried no data.
    Delivered(Option<Vec<u8>>),
    Clicked(NotificationRef),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeAction {
    Show(NotificationPayload),
    /// Close `notification`, then focus an open window or open `url`.
    Activate { notification: NotificationRef, url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOutcome {
    Shown,
    Focused(String),
    Opened(String),
    /// No window to focus and the platform cannot open one.
    NoTarget,
}
