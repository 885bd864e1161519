use std::sync::Arc;
use serde_json::{json, Map, Value};
use crate::models::errors::PushError;
use crate::models::notifications::{
    BridgeAction, BridgeEvent, BridgeOutcome, NotificationPayload, NotificationRef,
    DEFAULT_NOTIFICATION_TITLE, DEFAULT_NOTIFICATION_URL, FALLBACK_NOTIFICATION_TITLE,
};
use crate::platform::notification_host::NotificationHost;
use crate::utilities::logging::log_warn;

/// Normalises an inbound push body. Never fails: anything that is not a JSON
/// object still yields something displayable.
pub fn parse_payload(raw: Option<&[u8]>) -> NotificationPayload {
    let fields = match raw {
        None => Map::new(),
        Some(bytes) => match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(_) => {
                let mut fallback = Map::new();
                fallback.insert("title".to_string(), json!(FALLBACK_NOTIFICATION_TITLE));
                fallback.insert("body".to_string(), json!(String::from_utf8_lossy(bytes)));
                fallback
            }
        },
    };

    // Scalars render as text; empty, zero, false and null fall back
    let text = |key: &str| match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    };

    // data = { url, ...payload.data }, so the sender's own data.url wins
    let mut data = Map::new();
    data.insert(
        "url".to_string(),
        json!(text("url").unwrap_or_else(|| DEFAULT_NOTIFICATION_URL.to_string())),
    );
    if let Some(Value::Object(extra)) = fields.get("data") {
        data.extend(extra.clone());
    }

    NotificationPayload {
        title: text("title").unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()),
        body: text("body").unwrap_or_default(),
        tag: text("tag"),
        data,
    }
}

/// Pure half of the bridge: what should happen for `event`.
pub fn dispatch(event: BridgeEvent) -> BridgeAction {
    match event {
        BridgeEvent::Delivered(raw) => BridgeAction::Show(parse_payload(raw.as_deref())),
        BridgeEvent::Clicked(notification) => {
            let url = notification.url().to_string();
            BridgeAction::Activate { notification, url }
        }
    }
}

/// Background-context handler for push deliveries and notification clicks.
pub struct NotificationBridge {
    host: Arc<dyn NotificationHost>,
}

impl NotificationBridge {
    pub fn new(host: Arc<dyn NotificationHost>) -> Self {
        Self { host }
    }

    /// Runs `event` to completion against the host. The returned future
    /// covers the whole unit of work, display or window activation included.
    pub async fn handle(&self, event: BridgeEvent) -> Result<BridgeOutcome, PushError> {
        match dispatch(event) {
            BridgeAction::Show(payload) => {
                self.host.show_notification(&payload).await?;
                log::info!("📲 Displayed '{}' ({})", payload.title, payload.tag.as_deref().unwrap_or("untagged"));
                Ok(BridgeOutcome::Shown)
            }
            BridgeAction::Activate { notification, url } => self.activate(&notification, &url).await,
        }
    }

    async fn activate(&self, notification: &NotificationRef, url: &str) -> Result<BridgeOutcome, PushError> {
        self.host.close_notification(notification);

        let clients = self.host.window_clients().await;
        if let Some(client) = clients.iter().find(|c| c.focusable) {
            self.host.focus(client).await?;
            return Ok(BridgeOutcome::Focused(client.id.clone()));
        }

        if !self.host.can_open_window() {
            log_warn("NotificationClick", "No window to focus and opening windows is unsupported");
            return Ok(BridgeOutcome::NoTarget);
        }

        self.host.open_window(url).await?;
        Ok(BridgeOutcome::Opened(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notifications::ClientWindow;
    use crate::utilities::test::{HostCall, RecordingNotificationHost};

    #[test]
    fn test_full_payload() {
        let raw = br#"{"title":"Temple Queue Update","body":"Token: 12","tag":"queue_update","url":"/live-tracking","data":{"queueNumber":12}}"#;
        let payload = parse_payload(Some(raw));

        assert_eq!(payload.title, "Temple Queue Update");
        assert_eq!(payload.body, "Token: 12");
        assert_eq!(payload.tag.as_deref(), Some("queue_update"));
        assert_eq!(payload.url(), "/live-tracking");
        assert_eq!(payload.data["queueNumber"], 12);
    }

    #[test]
    fn test_empty_push_uses_defaults() {
        let payload = parse_payload(None);
        assert_eq!(payload.title, DEFAULT_NOTIFICATION_TITLE);
        assert_eq!(payload.body, "");
        assert_eq!(payload.tag, None);
        assert_eq!(payload.url(), "/");
    }

    #[test]
    fn test_non_json_degrades_to_text() {
        let payload = parse_payload(Some(b"Your turn is near"));
        assert_eq!(payload.title, FALLBACK_NOTIFICATION_TITLE);
        assert_eq!(payload.body, "Your turn is near");
        assert_eq!(payload.url(), "/");
    }

    #[test]
    fn test_invalid_utf8_still_displayable() {
        let payload = parse_payload(Some(&[0xff, 0xfe, 0x41]));
        assert!(!payload.title.is_empty());
        assert!(payload.body.ends_with('A'));
    }

    #[test]
    fn test_non_object_json_behaves_like_empty() {
        let cases: [&[u8]; 4] = [b"42", b"null", br#""just text""#, b"[1,2]"];
        for raw in cases {
            let payload = parse_payload(Some(raw));
            assert_eq!(payload.title, DEFAULT_NOTIFICATION_TITLE);
            assert_eq!(payload.url(), "/");
        }
    }

    #[test]
    fn test_data_url_overrides_top_level_url() {
        let payload = parse_payload(Some(br#"{"url":"/a","data":{"url":"/b"}}"#));
        assert_eq!(payload.url(), "/b");
    }

    #[test]
    fn test_empty_title_falls_back() {
        let payload = parse_payload(Some(br#"{"title":"","body":"x"}"#));
        assert_eq!(payload.title, DEFAULT_NOTIFICATION_TITLE);
    }

    #[test]
    fn test_scalar_fields_render_as_text() {
        let payload = parse_payload(Some(br#"{"title":5,"body":true,"tag":12.5}"#));
        assert_eq!(payload.title, "5");
        assert_eq!(payload.body, "true");
        assert_eq!(payload.tag.as_deref(), Some("12.5"));

        let payload = parse_payload(Some(br#"{"title":0,"body":false}"#));
        assert_eq!(payload.title, DEFAULT_NOTIFICATION_TITLE);
        assert_eq!(payload.body, "");
    }

    #[test]
    fn test_dispatch_click_targets_data_url() {
        let mut data = Map::new();
        data.insert("url".to_string(), json!("/booking/BK-1/pass"));
        let action = dispatch(BridgeEvent::Clicked(NotificationRef { tag: None, data }));

        assert!(matches!(action, BridgeAction::Activate { ref url, .. } if url == "/booking/BK-1/pass"));
    }

    #[tokio::test]
    async fn test_delivery_shows_notification() {
        let host = Arc::new(RecordingNotificationHost::new(vec![]));
        let bridge = NotificationBridge::new(host.clone());

        let outcome = bridge.handle(BridgeEvent::Delivered(Some(b"not json".to_vec()))).await.unwrap();

        assert_eq!(outcome, BridgeOutcome::Shown);
        let shown = host.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].body, "not json");
    }

    #[tokio::test]
    async fn test_click_focuses_existing_window() {
        let host = Arc::new(RecordingNotificationHost::new(vec![
            ClientWindow { id: "w-hidden".into(), url: "/".into(), focusable: false },
            ClientWindow { id: "w-1".into(), url: "/live-tracking".into(), focusable: true },
            ClientWindow { id: "w-2".into(), url: "/profile".into(), focusable: true },
        ]));
        let bridge = NotificationBridge::new(host.clone());

        let outcome = bridge.handle(BridgeEvent::Clicked(parse_payload(None).to_ref())).await.unwrap();

        assert_eq!(outcome, BridgeOutcome::Focused("w-1".into()));
        assert_eq!(host.calls(), vec![HostCall::Close, HostCall::Focus("w-1".into())]);
    }

    #[tokio::test]
    async fn test_click_opens_window_when_none_open() {
        let host = Arc::new(RecordingNotificationHost::new(vec![]));
        let bridge = NotificationBridge::new(host.clone());
        let payload = parse_payload(Some(br#"{"url":"/live-tracking"}"#));

        let outcome = bridge.handle(BridgeEvent::Clicked(payload.to_ref())).await.unwrap();

        assert_eq!(outcome, BridgeOutcome::Opened("/live-tracking".into()));
        assert_eq!(host.calls(), vec![HostCall::Close, HostCall::Open("/live-tracking".into())]);
    }

    #[tokio::test]
    async fn test_click_without_window_support() {
        let host = Arc::new(RecordingNotificationHost::new(vec![]).without_open_window());
        let bridge = NotificationBridge::new(host.clone());

        let outcome = bridge.handle(BridgeEvent::Clicked(NotificationRef::default())).await.unwrap();

        assert_eq!(outcome, BridgeOutcome::NoTarget);
        assert_eq!(host.calls(), vec![HostCall::Close]);
    }
}
