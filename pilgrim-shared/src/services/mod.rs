pub mod notification_bridge;
pub mod push_key_exchange;
pub mod status_fetcher;
pub mod subscription_manager;
