pub mod notification_host;
pub mod push_platform;
