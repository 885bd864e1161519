use serde_json::{json, Map, Value};
use log::Level;

/// Logs `event` plus `fields` as a single JSON line at `level`.
pub fn log_event(level: Level, event: &str, fields: Map<String, Value>) {
    let mut line = Map::new();
    line.insert("event".to_string(), json!(event));
    line.extend(fields);
    log::log!(level, "{}", Value::Object(line));
}

pub fn log_info(event: &str, message: &str) {
    log_event(Level::Info, event, single("message", message));
}

pub fn log_warn(event: &str, message: &str) {
    log_event(Level::Warn, event, single("message", message));
}

fn single(key: &str, value: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(key.to_string(), json!(value));
    fields
}
