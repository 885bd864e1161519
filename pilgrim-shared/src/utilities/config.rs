use dotenv::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use crate::models::errors::ConfigError;
use crate::models::queue::BookingIdentity;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_PROGRESS_SEGMENTS: usize = 20;
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_WORKER_SCRIPT: &str = "/service-worker.js";

/// Initialize dotenv (only needs to be called once at startup)
pub fn init() {
    if dotenv().is_ok() {
        log::info!("Loaded .env file");
    } else {
        log::info!("No .env file loaded, using process environment");
    }
}

/// Fetch environment variables by key
pub fn get_env_var(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnv(key.to_string()))
}

fn get_parsed_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Backend host without a trailing slash.
pub fn get_api_base_url() -> String {
    let base = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
    base.trim_end_matches('/').to_string()
}

pub fn get_poll_interval() -> Result<Duration, ConfigError> {
    let secs = get_parsed_or("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "POLL_INTERVAL_SECS".to_string(),
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

pub fn get_progress_segments() -> Result<usize, ConfigError> {
    get_parsed_or("PROGRESS_SEGMENTS", DEFAULT_PROGRESS_SEGMENTS)
}

pub fn get_locale() -> String {
    env::var("APP_LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string())
}

//Watcher identity
pub fn get_booking_identity() -> Result<BookingIdentity, ConfigError> {
    let booking_id = get_env_var("BOOKING_ID")?;
    let temple = get_env_var("BOOKING_TEMPLE")?;
    let raw_number = get_env_var("BOOKING_QUEUE_NUMBER")?;
    let queue_number: i64 = raw_number.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: "BOOKING_QUEUE_NUMBER".to_string(),
        value: raw_number.clone(),
    })?;

    let identity = BookingIdentity::new(booking_id, temple, queue_number);
    Ok(match env::var("BOOKING_CREATED_AT") {
        Ok(created_at) if !created_at.is_empty() => identity.with_created_at(created_at),
        _ => identity,
    })
}

const API_PREFIX: &str = "/api/v1";

fn area_path(area: &str, p: &str) -> String {
    if p.is_empty() {
        format!("{}/{}", API_PREFIX, area)
    } else if p.starts_with('/') {
        format!("{}/{}{}", API_PREFIX, area, p)
    } else {
        format!("{}/{}/{}", API_PREFIX, area, p)
    }
}

pub fn live_path(p: &str) -> String {
    area_path("live", p)
}

pub fn push_path(p: &str) -> String {
    area_path("push", p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(live_path("/queue/status"), "/api/v1/live/queue/status");
        assert_eq!(push_path("vapid-public-key"), "/api/v1/push/vapid-public-key");
        assert_eq!(push_path(""), "/api/v1/push");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let err = get_env_var("PILGRIM_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(ref key) if key == "PILGRIM_TEST_SURELY_UNSET_VARIABLE"));
    }
}
