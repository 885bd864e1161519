// src/models/queue.rs

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The booking a live status request is made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIdentity {
    pub booking_id: String,
    pub temple: String,
    pub queue_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl BookingIdentity {
    pub fn new(booking_id: impl Into<String>, temple: impl Into<String>, queue_number: i64) -> Self {
        Self {
            booking_id: booking_id.into(),
            temple: temple.into(),
            queue_number,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }
}

/// A queue position snapshot as returned by the live status endpoint.
///
/// `position <= total` is expected but not enforced; derived values clamp instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub booking_id: String,
    pub temple: String,
    pub position: i64,
    pub total: i64,
    pub movement_speed: String,
    pub estimated_entry_time: String,
    pub estimated_wait_minutes: i64,
    pub last_updated: String,
}

impl QueueSnapshot {
    pub fn speed(&self) -> MovementSpeed {
        MovementSpeed::classify(&self.movement_speed)
    }

    /// `None` when the server sent something that is not an RFC 3339 timestamp.
    pub fn last_updated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_updated)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementSpeed {
    Fast,
    Normal,
    Slow,
}

impl MovementSpeed {
    /// Case-insensitive substring match; anything unrecognised is `Normal`.
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("fast") {
            MovementSpeed::Fast
        } else if lowered.contains("slow") {
            MovementSpeed::Slow
        } else {
            MovementSpeed::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementSpeed::Fast => "fast",
            MovementSpeed::Normal => "normal",
            MovementSpeed::Slow => "slow",
        }
    }
}

impl fmt::Display for MovementSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display-ready values derived from a [`QueueSnapshot`]. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySignals {
    pub position: i64,
    pub progress_percent: u8,
    pub is_near_entry: bool,
    pub speed_label: MovementSpeed,
    pub eta_display: String,
    pub estimated_wait_minutes: i64,
    pub segment_count: usize,
    pub filled_segments: usize,
}
