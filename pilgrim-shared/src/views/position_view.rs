use std::sync::Arc;

use crate::models::queue::{DisplaySignals, MovementSpeed, QueueSnapshot};
use crate::utilities::config::DEFAULT_PROGRESS_SEGMENTS;
use crate::utilities::locale::{format_short_time, LocaleResolver};

/// Positions at or below this are "get ready".
pub const NEAR_ENTRY_THRESHOLD: i64 = 10;

/// Share of the queue already ahead of the booking, in whole percent.
///
/// Total over all inputs: `total <= 0` counts as 1 and the result is clamped to [0, 100].
pub fn progress_percent(position: i64, total: i64) -> u8 {
    let served = (total as f64) - (position as f64);
    let ratio = served / (total.max(1) as f64);
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn is_near_entry(position: i64) -> bool {
    position <= NEAR_ENTRY_THRESHOLD
}

/// Number of lit buckets out of `segment_count` for the step indicator.
pub fn filled_segments(progress_percent: u8, segment_count: usize) -> usize {
    let percent = progress_percent.min(100) as f64;
    let filled = (segment_count as f64 * percent / 100.0).round() as usize;
    filled.min(segment_count)
}

/// Turns raw snapshots into [`DisplaySignals`]. Pure apart from reading the locale.
#[derive(Clone)]
pub struct PositionView {
    segment_count: usize,
    locale: Arc<dyn LocaleResolver>,
}

impl PositionView {
    pub fn new(locale: Arc<dyn LocaleResolver>) -> Self {
        Self::with_segments(locale, DEFAULT_PROGRESS_SEGMENTS)
    }

    pub fn with_segments(locale: Arc<dyn LocaleResolver>, segment_count: usize) -> Self {
        Self { segment_count, locale }
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn derive_signals(&self, snapshot: &QueueSnapshot) -> DisplaySignals {
        let progress = progress_percent(snapshot.position, snapshot.total);

        DisplaySignals {
            position: snapshot.position,
            progress_percent: progress,
            is_near_entry: is_near_entry(snapshot.position),
            speed_label: MovementSpeed::classify(&snapshot.movement_speed),
            eta_display: format_short_time(&snapshot.estimated_entry_time, self.locale.as_ref()),
            estimated_wait_minutes: snapshot.estimated_wait_minutes,
            segment_count: self.segment_count,
            filled_segments: filled_segments(progress, self.segment_count),
        }
    }
}
