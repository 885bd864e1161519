use chrono::{DateTime, Utc};
use pilgrim_shared::state_machine::poll_loop::SignalUpdate;
use tracing::{info, warn};

/// Step indicator, e.g. `[#####-----]`.
pub fn render_segments(filled: usize, total: usize) -> String {
    let filled = filled.min(total);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(total - filled))
}

/// Seconds since the server produced the snapshot, if it sent a timestamp.
pub fn staleness_secs(update: &SignalUpdate, now: DateTime<Utc>) -> Option<i64> {
    update
        .snapshot
        .last_updated_at()
        .map(|at| (now - at).num_seconds().max(0))
}

pub fn report(update: &SignalUpdate) {
    let signals = &update.signals;
    let stale = staleness_secs(update, Utc::now());

    info!(
        booking_id = %update.snapshot.booking_id,
        position = signals.position,
        total = update.snapshot.total,
        speed = %signals.speed_label,
        eta = %signals.eta_display,
        wait_minutes = signals.estimated_wait_minutes,
        stale_secs = ?stale,
        "📊 {} {}%",
        render_segments(signals.filled_segments, signals.segment_count),
        signals.progress_percent
    );

    if signals.is_near_entry {
        warn!(position = signals.position, "🔔 Get ready! Your entry is near.");
    }
}
