use std::sync::Arc;

use pilgrim_shared::services::status_fetcher::QueueStatusService;
use pilgrim_shared::state_machine::poll_loop::PollLoop;
use pilgrim_shared::utilities::config;
use pilgrim_shared::utilities::locale::SystemLocale;
use pilgrim_shared::utilities::requests::HttpRequestLayer;
use pilgrim_shared::views::position_view::PositionView;
use tokio::signal;
use tokio::sync::Notify;
use tracing::info;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use crate::errors::WatcherError;
use crate::report::report;

mod errors;
mod report;

#[tokio::main]
async fn main() -> Result<(), WatcherError> {
    // Set up structured logging; also routes `log` records from the shared crate
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish()
        .try_init()?;

    config::init();

    info!("🚀 Starting Pilgrim Watcher...");

    let identity = config::get_booking_identity()?;
    let interval = config::get_poll_interval()?;
    let segments = config::get_progress_segments()?;

    let requests = Arc::new(HttpRequestLayer::from_env());
    let source = Arc::new(QueueStatusService::new(requests));
    let view = PositionView::with_segments(Arc::new(SystemLocale), segments);
    let poll = PollLoop::with_interval(source, view, interval);

    let shutdown_notify = Arc::new(Notify::new());
    let report_handle = {
        let mut updates = poll.subscribe();
        let shutdown = shutdown_notify.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        if let Some(update) = updates.borrow_and_update().clone() {
                            report(&update);
                        }
                    }
                    _ = shutdown.notified() => break,
                }
            }
        })
    };

    info!(interval_secs = interval.as_secs(), "⏱️ Polling every {:?}", interval);
    poll.start(identity);

    // Graceful shutdown
    signal::ctrl_c().await?;
    info!("🛑 Received shutdown signal, terminating...");
    poll.stop();
    shutdown_notify.notify_one();

    let _ = report_handle.await;

    Ok(())
}
