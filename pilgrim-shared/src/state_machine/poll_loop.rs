use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::models::queue::{BookingIdentity, DisplaySignals, QueueSnapshot};
use crate::services::status_fetcher::StatusSource;
use crate::utilities::config::DEFAULT_POLL_INTERVAL_SECS;
use crate::views::position_view::PositionView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Settled,
    Stopped,
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated,
    /// The fetch failed; the last good snapshot is still current.
    Retained,
    /// Not started, stopped, or a fetch was already in flight.
    Skipped,
    /// The loop was stopped or restarted while this fetch was in flight.
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalUpdate {
    pub snapshot: QueueSnapshot,
    pub signals: DisplaySignals,
}

/// A fetch whose completion is still awaited.
struct Flight {
    ticket: u64,
    /// Run the result belongs to. Moves forward when a restart adopts the fetch.
    generation: u64,
    identity: BookingIdentity,
}

struct Cycle {
    state: PollState,
    identity: Option<BookingIdentity>,
    generation: u64,
    next_ticket: u64,
    in_flight: Vec<Flight>,
    latest: Option<SignalUpdate>,
}

struct Shared {
    source: Arc<dyn StatusSource>,
    view: PositionView,
    cycle: Mutex<Cycle>,
    updates: watch::Sender<Option<SignalUpdate>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Cycle> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn tick(&self) -> TickOutcome {
        let (identity, ticket) = {
            let mut cycle = self.lock();
            let identity = match (&cycle.identity, cycle.state) {
                (_, PollState::Stopped) | (None, _) => return TickOutcome::Skipped,
                (Some(identity), _) => identity.clone(),
            };
            // A fetch left over from an earlier run for another booking does not block this one
            if cycle.in_flight.iter().any(|flight| flight.generation == cycle.generation) {
                debug!(booking_id = %identity.booking_id, "⏭️ Fetch still in flight, dropping tick");
                return TickOutcome::Skipped;
            }
            cycle.next_ticket += 1;
            let ticket = cycle.next_ticket;
            let generation = cycle.generation;
            cycle.in_flight.push(Flight {
                ticket,
                generation,
                identity: identity.clone(),
            });
            cycle.state = PollState::Fetching;
            (identity, ticket)
        };

        let result = self.source.fetch_status(&identity).await;

        let mut cycle = self.lock();
        let index = cycle.in_flight.iter().position(|flight| flight.ticket == ticket);
        let flight_generation = index.map(|i| cycle.in_flight.swap_remove(i).generation);
        let current = flight_generation == Some(cycle.generation);
        if !current || cycle.state == PollState::Stopped {
            debug!(booking_id = %identity.booking_id, "🗑️ Discarding result from a previous run");
            return TickOutcome::Discarded;
        }
        cycle.state = PollState::Settled;

        match result {
            Ok(snapshot) => {
                let signals = self.view.derive_signals(&snapshot);
                debug!(
                    booking_id = %snapshot.booking_id,
                    position = snapshot.position,
                    progress = signals.progress_percent,
                    "📍 Queue snapshot settled"
                );
                let update = SignalUpdate { snapshot, signals };
                cycle.latest = Some(update.clone());
                self.updates.send_replace(Some(update));
                TickOutcome::Updated
            }
            Err(e) => {
                warn!(booking_id = %identity.booking_id, error = %e, "Queue status fetch failed, keeping last snapshot");
                TickOutcome::Retained
            }
        }
    }
}

struct Ticker {
    shutdown: Arc<Notify>,
}

/// Refreshes a booking's queue position on a fixed cadence.
///
/// At most one fetch is in flight per booking. A tick that fires while a fetch
/// is outstanding is dropped, not queued. Failed fetches keep the previous
/// snapshot. Results that arrive after [`PollLoop::stop`] or after a restart
/// with another identity are thrown away; restarting the same booking adopts
/// its outstanding fetch instead.
pub struct PollLoop {
    shared: Arc<Shared>,
    interval: Duration,
    ticker: Mutex<Option<Ticker>>,
}

impl PollLoop {
    pub fn new(source: Arc<dyn StatusSource>, view: PositionView) -> Self {
        Self::with_interval(source, view, Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn with_interval(source: Arc<dyn StatusSource>, view: PositionView, interval: Duration) -> Self {
        let (updates, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                source,
                view,
                cycle: Mutex::new(Cycle {
                    state: PollState::Idle,
                    identity: None,
                    generation: 0,
                    next_ticket: 0,
                    in_flight: Vec::new(),
                    latest: None,
                }),
                updates,
            }),
            interval,
            ticker: Mutex::new(None),
        }
    }

    /// Begins polling `identity`, fetching immediately and then every interval.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, identity: BookingIdentity) {
        self.halt_ticker();
        {
            let mut cycle = self.shared.lock();
            let same_booking = cycle.identity.as_ref() == Some(&identity);
            if !same_booking && cycle.latest.take().is_some() {
                self.shared.updates.send_replace(None);
            }
            info!(booking_id = %identity.booking_id, temple = %identity.temple, "▶️ Starting queue polling");
            cycle.generation += 1;
            let generation = cycle.generation;

            // A fetch already under way for this booking becomes the new run's first fetch
            let adopted = match cycle.in_flight.iter_mut().find(|flight| flight.identity == identity) {
                Some(flight) => {
                    flight.generation = generation;
                    true
                }
                None => false,
            };
            cycle.state = if adopted { PollState::Fetching } else { PollState::Idle };
            cycle.identity = Some(identity);
        }
        self.spawn_ticker();
    }

    /// Cancels the timer. Any fetch still in flight completes but is ignored.
    pub fn stop(&self) {
        self.halt_ticker();
        let mut cycle = self.shared.lock();
        if cycle.state != PollState::Stopped {
            info!("⏹️ Queue polling stopped");
        }
        cycle.state = PollState::Stopped;
    }

    /// Runs one fetch cycle now, subject to the same single-flight rule as a tick.
    pub async fn refresh(&self) -> TickOutcome {
        self.shared.tick().await
    }

    pub fn state(&self) -> PollState {
        self.shared.lock().state
    }

    pub fn current_snapshot(&self) -> Option<QueueSnapshot> {
        self.shared.lock().latest.as_ref().map(|u| u.snapshot.clone())
    }

    pub fn current_signals(&self) -> Option<DisplaySignals> {
        self.shared.lock().latest.as_ref().map(|u| u.signals.clone())
    }

    /// Receives every successful update. Starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Option<SignalUpdate>> {
        self.shared.updates.subscribe()
    }

    fn spawn_ticker(&self) {
        let shared = self.shared.clone();
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();
        let period = self.interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        // Fetch off the timer task so a slow request cannot delay the next tick
                        let shared = shared.clone();
                        tokio::spawn(async move { shared.tick().await });
                    }
                    _ = signal.notified() => break,
                }
            }
        });

        *self.ticker.lock().unwrap_or_else(PoisonError::into_inner) = Some(Ticker { shutdown });
    }

    fn halt_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().unwrap_or_else(PoisonError::into_inner).take() {
            ticker.shutdown.notify_one();
        }
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.halt_ticker();
    }
}
