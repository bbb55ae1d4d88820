//! Feed clock.
//! Nothing is written when an auction passes its end time; the ticker only wakes feed
//! subscriptions so they can re-derive liveness and re-sort.
// region:    --- Imports
use crate::feed::FeedSignal;
use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

// endregion: --- Imports

// region:    --- Feed Ticker
pub struct FeedTicker {
    signals: broadcast::Sender<FeedSignal>,
    period: Duration,
}

impl FeedTicker {
    pub fn new(signals: broadcast::Sender<FeedSignal>, period: Duration) -> Self {
        Self { signals, period }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                // No subscribers is the normal idle state.
                if self.signals.send(FeedSignal::Tick(Utc::now())).is_err() {
                    debug!("{:<12} --> tick with no subscribers", "Scheduler");
                }
            }
        })
    }
}
// endregion: --- Feed Ticker
