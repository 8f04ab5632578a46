//! Advisory per-question countdown
//!
//! The countdown only informs clients. Whether an answer is accepted
//! depends on which item is current, never on elapsed time.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::content::ItemId;

/// Rounds up to whole seconds, so a started second still counts
fn whole_seconds(duration: Duration) -> Duration {
    let extra = u64::from(duration.subsec_nanos() > 0);
    Duration::from_secs(duration.as_secs() + extra)
}

/// A running countdown for one item
///
/// The ticking task is aborted when the countdown is dropped.
#[derive(Debug)]
pub struct Countdown {
    item: ItemId,
    deadline: Instant,
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Spawns a task calling `on_tick` every `interval` until time runs out
    ///
    /// The last call reports zero remaining. Must be called from within a
    /// tokio runtime.
    pub fn start<F>(item: ItemId, duration: Duration, interval: Duration, on_tick: F) -> Self
    where
        F: Fn(&ItemId, Duration) + Send + 'static,
    {
        let deadline = Instant::now() + duration;
        let handle = tokio::spawn({
            let item = item.clone();
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // first tick completes immediately
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let remaining = whole_seconds(deadline.saturating_duration_since(Instant::now()));
                    on_tick(&item, remaining);
                    if remaining.is_zero() {
                        break;
                    }
                }
            }
        });
        Self {
            item,
            deadline,
            handle,
        }
    }

    /// The item being counted down
    pub fn item(&self) -> &ItemId {
        &self.item
    }

    /// Time left, rounded up to whole seconds
    pub fn remaining(&self) -> Duration {
        whole_seconds(self.deadline.saturating_duration_since(Instant::now()))
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
