//! Global pacing between forum requests
//!
//! One pacer is shared by the listing walk and every worker, so the
//! configured delay holds across the whole run and not per worker. Slots
//! space request starts.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Hands out request slots at least `interval` apart
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits for the next free slot and reserves it
    ///
    /// The first call returns immediately. Callers queue on the lock, so
    /// slots are granted in arrival order.
    pub async fn wait(&self) {
        if self.interval.is_zero() {
            return;
        }

        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();

        let granted = match *next_slot {
            Some(slot) if slot > now => {
                tokio::time::sleep_until(slot).await;
                slot
            }
            _ => now,
        };

        *next_slot = Some(granted + self.interval);
    }
}
