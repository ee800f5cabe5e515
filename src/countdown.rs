use crate::models::OfferId;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default time a driver has to answer an offer
pub const DEFAULT_COUNTDOWN_SECS: u64 = 10;

/// Shortest countdown the widget accepts
pub const MIN_COUNTDOWN_SECS: u64 = 1;

/// Longest countdown the widget accepts, keeps the deadline within `Instant` range
pub const MAX_COUNTDOWN_SECS: u64 = 24 * 60 * 60;

/// Snapshot of a countdown, both values taken from the same clock read
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountdownView {
    /// Whole seconds left, rounded up
    pub remaining_secs: u64,
    /// 1.0 when mounted, 0.0 at expiry, linear in between
    pub remaining_fraction: f64,
}

/// Single monotonic countdown shared by the numeric timer and the progress bar.
///
/// One instance lives as long as the feed. Mounting a new offer calls
/// [`Countdown::reset`] with the offer id instead of building a new timer.
#[derive(Debug, Clone)]
pub struct Countdown {
    total: Duration,
    started_at: Instant,
}

impl Countdown {
    /// Create a countdown of `secs` whole seconds, clamped to
    /// `MIN_COUNTDOWN_SECS..=MAX_COUNTDOWN_SECS`
    pub fn from_secs(secs: u64) -> Self {
        let secs = if secs < MIN_COUNTDOWN_SECS {
            warn!(
                "Countdown of {}s is too short, clamping to {}s",
                secs, MIN_COUNTDOWN_SECS
            );
            MIN_COUNTDOWN_SECS
        } else if secs > MAX_COUNTDOWN_SECS {
            warn!(
                "Countdown of {}s is too long, clamping to {}s",
                secs, MAX_COUNTDOWN_SECS
            );
            MAX_COUNTDOWN_SECS
        } else {
            secs
        };

        Self {
            total: Duration::from_secs(secs),
            started_at: Instant::now(),
        }
    }

    /// Restart from the full duration for a newly mounted offer
    pub fn reset(&mut self, offer_id: OfferId) {
        debug!("Countdown reset for offer {}", offer_id);
        self.started_at = Instant::now();
    }

    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Instant at which the remaining time reaches zero
    pub fn deadline(&self) -> Instant {
        self.started_at + self.total
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started_at)
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }

    pub fn view_at(&self, now: Instant) -> CountdownView {
        let remaining = self.remaining_at(now);
        let millis = remaining.as_millis() as u64;

        CountdownView {
            remaining_secs: millis.div_ceil(1000),
            remaining_fraction: remaining.as_secs_f64() / self.total.as_secs_f64(),
        }
    }

    pub fn view(&self) -> CountdownView {
        self.view_at(Instant::now())
    }
}
