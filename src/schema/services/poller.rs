//! Bounded waiting with exponential backoff.
//!
//! The backend processes schema objects asynchronously. [`ConvergencePoller`]
//! re-evaluates a condition until it reports success, a terminal failure is
//! observed, or the time budget runs out. Sleep intervals grow geometrically
//! from `start_delay` by `factor` and are capped at `max_delay`; no jitter is
//! applied.

use super::ReconcileError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_START_DELAY: Duration = Duration::from_millis(200);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_FACTOR: f64 = 1.35;
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Errors returned while validating poll settings.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PollSettingsError {
    /// The timeout is zero.
    #[error("poll timeout must be greater than zero")]
    ZeroTimeout,

    /// The start delay is zero.
    #[error("poll start delay must be greater than zero")]
    ZeroStartDelay,

    /// The start delay exceeds the maximum delay.
    #[error("poll start delay {start:?} exceeds maximum delay {max:?}")]
    StartAboveMax {
        /// Configured start delay.
        start: Duration,
        /// Configured maximum delay.
        max: Duration,
    },

    /// The growth factor is below one or not finite.
    #[error("poll backoff factor must be a finite number >= 1, got {0}")]
    InvalidFactor(f64),
}

/// Timing parameters for convergence polling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    timeout: Duration,
    start_delay: Duration,
    max_delay: Duration,
    factor: f64,
    settle_delay: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            start_delay: DEFAULT_START_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: DEFAULT_FACTOR,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl PollSettings {
    /// Sets the total wait budget per object.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the first sleep interval and the sleep ceiling.
    #[must_use]
    pub const fn with_delays(mut self, start_delay: Duration, max_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self.max_delay = max_delay;
        self
    }

    /// Sets the geometric growth factor between sleeps.
    #[must_use]
    pub const fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Sets the pause applied after an object converges.
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Returns the total wait budget per object.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the first sleep interval.
    #[must_use]
    pub const fn start_delay(&self) -> Duration {
        self.start_delay
    }

    /// Returns the sleep ceiling.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Returns the growth factor.
    #[must_use]
    pub const fn factor(&self) -> f64 {
        self.factor
    }

    /// Returns the post-convergence settle delay.
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Checks that the settings describe a terminating, growing schedule.
    ///
    /// # Errors
    ///
    /// Returns [`PollSettingsError`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), PollSettingsError> {
        if self.timeout.is_zero() {
            return Err(PollSettingsError::ZeroTimeout);
        }
        if self.start_delay.is_zero() {
            return Err(PollSettingsError::ZeroStartDelay);
        }
        if self.start_delay > self.max_delay {
            return Err(PollSettingsError::StartAboveMax {
                start: self.start_delay,
                max: self.max_delay,
            });
        }
        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(PollSettingsError::InvalidFactor(self.factor));
        }
        Ok(())
    }

    /// Returns the sleep schedule described by these settings.
    ///
    /// An invalid factor falls back to the default factor.
    #[must_use]
    pub fn backoff(&self) -> BackoffSchedule {
        let factor = if self.factor.is_finite() && self.factor >= 1.0 {
            self.factor
        } else {
            DEFAULT_FACTOR
        };
        BackoffSchedule {
            next: self.start_delay.min(self.max_delay),
            max: self.max_delay,
            factor,
        }
    }
}

/// Infinite, non-decreasing sequence of sleep intervals.
///
/// The nth interval is `min(start × factor^(n-1), max)`.
#[derive(Debug, Clone)]
pub struct BackoffSchedule {
    next: Duration,
    max: Duration,
    factor: f64,
}

impl Iterator for BackoffSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        if current < self.max {
            self.next = current.mul_f64(self.factor).min(self.max);
        }
        Some(current)
    }
}

/// Outcome of one failed condition evaluation.
#[derive(Debug)]
pub enum PollFailure {
    /// Recorded as the last error; polling continues.
    Transient(String),
    /// Returned immediately; polling stops.
    Terminal(ReconcileError),
}

/// Re-evaluates conditions until they hold or the budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConvergencePoller {
    settings: PollSettings,
}

impl ConvergencePoller {
    /// Creates a poller with the given settings.
    #[must_use]
    pub const fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    /// Returns the poller settings.
    #[must_use]
    pub const fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Sleeps for the configured settle delay.
    pub async fn settle(&self) {
        if !self.settings.settle_delay.is_zero() {
            sleep(self.settings.settle_delay).await;
        }
    }

    /// Polls `condition` until it yields a value.
    ///
    /// Transient failures are remembered and polling continues; a terminal
    /// failure is returned at once. Every sleep is clamped to the remaining
    /// budget, so the wait never overruns the timeout.
    ///
    /// # Errors
    ///
    /// Returns the terminal [`ReconcileError`] produced by `condition`, or
    /// [`ReconcileError::ConvergenceTimeout`] carrying the last transient
    /// error once the budget is spent.
    pub async fn wait_until<T, F, Fut>(&self, label: &str, mut condition: F) -> Result<T, ReconcileError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, PollFailure>>,
    {
        let started = Instant::now();
        let mut delays = self.settings.backoff();
        let mut last_error: Option<String> = None;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            match condition().await {
                Ok(Some(value)) => {
                    debug!(label, attempts, "converged");
                    return Ok(value);
                }
                Ok(None) => {}
                Err(PollFailure::Transient(message)) => {
                    debug!(label, attempts, error = %message, "transient error while polling");
                    last_error = Some(message);
                }
                Err(PollFailure::Terminal(err)) => return Err(err),
            }

            let elapsed = started.elapsed();
            let Some(remaining) = self
                .settings
                .timeout
                .checked_sub(elapsed)
                .filter(|remaining| !remaining.is_zero())
            else {
                warn!(label, attempts, elapsed = ?elapsed, "convergence timed out");
                return Err(ReconcileError::ConvergenceTimeout {
                    label: label.to_owned(),
                    elapsed,
                    last_error,
                });
            };

            let delay = delays
                .next()
                .unwrap_or(self.settings.max_delay)
                .min(remaining);
            sleep(delay).await;
        }
    }
}
