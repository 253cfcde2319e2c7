//! Circuit breaker for dependency protection.
//!
//! # States
//! - Closed: calls run through the retrier
//! - Open: dependency assumed down, calls fail fast until `reopen_at`
//!
//! # State Transitions
//! ```text
//! Closed → Open:   retrier exhausted its budget; flags for the category OFF
//! Open → Open:     now < reopen_at; fail fast, no flag change
//! Open → Closed:   now >= reopen_at; flags ON, then the call is attempted
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency category, shared through `Arc`
//! - Flag effects are injected and best-effort: their failures are logged
//!   and never change the outcome returned to the caller
//! - The state lock is never held across an await; concurrent failures may
//!   race on `reopen_at` and the last write wins

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::schema::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::backoff::{PolicyError, RetryPolicy};
use crate::resilience::error::{BoxError, FailureCategory, ResilienceError};
use crate::resilience::retries::Retrier;

/// Side effects run when a breaker changes state.
///
/// Implemented by the service registry; the breaker only knows its category.
#[async_trait]
pub trait FlagEffects: Send + Sync {
    /// Mark every feature behind `category` available again.
    async fn turn_on(&self, category: FailureCategory) -> Result<(), BoxError>;

    /// Mark every feature behind `category` unavailable.
    async fn turn_off(&self, category: FailureCategory) -> Result<(), BoxError>;
}

/// Effects for breakers that guard nothing user-visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFlagEffects;

#[async_trait]
impl FlagEffects for NoFlagEffects {
    async fn turn_on(&self, _category: FailureCategory) -> Result<(), BoxError> {
        Ok(())
    }

    async fn turn_off(&self, _category: FailureCategory) -> Result<(), BoxError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
}

/// Point-in-time view of a breaker, for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub category: String,
    pub state: BreakerState,
    /// Milliseconds until a probe is allowed; `None` while closed.
    pub reopen_in_ms: Option<u64>,
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    reopen_at: Option<Instant>,
}

enum Admission {
    Closed,
    Probe,
}

#[derive(Clone, Copy)]
enum Effect {
    On,
    Off,
}

/// Retrier guarded by an open/closed breaker for one failure category.
pub struct CircuitBreaker {
    category: FailureCategory,
    retrier: Retrier,
    cooldown: Duration,
    effects: Arc<dyn FlagEffects>,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("category", &self.category)
            .field("cooldown", &self.cooldown)
            .field("inner", &self.inner)
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(
        category: FailureCategory,
        policy: RetryPolicy,
        cooldown: Duration,
        effects: Arc<dyn FlagEffects>,
    ) -> Self {
        Self {
            category,
            retrier: Retrier::new(policy).with_category(category),
            cooldown,
            effects,
            inner: Mutex::new(Inner { state: BreakerState::Closed, reopen_at: None }),
        }
    }

    /// Create a breaker from a `[breakers.<category>]` config section.
    pub fn from_config(
        category: FailureCategory,
        config: &BreakerConfig,
        effects: Arc<dyn FlagEffects>,
    ) -> Result<Self, PolicyError> {
        let policy = RetryPolicy::from_config(config)?;
        Ok(Self::new(category, policy, Duration::from_millis(config.cooldown_ms), effects))
    }

    pub fn category(&self) -> FailureCategory {
        self.category
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.retrier.policy()
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Earliest instant a probe is let through; only set while open.
    pub fn reopen_at(&self) -> Option<Instant> {
        self.lock().reopen_at
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let now = Instant::now();
        BreakerSnapshot {
            category: self.category.to_string(),
            state: inner.state,
            reopen_in_ms: inner
                .reopen_at
                .map(|at| at.saturating_duration_since(now).as_millis() as u64),
        }
    }

    /// Run `op` through the breaker.
    ///
    /// Fails fast with [`ResilienceError::CircuitOpen`] while cooling down.
    /// Otherwise the retrier runs the operation; exhausting it opens the
    /// breaker and the retrier's error is returned unchanged.
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> Result<T, ResilienceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        if let Admission::Probe = self.admit()? {
            tracing::info!(category = %self.category, "Circuit breaker closed");
            metrics::record_breaker_transition(self.category, BreakerState::Closed);
            self.apply(Effect::On).await;
        }

        match self.retrier.execute(op).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if self.trip() {
                    tracing::warn!(
                        category = %self.category,
                        cooldown_ms = self.cooldown.as_millis() as u64,
                        error = %err,
                        "Circuit breaker OPEN"
                    );
                    metrics::record_breaker_transition(self.category, BreakerState::Open);
                    self.apply(Effect::Off).await;
                }
                Err(err)
            }
        }
    }

    fn admit(&self) -> Result<Admission, ResilienceError> {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => Ok(Admission::Closed),
            BreakerState::Open => {
                let cooling = inner.reopen_at.is_some_and(|at| Instant::now() < at);
                if cooling {
                    tracing::debug!(category = %self.category, "Circuit open, failing fast");
                    metrics::record_breaker_rejection(self.category);
                    return Err(ResilienceError::CircuitOpen { category: self.category });
                }
                inner.state = BreakerState::Closed;
                inner.reopen_at = None;
                Ok(Admission::Probe)
            }
        }
    }

    /// Open the breaker. Returns true when this call did the Closed → Open
    /// transition, so flag effects run once per trip.
    fn trip(&self) -> bool {
        let mut inner = self.lock();
        let was_closed = inner.state == BreakerState::Closed;
        inner.state = BreakerState::Open;
        inner.reopen_at = Some(Instant::now() + self.cooldown);
        was_closed
    }

    async fn apply(&self, effect: Effect) {
        let result = match effect {
            Effect::On => self.effects.turn_on(self.category).await,
            Effect::Off => self.effects.turn_off(self.category).await,
        };
        if let Err(e) = result {
            tracing::warn!(category = %self.category, error = %e, "Flag effect failed, ignoring");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
