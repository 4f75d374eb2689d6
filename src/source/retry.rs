//! Retry-with-backoff at the I/O boundary. The core never retries.

use super::TimetableSource;
use crate::errors::AppResult;
use crate::export::CalendarSink;
use crate::models::calendar_event::CalendarEvent;
use crate::models::lesson::RawLesson;
use crate::models::scope::Scope;
use crate::utils::date::DateWindow;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`: doubles each time, capped.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = 2u64.saturating_pow(attempt.saturating_sub(1));
        let ms = self
            .initial_backoff_ms
            .saturating_mul(exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out.
pub fn with_retry<T, F>(label: &str, policy: &RetryPolicy, mut op: F) -> AppResult<T>
where
    F: FnMut() -> AppResult<T>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_transient() && attempt < attempts => {
                let delay = policy.delay(attempt);
                log::warn!(
                    "{} retry {}/{} after: {} (sleep {:?})",
                    label,
                    attempt,
                    attempts,
                    e,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Decorator adding retries to any source or sink.
pub struct Retrying<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> Retrying<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T: TimetableSource> TimetableSource for Retrying<T> {
    fn current_identity(&mut self) -> AppResult<Option<Scope>> {
        let inner = &mut self.inner;
        with_retry("identity", &self.policy, || inner.current_identity())
    }

    fn fetch(&mut self, scope: &Scope, window: &DateWindow) -> AppResult<Vec<RawLesson>> {
        let inner = &mut self.inner;
        with_retry("fetch", &self.policy, || inner.fetch(scope, window))
    }
}

impl<T: CalendarSink> CalendarSink for Retrying<T> {
    fn publish(&mut self, window: &DateWindow, events: &[CalendarEvent]) -> AppResult<()> {
        let inner = &mut self.inner;
        with_retry("publish", &self.policy, || inner.publish(window, events))
    }
}
