// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Debounce and throttle as values that own their timer state.
//!
//! Neither type schedules anything on its own. A [`Debounced`] records a
//! deadline; the host asks for the earliest deadline across all timers and
//! calls back with the current [`HostTime`] once it has passed. This keeps the
//! timers single-threaded and deterministic.
//!
//! ```rust,ignore
//! let mut speed = Debounced::new(Duration::from_millis(50));
//! speed.call(now, 1.5);
//! speed.call(now + Duration(10), 1.6); // replaces 1.5, re-arms
//! // ... later ...
//! if let Some(latest) = speed.poll(now + Duration(60)) {
//!     apply(latest); // 1.6
//! }
//! ```

use crate::time::{Duration, HostTime};

/// Coalesces bursts of calls so only the last value in a quiet window fires.
#[derive(Clone, Debug)]
pub struct Debounced<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Clone, Debug)]
struct Pending<T> {
    due: HostTime,
    value: T,
}

impl<T> Debounced<T> {
    /// Creates an idle debouncer with the given quiet window.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Returns the quiet window.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Records `value` as the latest call and re-arms the window from `now`.
    ///
    /// Any earlier pending value is discarded.
    pub fn call(&mut self, now: HostTime, value: T) {
        self.pending = Some(Pending {
            due: now.saturating_add(self.delay),
            value,
        });
    }

    /// Returns the pending value without firing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref().map(|p| &p.value)
    }

    /// Returns when the pending call fires, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Takes the pending value if its window has elapsed by `now`.
    pub fn poll(&mut self, now: HostTime) -> Option<T> {
        match &self.pending {
            Some(p) if p.due <= now => self.pending.take().map(|p| p.value),
            _ => None,
        }
    }

    /// Drops any pending call without firing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Admits at most one call per interval; calls in between are dropped.
#[derive(Clone, Copy, Debug)]
pub struct Throttle {
    interval: Duration,
    open_at: Option<HostTime>,
}

impl Throttle {
    /// Creates a throttle that admits the first call immediately.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            open_at: None,
        }
    }

    /// Returns `true` if a call at `now` should run, closing the gate for one
    /// interval if so.
    pub fn admit(&mut self, now: HostTime) -> bool {
        match self.open_at {
            Some(open) if now < open => false,
            _ => {
                self.open_at = Some(now.saturating_add(self.interval));
                true
            }
        }
    }
}
