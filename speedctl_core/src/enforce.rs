// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Desired-speed ownership and enforcement.
//!
//! The [`RateEnforcer`] holds the speed the user wants and decides when a
//! media element's native rate should be overwritten. It does not touch the
//! store or the badge; the controller performs those side effects when a
//! debounced request fires.
//!
//! Two rules keep it from fighting the host page:
//!
//! - Nothing is *restored* after a page-initiated rate change until the user
//!   has chosen a speed in this document, and then only on elements that are
//!   playing and buffered.
//! - Newly found elements are only *seeded* when there is something to seed:
//!   the user has chosen, or the stored speed is not the native rate.

use crate::debounce::Debounced;
use crate::media::Media;
use crate::speed::Speed;
use crate::time::{Duration, HostTime};

/// Counts from one application pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Elements that received the rate.
    pub applied: usize,
    /// Elements skipped because they could not accept a rate yet.
    pub skipped: usize,
}

/// Owner of the desired speed.
#[derive(Clone, Debug)]
pub struct RateEnforcer {
    desired: Speed,
    user_chosen: bool,
    pending: Debounced<Speed>,
}

impl RateEnforcer {
    /// Creates an enforcer at normal speed with the given request debounce.
    #[must_use]
    pub const fn new(debounce: Duration) -> Self {
        Self {
            desired: Speed::NORMAL,
            user_chosen: false,
            pending: Debounced::new(debounce),
        }
    }

    /// Current desired speed. No side effects.
    #[must_use]
    pub const fn desired(&self) -> Speed {
        self.desired
    }

    /// Whether the user has chosen a speed in this document.
    #[must_use]
    pub const fn user_chosen(&self) -> bool {
        self.user_chosen
    }

    /// Sets the starting speed without counting it as a user choice.
    pub fn seed(&mut self, speed: Speed) {
        self.desired = speed;
    }

    /// Queues a user request; only the last request in a burst fires.
    pub fn request(&mut self, now: HostTime, requested: f64) {
        self.pending.call(now, Speed::clamped(requested));
    }

    /// Queues a relative step from the latest target.
    ///
    /// The base is the pending request when there is one, so holding a
    /// button accumulates steps instead of repeating the first one.
    pub fn request_step(&mut self, now: HostTime, delta: f64) {
        let target = self.target().stepped(delta);
        self.pending.call(now, target);
    }

    /// The pending request if any, else the desired speed.
    #[must_use]
    pub fn target(&self) -> Speed {
        self.pending.peek().copied().unwrap_or(self.desired)
    }

    /// When the pending request fires.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        self.pending.deadline()
    }

    /// Fires the pending request if due, committing it as the desired speed.
    pub fn poll(&mut self, now: HostTime) -> Option<Speed> {
        let speed = self.pending.poll(now)?;
        self.desired = speed;
        self.user_chosen = true;
        Some(speed)
    }

    /// Drops any pending request.
    pub fn cancel(&mut self) {
        self.pending.cancel();
    }

    /// Writes the desired speed to every element that can accept it.
    pub fn apply_all<M: Media>(&self, media: &[M]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for m in media {
            if m.ready_state().accepts_rate() {
                m.set_playback_rate(self.desired.get());
                report.applied += 1;
            } else {
                report.skipped += 1;
            }
        }
        report
    }

    /// Whether newly found or newly loaded elements should receive the
    /// desired speed.
    #[must_use]
    pub fn should_seed(&self) -> bool {
        self.user_chosen || !self.desired.is_normal()
    }

    /// Seeds one element if seeding is allowed and it can accept a rate.
    /// Returns `true` if the rate was written.
    pub fn seed_element<M: Media>(&self, media: &M) -> bool {
        if !self.should_seed() || !media.ready_state().accepts_rate() {
            return false;
        }
        if !self.desired.approx_eq(media.playback_rate()) {
            media.set_playback_rate(self.desired.get());
        }
        true
    }

    /// Handles a native `ratechange`. Restores the desired speed when the
    /// user has chosen one and the element is playing and buffered.
    /// Returns `true` if the rate was restored.
    pub fn on_rate_change<M: Media>(&self, media: &M) -> bool {
        if !self.user_chosen
            || !media.is_playing()
            || !media.ready_state().is_buffered()
            || self.desired.approx_eq(media.playback_rate())
        {
            return false;
        }
        media.set_playback_rate(self.desired.get());
        true
    }
}
