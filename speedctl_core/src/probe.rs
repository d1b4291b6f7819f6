// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Injection probe.
//!
//! Content scripts load on every frame, most of which never host a video.
//! The probe samples the document on a fixed period and reports once when a
//! usable video shows up, or gives up after a bounded window. The lifecycle
//! host only constructs a [`Controller`](crate::controller::Controller) after
//! [`ProbeVerdict::Inject`].
//!
//! Giving up is not final. The probe goes dormant, and the next sample (the
//! web host takes one when the document mutates) opens a fresh window.
//!
//! ```text
//!   Idle ──sample──► Probing ──hit──► Done
//!                      │  ▲
//!            window over  │ sample
//!                      ▼  │
//!                     Dormant
//! ```

use kurbo::Size;

use crate::media::ReadyState;
use crate::time::{Duration, HostTime};

/// A video observed during a probe sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Rendered size in CSS pixels.
    pub size: Size,
    /// Media readiness.
    pub ready: ReadyState,
}

impl Candidate {
    /// Smallest rendered size (exclusive, per axis) that counts as a real
    /// video rather than a tracking pixel or a thumbnail.
    pub const MIN_SIZE: Size = Size::new(50.0, 50.0);

    /// Whether this candidate is worth injecting for.
    #[must_use]
    pub fn qualifies(&self) -> bool {
        self.size.width > Self::MIN_SIZE.width
            && self.size.height > Self::MIN_SIZE.height
            && self.ready.accepts_rate()
    }
}

/// Result of one probe step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// Keep sampling; the next sample is due at the given time.
    Wait(HostTime),
    /// A qualifying video was found. Reported once.
    Inject,
    /// The probe window elapsed without a hit. Reported once per window.
    GiveUp,
}

/// Probe timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Time between samples.
    pub interval: Duration,
    /// Total probing window.
    pub window: Duration,
}

impl ProbeConfig {
    /// 250 ms samples for up to 15 s.
    #[must_use]
    pub const fn extension() -> Self {
        Self {
            interval: Duration::from_millis(250),
            window: Duration::from_secs(15),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::extension()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProbeState {
    Idle,
    Probing { until: HostTime, next: HostTime },
    Dormant,
    Done,
}

/// Bounded polling for a usable video.
#[derive(Clone, Debug)]
pub struct InjectionProbe {
    config: ProbeConfig,
    state: ProbeState,
}

impl InjectionProbe {
    /// Creates an idle probe.
    #[must_use]
    pub const fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            state: ProbeState::Idle,
        }
    }

    /// Whether a qualifying video was reported.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.state, ProbeState::Done)
    }

    /// Whether the last window ended without a hit and no new one has
    /// started.
    #[must_use]
    pub const fn is_dormant(&self) -> bool {
        matches!(self.state, ProbeState::Dormant)
    }

    /// When the next sample is due, if still probing.
    #[must_use]
    pub const fn deadline(&self) -> Option<HostTime> {
        match self.state {
            ProbeState::Probing { next, .. } => Some(next),
            ProbeState::Idle | ProbeState::Dormant | ProbeState::Done => None,
        }
    }

    /// Takes a sample at `now`.
    ///
    /// The first call, and the first call after a [`ProbeVerdict::GiveUp`],
    /// starts a window. Returns `None` once [`ProbeVerdict::Inject`] has been
    /// reported.
    pub fn sample(&mut self, now: HostTime, candidates: &[Candidate]) -> Option<ProbeVerdict> {
        let until = match self.state {
            ProbeState::Done => return None,
            ProbeState::Idle | ProbeState::Dormant => now.saturating_add(self.config.window),
            ProbeState::Probing { until, .. } => until,
        };
        if candidates.iter().any(Candidate::qualifies) {
            self.state = ProbeState::Done;
            return Some(ProbeVerdict::Inject);
        }
        if now >= until {
            self.state = ProbeState::Dormant;
            return Some(ProbeVerdict::GiveUp);
        }
        let next = now.saturating_add(self.config.interval);
        self.state = ProbeState::Probing { until, next };
        Some(ProbeVerdict::Wait(next))
    }
}
