// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the controller.
//!
//! This module provides a [`TraceSink`] trait with one method per controller
//! event. All method bodies default to no-ops, so implementing only the events
//! you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).

use crate::arbitration::InstanceIdentity;
use crate::command::Command;
use crate::error::{HostError, HostOp};
use crate::speed::Speed;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Why a speed was applied to media.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpeedCause {
    /// Seeded from stored settings at startup.
    Startup,
    /// A debounced user request fired.
    UserRequest,
}

/// Overlay lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayTransition {
    /// The overlay element was created.
    Created,
    /// The overlay became visible.
    Shown,
    /// The hide timer fired.
    Hidden,
    /// A drag ended and the position was persisted.
    Moved,
    /// The overlay was removed after losing arbitration.
    Removed,
}

/// What triggered a detection pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectionTrigger {
    /// First pass at startup.
    Startup,
    /// Debounced document mutations.
    Mutation,
    /// Debounced fullscreen transition.
    Fullscreen,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after a speed was applied to the located media.
#[derive(Clone, Copy, Debug)]
pub struct SpeedAppliedEvent {
    /// When the speed was applied.
    pub at: HostTime,
    /// The applied speed.
    pub speed: Speed,
    /// Number of media elements that accepted the rate.
    pub applied: usize,
    /// Number of media elements skipped as not ready.
    pub skipped: usize,
    /// Why the speed was applied.
    pub cause: SpeedCause,
}

/// Emitted when the overlay changes state.
#[derive(Clone, Copy, Debug)]
pub struct OverlayEvent {
    /// When the transition happened.
    pub at: HostTime,
    /// The transition.
    pub transition: OverlayTransition,
}

/// Emitted after each detection pass.
#[derive(Clone, Copy, Debug)]
pub struct DetectionEvent {
    /// When the pass ran.
    pub at: HostTime,
    /// What triggered it.
    pub trigger: DetectionTrigger,
    /// Media elements located.
    pub media: usize,
    /// Elements claimed for the first time in this pass.
    pub newly_claimed: usize,
    /// Distinct interactive containers.
    pub containers: usize,
}

/// Emitted when this instance yields to a newer one.
#[derive(Clone, Copy, Debug)]
pub struct ArbitrationEvent {
    /// This instance.
    pub local: InstanceIdentity,
    /// The instance that won.
    pub winner: InstanceIdentity,
}

/// Emitted when an inbound command is handled.
#[derive(Clone, Copy, Debug)]
pub struct CommandEvent {
    /// When the command arrived.
    pub at: HostTime,
    /// The command.
    pub command: Command,
}

/// Emitted when a host call fails and the failure is absorbed.
#[derive(Clone, Copy, Debug)]
pub struct HostErrorEvent<'a> {
    /// Which operation failed.
    pub op: HostOp,
    /// The failure.
    pub error: &'a HostError,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the controller.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called after a speed was applied to media.
    fn on_speed_applied(&mut self, e: &SpeedAppliedEvent) {
        _ = e;
    }

    /// Called on overlay transitions.
    fn on_overlay(&mut self, e: &OverlayEvent) {
        _ = e;
    }

    /// Called after each detection pass.
    fn on_detection(&mut self, e: &DetectionEvent) {
        _ = e;
    }

    /// Called when the instance deactivates after losing arbitration.
    fn on_arbitration(&mut self, e: &ArbitrationEvent) {
        _ = e;
    }

    /// Called when a command is handled.
    fn on_command(&mut self, e: &CommandEvent) {
        _ = e;
    }

    /// Called when a host call fails.
    fn on_host_error(&mut self, e: &HostErrorEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink, if any.
    #[inline]
    #[must_use]
    pub fn new(sink: Option<&'a mut dyn TraceSink>) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::new(None)
    }

    /// Emits a [`SpeedAppliedEvent`].
    #[inline]
    pub fn speed_applied(&mut self, e: &SpeedAppliedEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_speed_applied(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`OverlayEvent`].
    #[inline]
    pub fn overlay(&mut self, e: &OverlayEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_overlay(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`DetectionEvent`].
    #[inline]
    pub fn detection(&mut self, e: &DetectionEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_detection(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits an [`ArbitrationEvent`].
    #[inline]
    pub fn arbitration(&mut self, e: &ArbitrationEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_arbitration(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommandEvent`].
    #[inline]
    pub fn command(&mut self, e: &CommandEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_command(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`HostErrorEvent`].
    #[inline]
    pub fn host_error(&mut self, e: &HostErrorEvent<'_>) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_host_error(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_applied() -> SpeedAppliedEvent {
        SpeedAppliedEvent {
            at: HostTime(1_000),
            speed: Speed::clamped(1.5),
            applied: 2,
            skipped: 1,
            cause: SpeedCause::UserRequest,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_speed_applied(&sample_applied());
        sink.on_host_error(&HostErrorEvent {
            op: HostOp::Persist,
            error: &HostError::ContextInvalidated,
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.speed_applied(&sample_applied());
        tracer.overlay(&OverlayEvent {
            at: HostTime(0),
            transition: OverlayTransition::Shown,
        });
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            speeds: Vec<f64>,
        }
        impl TraceSink for RecordingSink {
            fn on_speed_applied(&mut self, e: &SpeedAppliedEvent) {
                self.speeds.push(e.speed.get());
            }
        }

        let mut sink = RecordingSink { speeds: Vec::new() };
        let mut tracer = Tracer::new(Some(&mut sink));
        tracer.speed_applied(&sample_applied());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.speeds, &[1.5], "event reached the sink");
    }
}
