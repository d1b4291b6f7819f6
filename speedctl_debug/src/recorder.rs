// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`TraceSink`] and keeps an owned
//! [`RecordedEvent`] per callback, in arrival order. Host errors are cloned
//! out of the borrowed event.

use speedctl_core::error::{HostError, HostOp};
use speedctl_core::trace::{
    ArbitrationEvent, CommandEvent, DetectionEvent, HostErrorEvent, OverlayEvent,
    OverlayTransition, SpeedAppliedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// RecordedEvent
// ---------------------------------------------------------------------------

/// An owned copy of one trace event.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`SpeedAppliedEvent`].
    SpeedApplied(SpeedAppliedEvent),
    /// An [`OverlayEvent`].
    Overlay(OverlayEvent),
    /// A [`DetectionEvent`].
    Detection(DetectionEvent),
    /// An [`ArbitrationEvent`].
    Arbitration(ArbitrationEvent),
    /// A [`CommandEvent`].
    Command(CommandEvent),
    /// A [`HostErrorEvent`].
    HostError {
        /// Which operation failed.
        op: HostOp,
        /// The failure.
        error: HostError,
    },
}

impl RecordedEvent {
    /// Short kind name, as used by the exporters.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SpeedApplied(_) => "speed_applied",
            Self::Overlay(_) => "overlay",
            Self::Detection(_) => "detection",
            Self::Arbitration(_) => "arbitration",
            Self::Command(_) => "command",
            Self::HostError { .. } => "host_error",
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecorderSink {
    events: Vec<RecordedEvent>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Consumes the recorder and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<RecordedEvent> {
        self.events
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Speeds applied, in order.
    pub fn applied_speeds(&self) -> impl Iterator<Item = f64> + '_ {
        self.events.iter().filter_map(|e| match e {
            RecordedEvent::SpeedApplied(e) => Some(e.speed.get()),
            _ => None,
        })
    }

    /// Overlay transitions, in order.
    pub fn overlay_transitions(&self) -> impl Iterator<Item = OverlayTransition> + '_ {
        self.events.iter().filter_map(|e| match e {
            RecordedEvent::Overlay(e) => Some(e.transition),
            _ => None,
        })
    }
}

impl TraceSink for RecorderSink {
    fn on_speed_applied(&mut self, e: &SpeedAppliedEvent) {
        self.events.push(RecordedEvent::SpeedApplied(*e));
    }

    fn on_overlay(&mut self, e: &OverlayEvent) {
        self.events.push(RecordedEvent::Overlay(*e));
    }

    fn on_detection(&mut self, e: &DetectionEvent) {
        self.events.push(RecordedEvent::Detection(*e));
    }

    fn on_arbitration(&mut self, e: &ArbitrationEvent) {
        self.events.push(RecordedEvent::Arbitration(*e));
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.events.push(RecordedEvent::Command(*e));
    }

    fn on_host_error(&mut self, e: &HostErrorEvent<'_>) {
        self.events.push(RecordedEvent::HostError {
            op: e.op,
            error: e.error.clone(),
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use speedctl_core::speed::Speed;
    use speedctl_core::time::HostTime;
    use speedctl_core::trace::{SpeedCause, Tracer};

    fn applied(at: u64, speed: f64) -> SpeedAppliedEvent {
        SpeedAppliedEvent {
            at: HostTime(at),
            speed: Speed::clamped(speed),
            applied: 1,
            skipped: 0,
            cause: SpeedCause::UserRequest,
        }
    }

    #[test]
    fn keeps_events_in_arrival_order() {
        let mut rec = RecorderSink::new();
        rec.on_speed_applied(&applied(100, 1.5));
        rec.on_overlay(&OverlayEvent {
            at: HostTime(100),
            transition: OverlayTransition::Shown,
        });
        rec.on_speed_applied(&applied(400, 2.0));

        let kinds: Vec<_> = rec.events().iter().map(RecordedEvent::kind).collect();
        assert_eq!(
            kinds,
            ["speed_applied", "overlay", "speed_applied"],
            "arrival order"
        );
        assert_eq!(
            rec.applied_speeds().collect::<Vec<_>>(),
            [1.5, 2.0],
            "speed history"
        );
        assert_eq!(
            rec.overlay_transitions().collect::<Vec<_>>(),
            [OverlayTransition::Shown],
            "overlay history"
        );
    }

    #[test]
    fn host_errors_are_owned() {
        let mut rec = RecorderSink::new();
        {
            let error = HostError::Storage(String::from("quota"));
            let mut tracer = Tracer::new(Some(&mut rec as &mut dyn TraceSink));
            tracer.host_error(&HostErrorEvent {
                op: HostOp::Persist,
                error: &error,
            });
        }
        match rec.events() {
            [RecordedEvent::HostError { op, error }] => {
                assert_eq!(*op, HostOp::Persist, "op");
                assert_eq!(*error, HostError::Storage(String::from("quota")), "error");
            }
            other => panic!("expected one host error, got {other:?}"),
        }
    }

    #[test]
    fn clear_empties_the_recording() {
        let mut rec = RecorderSink::new();
        rec.on_speed_applied(&applied(1, 1.0));
        rec.clear();
        assert!(rec.events().is_empty(), "cleared");
        assert!(rec.into_events().is_empty(), "nothing left to take");
    }
}
