// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Times are
//! host milliseconds.

use std::io::Write;

use speedctl_core::trace::{
    ArbitrationEvent, CommandEvent, DetectionEvent, HostErrorEvent, OverlayEvent,
    SpeedAppliedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_speed_applied(&mut self, e: &SpeedAppliedEvent) {
        let _ = writeln!(
            self.writer,
            "[speed] at={}ms {} applied={} skipped={} cause={:?}",
            e.at.millis(),
            e.speed.label(),
            e.applied,
            e.skipped,
            e.cause,
        );
    }

    fn on_overlay(&mut self, e: &OverlayEvent) {
        let _ = writeln!(
            self.writer,
            "[overlay] at={}ms {:?}",
            e.at.millis(),
            e.transition,
        );
    }

    fn on_detection(&mut self, e: &DetectionEvent) {
        let _ = writeln!(
            self.writer,
            "[detect] at={}ms trigger={:?} media={} new={} containers={}",
            e.at.millis(),
            e.trigger,
            e.media,
            e.newly_claimed,
            e.containers,
        );
    }

    fn on_arbitration(&mut self, e: &ArbitrationEvent) {
        let _ = writeln!(
            self.writer,
            "[arbitration] local={}@{} yielded to {}@{}",
            e.local.id, e.local.created_at, e.winner.id, e.winner.created_at,
        );
    }

    fn on_command(&mut self, e: &CommandEvent) {
        let _ = writeln!(self.writer, "[command] at={}ms {:?}", e.at.millis(), e.command);
    }

    fn on_host_error(&mut self, e: &HostErrorEvent<'_>) {
        let _ = writeln!(self.writer, "[host-error] {:?}: {}", e.op, e.error);
    }
}
