// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwards controller trace events to `tracing`.

use speedctl_core::error::HostError;
use speedctl_core::trace::{
    ArbitrationEvent, CommandEvent, DetectionEvent, HostErrorEvent, OverlayEvent,
    SpeedAppliedEvent, TraceSink,
};

/// [`TraceSink`] that logs every event through the global `tracing`
/// subscriber (in the extension, the browser console).
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl TraceSink for ConsoleSink {
    fn on_speed_applied(&mut self, e: &SpeedAppliedEvent) {
        tracing::info!(
            at = e.at.millis(),
            speed = e.speed.get(),
            applied = e.applied,
            skipped = e.skipped,
            cause = ?e.cause,
            "speed applied"
        );
    }

    fn on_overlay(&mut self, e: &OverlayEvent) {
        tracing::debug!(at = e.at.millis(), transition = ?e.transition, "overlay");
    }

    fn on_detection(&mut self, e: &DetectionEvent) {
        tracing::debug!(
            at = e.at.millis(),
            trigger = ?e.trigger,
            media = e.media,
            newly_claimed = e.newly_claimed,
            containers = e.containers,
            "detection pass"
        );
    }

    fn on_arbitration(&mut self, e: &ArbitrationEvent) {
        tracing::info!(
            local = e.local.id,
            winner = e.winner.id,
            "newer controller in this context; deactivating"
        );
    }

    fn on_command(&mut self, e: &CommandEvent) {
        tracing::debug!(at = e.at.millis(), command = ?e.command, "command");
    }

    fn on_host_error(&mut self, e: &HostErrorEvent<'_>) {
        match e.error {
            // Expected after an extension reload; not worth a warning.
            HostError::ContextInvalidated => {
                tracing::debug!(op = ?e.op, "extension context invalidated");
            }
            error => tracing::warn!(op = ?e.op, %error, "host call failed"),
        }
    }
}
