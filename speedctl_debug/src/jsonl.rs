// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON-lines exporter.
//!
//! [`export`] writes one JSON object per recorded event. Every object has a
//! `kind` field (see [`RecordedEvent::kind`]) and, where the event carries
//! one, an `at` field in host milliseconds.

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::RecordedEvent;

/// Writes `events` to `writer`, one JSON object per line.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    for event in events {
        serde_json::to_writer(&mut *writer, &to_json(event))?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// The JSON object [`export`] writes for one event.
#[must_use]
pub fn to_json(event: &RecordedEvent) -> Value {
    let kind = event.kind();
    match event {
        RecordedEvent::SpeedApplied(e) => json!({
            "kind": kind,
            "at": e.at.millis(),
            "speed": e.speed.get(),
            "applied": e.applied,
            "skipped": e.skipped,
            "cause": format!("{:?}", e.cause),
        }),
        RecordedEvent::Overlay(e) => json!({
            "kind": kind,
            "at": e.at.millis(),
            "transition": format!("{:?}", e.transition),
        }),
        RecordedEvent::Detection(e) => json!({
            "kind": kind,
            "at": e.at.millis(),
            "trigger": format!("{:?}", e.trigger),
            "media": e.media,
            "newly_claimed": e.newly_claimed,
            "containers": e.containers,
        }),
        RecordedEvent::Arbitration(e) => json!({
            "kind": kind,
            "local": { "id": e.local.id, "created_at": e.local.created_at },
            "winner": { "id": e.winner.id, "created_at": e.winner.created_at },
        }),
        RecordedEvent::Command(e) => json!({
            "kind": kind,
            "at": e.at.millis(),
            "command": format!("{:?}", e.command),
        }),
        RecordedEvent::HostError { op, error } => json!({
            "kind": kind,
            "op": format!("{op:?}"),
            "error": error.to_string(),
        }),
    }
}
