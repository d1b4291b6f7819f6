// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON-lines export for speedctl
//! diagnostics.
//!
//! This crate provides [`TraceSink`](speedctl_core::trace::TraceSink)
//! implementations for development and for replaying controller sessions in
//! tests:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: keeps owned copies of every event in memory.
//! - [`jsonl::export`]: writes recorded events as JSON lines.

pub mod jsonl;
pub mod pretty;
pub mod recorder;
