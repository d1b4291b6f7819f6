// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core state machines for per-document media playback-rate control.
//!
//! `speedctl_core` holds everything about the controller that does not touch
//! a browser: speed clamping and debouncing, deep media discovery over an
//! abstract tree, overlay visibility and drag state, duplicate-instance
//! arbitration and the settings model. It is `no_std` compatible (with
//! `alloc`) and runs against a virtual clock, so every behavior is testable
//! natively.
//!
//! # Architecture
//!
//! The [`Controller`](controller::Controller) wires the state machines
//! together over a [`Host`](host::Host):
//!
//! ```text
//!   Host events (pointer, mutation, ratechange, messages)
//!       │
//!       ▼
//!   Controller::on_*() ──► RateEnforcer / Overlay / DetectionLoop / Arbiter
//!       │                                  │
//!       │                                  ▼
//!       │                        deadlines (debounce, hide)
//!       │                                  │
//!       ▼                                  ▼
//!   Host calls  ◄──── Controller::advance(now) ◄── Controller::next_deadline()
//! ```
//!
//! **[`locate`]** — Depth-bounded, deduplicating media discovery across
//! shadow roots, over the [`MediaTree`](locate::MediaTree) trait.
//!
//! **[`enforce`]** — The [`RateEnforcer`](enforce::RateEnforcer): desired
//! speed, debounced requests and the rules for when to overwrite a native
//! rate.
//!
//! **[`overlay`]** — Overlay phases, hide deadline and drag clamping.
//!
//! **[`arbitration`]** — Newest-instance-wins election between controllers
//! that share a visual context.
//!
//! **[`detect`]** — Debounced re-detection triggers.
//!
//! **[`command`]** and **[`settings`]** — Wire shapes of the command channel
//! and the shared settings store.
//!
//! **[`probe`]** — Bounded polling that decides whether a frame gets a
//! controller at all.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types,
//! with the zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod arbitration;
pub mod command;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod detect;
pub mod enforce;
pub mod error;
pub mod host;
pub mod locate;
pub mod media;
pub mod overlay;
pub mod probe;
pub mod settings;
pub mod speed;
pub mod time;
pub mod trace;
