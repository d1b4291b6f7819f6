// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for speedctl.
//!
//! This crate provides integration with browser and extension APIs:
//!
//! - [`DomHost`]: the [`Host`](speedctl_core::host::Host) implementation over
//!   a live document (media discovery, overlay DOM, outbound channels)
//! - [`DomTree`] and [`DomMedia`]: shadow-root aware media discovery
//! - [`TimeoutTimer`]: a single re-armable `setTimeout` driving controller
//!   deadlines
//! - [`ListenerSet`]: DOM, `MutationObserver` and `chrome.*` event listeners
//!   that can all be released at once
//! - [`ConsoleSink`]: forwards controller trace events to `tracing`
//! - [`storage`] and [`messaging`]: `chrome.storage.sync`,
//!   `chrome.runtime` and `postMessage` wire glue
//! - [`probe`]: the injection probe driver
//!
//! Everything here only does useful work on `wasm32`. The pure helpers
//! (delay computation, button mapping, error classification) are tested
//! natively.

mod chrome;
mod error;
mod host;
mod listeners;
mod media;
pub mod messaging;
mod overlay;
pub mod probe;
mod sink;
pub mod storage;
mod timer;
mod tree;

pub use host::{DomHost, HostEvent};
pub use listeners::ListenerSet;
pub use media::{CLAIM_ATTRIBUTE, DomMedia};
pub use overlay::action_for_id;
pub use sink::ConsoleSink;
pub use speedctl_core::host::Host;
pub use timer::TimeoutTimer;
pub use tree::{DomTree, Scope};

use speedctl_core::arbitration::InstanceIdentity;
use speedctl_core::time::HostTime;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;

    #[wasm_bindgen(js_namespace = Date, js_name = "now")]
    fn date_now() -> f64;
}

/// Returns the current host time from `performance.now()`, in milliseconds.
#[must_use]
pub fn now() -> HostTime {
    HostTime(whole_millis(performance_now()))
}

/// Milliseconds since the Unix epoch from `Date.now()`.
///
/// Comparable across frames, unlike [`now`].
#[must_use]
pub fn wall_clock_millis() -> u64 {
    whole_millis(date_now())
}

/// A fresh identity for this controller instantiation.
#[must_use]
pub fn new_identity() -> InstanceIdentity {
    #[expect(
        clippy::cast_possible_truncation,
        reason = "Math.random() is in [0, 1); the product fits in 53 bits"
    )]
    let id = (js_sys::Math::random() * InstanceIdentity::MAX_ID as f64) as u64;
    InstanceIdentity::new(id, wall_clock_millis())
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "browser timestamps are small positive values"
)]
fn whole_millis(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        ms as u64
    } else {
        0
    }
}
