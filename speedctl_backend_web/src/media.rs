// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Media`] over `HTMLMediaElement`.

use speedctl_core::media::{Media, ReadyState};
use web_sys::HtmlMediaElement;

/// Attribute marking an element whose listeners are attached.
///
/// Lives on the element so that the mark survives re-discovery and is shared
/// by every pass without the controller holding element references.
pub const CLAIM_ATTRIBUTE: &str = "data-vsc-processed";

/// A `<video>` or `<audio>` element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomMedia(HtmlMediaElement);

impl DomMedia {
    /// Wraps an element.
    #[must_use]
    pub fn new(element: HtmlMediaElement) -> Self {
        Self(element)
    }

    /// The underlying element.
    #[must_use]
    pub fn element(&self) -> &HtmlMediaElement {
        &self.0
    }
}

impl Media for DomMedia {
    fn playback_rate(&self) -> f64 {
        self.0.playback_rate()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.0.set_playback_rate(rate);
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_dom(self.0.ready_state())
    }

    fn is_playing(&self) -> bool {
        !self.0.paused() && !self.0.ended()
    }

    fn duration(&self) -> f64 {
        self.0.duration()
    }

    fn current_time(&self) -> f64 {
        self.0.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.0.set_current_time(seconds);
    }

    fn claim(&self) -> bool {
        if self.0.has_attribute(CLAIM_ATTRIBUTE) {
            return false;
        }
        self.0.set_attribute(CLAIM_ATTRIBUTE, "true").is_ok()
    }
}
