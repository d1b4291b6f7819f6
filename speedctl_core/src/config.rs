// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Controller timing and discovery configuration.

use crate::time::Duration;

/// Fixed controller parameters.
///
/// User-tunable values (step size, skip amount) live in the settings store
/// instead and can change while the controller runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Debounce window for speed requests.
    pub speed_debounce: Duration,
    /// How long the overlay stays visible after the last pointer activity.
    pub hide_delay: Duration,
    /// Minimum spacing between processed pointer-move samples.
    pub pointer_throttle: Duration,
    /// Debounce window for mutation-triggered detection.
    pub mutation_debounce: Duration,
    /// Debounce window for fullscreen-triggered detection.
    pub fullscreen_debounce: Duration,
    /// Ancestor selectors tried, in order, when choosing a media element's
    /// interactive container. The parent element is used when none match.
    pub container_selectors: &'static [&'static str],
}

impl ControllerConfig {
    /// Values used by the browser extension.
    #[must_use]
    pub const fn extension() -> Self {
        Self {
            speed_debounce: Duration::from_millis(50),
            hide_delay: Duration::from_millis(5000),
            pointer_throttle: Duration::from_millis(100),
            mutation_debounce: Duration::from_millis(500),
            fullscreen_debounce: Duration::from_millis(100),
            container_selectors: &[r#"[data-testid="videoComponent"]"#],
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::extension()
    }
}
