// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Level-triggered re-detection.
//!
//! Mutations and fullscreen transitions only *request* a pass; the pass
//! itself re-runs discovery from scratch. Chatty pages emit mutation batches
//! continuously, so requests are debounced: mutations on a longer window,
//! fullscreen transitions on a shorter one because the user is watching.

use crate::debounce::Debounced;
use crate::time::{Duration, HostTime, earliest};
use crate::trace::DetectionTrigger;

/// Pending detection requests.
#[derive(Clone, Debug)]
pub struct DetectionLoop {
    mutation: Debounced<()>,
    fullscreen: Debounced<()>,
    passes: u64,
}

impl DetectionLoop {
    /// Creates a loop with the given debounce windows.
    #[must_use]
    pub const fn new(mutation_window: Duration, fullscreen_window: Duration) -> Self {
        Self {
            mutation: Debounced::new(mutation_window),
            fullscreen: Debounced::new(fullscreen_window),
            passes: 0,
        }
    }

    /// Records a mutation batch.
    pub fn on_mutation(&mut self, now: HostTime) {
        self.mutation.call(now, ());
    }

    /// Records a fullscreen transition.
    pub fn on_fullscreen_change(&mut self, now: HostTime) {
        self.fullscreen.call(now, ());
    }

    /// Earliest pending request.
    #[must_use]
    pub fn deadline(&self) -> Option<HostTime> {
        earliest(self.mutation.deadline(), self.fullscreen.deadline())
    }

    /// Returns the trigger for a pass that is due at `now`, if any.
    ///
    /// A due fullscreen request also satisfies a due mutation request, so at
    /// most one pass runs per poll.
    pub fn poll(&mut self, now: HostTime) -> Option<DetectionTrigger> {
        let fullscreen = self.fullscreen.poll(now).is_some();
        let mutation = self.mutation.poll(now).is_some();
        let trigger = if fullscreen {
            DetectionTrigger::Fullscreen
        } else if mutation {
            DetectionTrigger::Mutation
        } else {
            return None;
        };
        Some(trigger)
    }

    /// Counts a completed pass.
    pub fn record_pass(&mut self) {
        self.passes += 1;
    }

    /// Completed passes so far.
    #[must_use]
    pub const fn passes(&self) -> u64 {
        self.passes
    }

    /// Drops pending requests.
    pub fn cancel(&mut self) {
        self.mutation.cancel();
        self.fullscreen.cancel();
    }
}
