// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Failures reported by the host environment.
//!
//! The controller runs unattended inside third-party pages. Every host call
//! that can fail returns a [`HostError`]; the controller records it through
//! the trace sink and carries on without retrying.

use alloc::string::String;

/// A failed interaction with the host environment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The extension context was torn down; the controller is about to be
    /// discarded along with it.
    #[error("extension context invalidated")]
    ContextInvalidated,
    /// The shared settings store rejected a read or write.
    #[error("settings store: {0}")]
    Storage(String),
    /// An outbound message could not be delivered.
    #[error("messaging: {0}")]
    Messaging(String),
    /// A DOM operation threw.
    #[error("dom: {0}")]
    Dom(String),
    /// A value could not be converted to its wire form.
    #[error("encode: {0}")]
    Encode(String),
}

/// Which host operation failed, for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostOp {
    /// Writing the global or per-site settings.
    Persist,
    /// Notifying the badge collaborator.
    Notify,
    /// Creating the overlay.
    CreateOverlay,
    /// Broadcasting the arbitration announcement.
    Announce,
    /// Attaching per-element listeners.
    AttachListeners,
}
