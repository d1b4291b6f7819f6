// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host contract for platform integrations.
//!
//! The [`Controller`](crate::controller::Controller) owns all per-document
//! state but performs no I/O itself. Everything that touches the page or the
//! extension runtime goes through [`Host`]:
//!
//! - **Discovery**: locating media (usually via
//!   [`locate_media`](crate::locate::locate_media)), picking interactive
//!   containers, and hit-testing pointer targets against them.
//! - **Per-element wiring**: attaching `ratechange`/`loadeddata` listeners
//!   to newly claimed media.
//! - **Overlay rendering**: mirroring the logical
//!   [`Overlay`](crate::overlay::Overlay) state into a real element.
//! - **Outbound channels**: settings writes, badge notification and the
//!   arbitration broadcast.
//!
//! Timers are *not* part of the contract. The host asks
//! [`Controller::next_deadline`](crate::controller::Controller::next_deadline)
//! after every entry point and arranges to call
//! [`Controller::advance`](crate::controller::Controller::advance) when it
//! elapses.
//!
//! # Crate boundaries
//!
//! `speedctl_core` owns the state machines and this contract. Backend crates
//! implement [`Host`] for a concrete environment. The lifecycle host (the
//! extension entry point) wires listeners to controller entry points.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::arbitration::Announcement;
use crate::error::HostError;
use crate::media::Media;
use crate::settings::{OverlayPosition, SettingsPatch};
use crate::speed::Speed;

/// Environment the controller runs in.
///
/// Methods returning `Result` may fail without consequence: the controller
/// traces the error and continues.
pub trait Host {
    /// Media element handle.
    type Media: Media;
    /// Node handle used for pointer hit-testing.
    type Node: Clone + PartialEq;

    /// Returns every media element currently in the document, deduplicated,
    /// in document order.
    fn locate_media(&self) -> Vec<Self::Media>;

    /// Returns the node whose hover should reveal the overlay for `media`.
    ///
    /// Implementations try `selectors` against the element's ancestors in
    /// order and fall back to its parent, then to the element itself.
    fn interactive_container(&self, media: &Self::Media, selectors: &[&str]) -> Option<Self::Node>;

    /// Attaches `ratechange` and `loadeddata` listeners to a newly claimed
    /// element.
    fn attach_media_listeners(&mut self, media: &Self::Media) -> Result<(), HostError>;

    /// Whether `target` is `container` or one of its descendants.
    fn contains(&self, container: &Self::Node, target: &Self::Node) -> bool;

    /// Whether `target` is the overlay or inside it.
    fn overlay_contains(&self, target: &Self::Node) -> bool;

    /// Creates the overlay element, hidden.
    fn create_overlay(&mut self) -> Result<(), HostError>;

    /// Shows or hides the overlay element.
    fn set_overlay_visible(&mut self, visible: bool);

    /// Moves the overlay element.
    fn set_overlay_position(&mut self, position: OverlayPosition);

    /// Replaces the speed label.
    fn set_overlay_label(&mut self, label: &str);

    /// Rendered bounds of the overlay in viewport coordinates.
    fn overlay_rect(&self) -> Rect;

    /// Viewport size in CSS pixels.
    fn viewport(&self) -> Size;

    /// Removes the overlay element.
    fn remove_overlay(&mut self);

    /// Writes one record to the shared settings store. Fire-and-forget.
    fn persist(&mut self, patch: SettingsPatch) -> Result<(), HostError>;

    /// Tells the badge collaborator about the current speed.
    fn notify_speed(&mut self, speed: Speed) -> Result<(), HostError>;

    /// Broadcasts an arbitration message to every instance in the visual
    /// context.
    fn announce(&mut self, announcement: &Announcement) -> Result<(), HostError>;

    /// Detaches every document-level listener. Called once on deactivation.
    fn release(&mut self);
}
