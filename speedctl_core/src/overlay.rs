// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay (HUD) state machine.
//!
//! ```text
//!   Absent ──create()──► Hidden ◄──poll(hide deadline)── Visible
//!                           └────────show()──────────────►┘
//!   any ──remove()──► Removed (terminal)
//! ```
//!
//! The overlay owns only its logical state: visibility, the pending hide
//! deadline, its position and an in-progress drag. The host mirrors these
//! into the DOM.

use kurbo::{Point, Size, Vec2};

use crate::settings::OverlayPosition;
use crate::time::{Duration, HostTime};

/// Lifecycle phase of the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayPhase {
    /// Not created yet.
    Absent,
    /// Created and hidden.
    Hidden,
    /// Created and visible.
    Visible,
    /// Removed after losing arbitration; never comes back.
    Removed,
}

impl OverlayPhase {
    /// Whether an overlay element exists.
    #[must_use]
    pub const fn exists(self) -> bool {
        matches!(self, Self::Hidden | Self::Visible)
    }
}

/// Logical overlay state.
#[derive(Clone, Debug)]
pub struct Overlay {
    phase: OverlayPhase,
    hide_at: Option<HostTime>,
    position: OverlayPosition,
    /// Pointer offset inside the overlay while dragging.
    drag: Option<Vec2>,
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Overlay {
    /// Creates an absent overlay at the default position.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: OverlayPhase::Absent,
            hide_at: None,
            position: OverlayPosition::DEFAULT,
            drag: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> OverlayPhase {
        self.phase
    }

    /// Current top-left position.
    #[must_use]
    pub const fn position(&self) -> OverlayPosition {
        self.position
    }

    /// Replaces the position, e.g. with the stored one after creation.
    pub fn set_position(&mut self, position: OverlayPosition) {
        self.position = position;
    }

    /// `Absent -> Hidden`. Returns `false` if the overlay already exists or
    /// was removed.
    pub fn create(&mut self) -> bool {
        if self.phase != OverlayPhase::Absent {
            return false;
        }
        self.phase = OverlayPhase::Hidden;
        true
    }

    /// Cancels any pending hide and makes the overlay visible.
    ///
    /// Returns `true` if the overlay was hidden before.
    pub fn show(&mut self) -> bool {
        if !self.phase.exists() {
            return false;
        }
        self.hide_at = None;
        let was_hidden = self.phase == OverlayPhase::Hidden;
        self.phase = OverlayPhase::Visible;
        was_hidden
    }

    /// (Re)arms the hide timer to fire `delay` after `now`.
    pub fn schedule_hide(&mut self, now: HostTime, delay: Duration) {
        if self.phase.exists() {
            self.hide_at = Some(now.saturating_add(delay));
        }
    }

    /// When the hide timer fires, if armed.
    #[must_use]
    pub const fn hide_deadline(&self) -> Option<HostTime> {
        self.hide_at
    }

    /// Fires the hide timer if it is due. Returns `true` if the overlay went
    /// from visible to hidden.
    pub fn poll(&mut self, now: HostTime) -> bool {
        match self.hide_at {
            Some(due) if due <= now => {
                self.hide_at = None;
                if self.phase == OverlayPhase::Visible {
                    self.phase = OverlayPhase::Hidden;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    /// Moves to the terminal `Removed` phase. Returns `true` if an overlay
    /// element existed.
    pub fn remove(&mut self) -> bool {
        let existed = self.phase.exists();
        self.phase = OverlayPhase::Removed;
        self.hide_at = None;
        self.drag = None;
        existed
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Starts a drag with the pointer at `pointer` and the overlay's rendered
    /// top-left at `origin`.
    pub fn begin_drag(&mut self, pointer: Point, origin: Point) {
        if self.phase.exists() {
            self.drag = Some(pointer - origin);
        }
    }

    /// Moves the overlay under the pointer, keeping it fully inside the
    /// viewport. Returns the new position, or `None` when not dragging.
    pub fn drag_to(&mut self, pointer: Point, overlay: Size, viewport: Size) -> Option<OverlayPosition> {
        let offset = self.drag?;
        let wanted = pointer - offset;
        let left = wanted.x.min(viewport.width - overlay.width).max(0.0);
        let top = wanted.y.min(viewport.height - overlay.height).max(0.0);
        self.position = OverlayPosition { top, left };
        Some(self.position)
    }

    /// Ends a drag. Returns the final position to persist, or `None` when
    /// not dragging.
    pub fn end_drag(&mut self) -> Option<OverlayPosition> {
        self.drag.take().map(|_| self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIDE: Duration = Duration(5000);

    fn created() -> Overlay {
        let mut o = Overlay::new();
        assert!(o.create(), "first create");
        o
    }

    #[test]
    fn create_is_idempotent() {
        let mut o = created();
        assert!(!o.create(), "second create is a no-op");
        assert_eq!(o.phase(), OverlayPhase::Hidden, "created hidden");
    }

    #[test]
    fn second_show_resets_hide_timer() {
        let mut o = created();
        o.show();
        o.schedule_hide(HostTime(0), HIDE);

        o.show();
        o.schedule_hide(HostTime(4000), HIDE);

        assert!(!o.poll(HostTime(4500)), "still visible at 4500");
        assert!(!o.poll(HostTime(5000)), "first timer was replaced");
        assert_eq!(o.phase(), OverlayPhase::Visible, "visible until the re-armed deadline");
        assert!(o.poll(HostTime(9000)), "hides 5000ms after the second show");
        assert_eq!(o.phase(), OverlayPhase::Hidden, "hidden");
    }

    #[test]
    fn show_cancels_pending_hide() {
        let mut o = created();
        o.show();
        o.schedule_hide(HostTime(0), HIDE);
        o.show();
        assert_eq!(o.hide_deadline(), None, "show disarms the timer");
        assert!(!o.poll(HostTime(10_000)), "nothing fires");
    }

    #[test]
    fn absent_overlay_ignores_visibility() {
        let mut o = Overlay::new();
        assert!(!o.show(), "cannot show before create");
        o.schedule_hide(HostTime(0), HIDE);
        assert_eq!(o.hide_deadline(), None, "no timer before create");
    }

    #[test]
    fn removal_is_terminal() {
        let mut o = created();
        o.show();
        o.schedule_hide(HostTime(0), HIDE);
        assert!(o.remove(), "overlay existed");
        assert!(!o.create(), "cannot recreate");
        assert!(!o.show(), "cannot show");
        assert_eq!(o.hide_deadline(), None, "timer cancelled");
        assert!(!o.remove(), "second removal finds nothing");
    }

    #[test]
    fn drag_clamps_to_viewport() {
        let mut o = created();
        let size = Size::new(200.0, 40.0);
        let viewport = Size::new(800.0, 600.0);

        o.begin_drag(Point::new(15.0, 12.0), Point::new(10.0, 10.0));
        assert_eq!(
            o.drag_to(Point::new(105.0, 52.0), size, viewport),
            Some(OverlayPosition { top: 50.0, left: 100.0 }),
            "keeps the grab offset"
        );
        assert_eq!(
            o.drag_to(Point::new(-50.0, -50.0), size, viewport),
            Some(OverlayPosition { top: 0.0, left: 0.0 }),
            "clamped at the top-left"
        );
        assert_eq!(
            o.drag_to(Point::new(2000.0, 2000.0), size, viewport),
            Some(OverlayPosition { top: 560.0, left: 600.0 }),
            "clamped at the bottom-right"
        );
        assert_eq!(
            o.end_drag(),
            Some(OverlayPosition { top: 560.0, left: 600.0 }),
            "final position is persisted"
        );
        assert_eq!(o.end_drag(), None, "no drag in progress");
        assert_eq!(
            o.drag_to(Point::new(1.0, 1.0), size, viewport),
            None,
            "moves after the drag are ignored"
        );
    }

    #[test]
    fn overlay_larger_than_viewport_pins_to_origin() {
        let mut o = created();
        o.begin_drag(Point::ZERO, Point::ZERO);
        let pos = o
            .drag_to(Point::new(30.0, 30.0), Size::new(500.0, 500.0), Size::new(300.0, 300.0))
            .expect("dragging");
        assert_eq!(pos, OverlayPosition { top: 0.0, left: 0.0 }, "pinned");
    }
}
