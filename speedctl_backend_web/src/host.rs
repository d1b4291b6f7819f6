// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Host`] implementation over a live document.
//!
//! `DomHost` does not call back into the controller directly. Events raised
//! by listeners it owns (per-element media events, overlay clicks and
//! presses) are handed to an `events` callback supplied by the lifecycle
//! host, which routes them to the right controller entry point.

use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use speedctl_core::arbitration::Announcement;
use speedctl_core::controller::OverlayAction;
use speedctl_core::error::HostError;
use speedctl_core::host::Host;
use speedctl_core::locate::locate_media;
use speedctl_core::settings::{OverlayPosition, SettingsPatch};
use speedctl_core::speed::Speed;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, Event, EventTarget, MouseEvent, Node, Window};

use crate::error::dom_error;
use crate::listeners::ListenerSet;
use crate::media::DomMedia;
use crate::overlay::{OverlayDom, action_for_id, button_of};
use crate::tree::{DomTree, Scope};
use crate::{messaging, storage};

/// Something a listener owned by [`DomHost`] observed.
#[derive(Clone, Debug)]
pub enum HostEvent {
    /// The page changed an element's `playbackRate`.
    RateChange(DomMedia),
    /// An element finished loading its first frame.
    LoadedData(DomMedia),
    /// An overlay button was clicked.
    OverlayAction(OverlayAction),
    /// The primary button went down on the overlay.
    OverlayPointerDown {
        /// Pointer in viewport coordinates.
        pointer: Point,
        /// Whether the press landed on one of the buttons.
        on_button: bool,
    },
}

/// The browser environment of one controller.
pub struct DomHost {
    window: Window,
    document: Document,
    tree: DomTree,
    overlay: Option<OverlayDom>,
    listeners: ListenerSet,
    events: Rc<dyn Fn(HostEvent)>,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("overlay", &self.overlay.is_some())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

impl DomHost {
    /// Creates a host for `document`. `events` receives everything the
    /// host's own listeners observe.
    pub fn new(window: Window, document: Document, events: impl Fn(HostEvent) + 'static) -> Self {
        Self {
            window,
            document,
            tree: DomTree,
            overlay: None,
            listeners: ListenerSet::new(),
            events: Rc::new(events),
        }
    }

    /// The window this host runs in.
    #[must_use]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// The document this host runs in.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Listener registrations released on deactivation. The lifecycle host
    /// adds its document-level listeners here.
    pub fn listeners_mut(&mut self) -> &mut ListenerSet {
        &mut self.listeners
    }

    fn wire_overlay(&mut self, root: &EventTarget) -> Result<(), HostError> {
        let events = Rc::clone(&self.events);
        self.listeners.listen(root, "click", move |event: Event| {
            if let Some(action) = target_element(&event)
                .and_then(|target| button_of(&target))
                .and_then(|button| action_for_id(&button.id()))
            {
                events(HostEvent::OverlayAction(action));
            }
        })?;

        let events = Rc::clone(&self.events);
        self.listeners.listen(root, "mousedown", move |event: Event| {
            let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let on_button = target_element(&event)
                .and_then(|target| button_of(&target))
                .is_some();
            let pointer = Point::new(f64::from(mouse.client_x()), f64::from(mouse.client_y()));
            events(HostEvent::OverlayPointerDown { pointer, on_button });
        })
    }
}

fn target_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

impl Host for DomHost {
    type Media = DomMedia;
    type Node = Node;

    fn locate_media(&self) -> Vec<DomMedia> {
        locate_media(&self.tree, &Scope::Document(self.document.clone()))
    }

    fn interactive_container(&self, media: &DomMedia, selectors: &[&str]) -> Option<Node> {
        let element = media.element();
        for selector in selectors {
            if let Ok(Some(found)) = element.closest(selector) {
                return Some(found.into());
            }
        }
        match element.parent_element() {
            Some(parent) => Some(parent.into()),
            None => Some(element.clone().into()),
        }
    }

    fn attach_media_listeners(&mut self, media: &DomMedia) -> Result<(), HostError> {
        let target: &EventTarget = media.element().as_ref();

        let events = Rc::clone(&self.events);
        let element = media.clone();
        self.listeners.listen(target, "ratechange", move |_| {
            events(HostEvent::RateChange(element.clone()));
        })?;

        let events = Rc::clone(&self.events);
        let element = media.clone();
        self.listeners.listen(target, "loadeddata", move |_| {
            events(HostEvent::LoadedData(element.clone()));
        })
    }

    fn contains(&self, container: &Node, target: &Node) -> bool {
        container.contains(Some(target))
    }

    fn overlay_contains(&self, target: &Node) -> bool {
        self.overlay
            .as_ref()
            .is_some_and(|overlay| overlay.contains(target))
    }

    fn create_overlay(&mut self) -> Result<(), HostError> {
        let overlay = OverlayDom::create(&self.document).map_err(|e| dom_error(&e))?;
        let root: EventTarget = overlay.root().clone().into();
        if let Err(err) = self.wire_overlay(&root) {
            overlay.remove();
            return Err(err);
        }
        self.overlay = Some(overlay);
        Ok(())
    }

    fn set_overlay_visible(&mut self, visible: bool) {
        if let Some(overlay) = &self.overlay {
            overlay.set_visible(visible);
        }
    }

    fn set_overlay_position(&mut self, position: OverlayPosition) {
        if let Some(overlay) = &self.overlay {
            overlay.set_position(position);
        }
    }

    fn set_overlay_label(&mut self, label: &str) {
        if let Some(overlay) = &self.overlay {
            overlay.set_label(label);
        }
    }

    fn overlay_rect(&self) -> Rect {
        self.overlay.as_ref().map_or(Rect::ZERO, OverlayDom::rect)
    }

    fn viewport(&self) -> Size {
        let dimension =
            |value: Result<JsValue, JsValue>| value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        Size::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn remove_overlay(&mut self) {
        if let Some(overlay) = self.overlay.take() {
            overlay.remove();
        }
    }

    fn persist(&mut self, patch: SettingsPatch) -> Result<(), HostError> {
        storage::write(&patch)
    }

    fn notify_speed(&mut self, speed: Speed) -> Result<(), HostError> {
        messaging::notify_badge(speed)
    }

    fn announce(&mut self, announcement: &Announcement) -> Result<(), HostError> {
        messaging::announce(&self.window, announcement)
    }

    fn release(&mut self) {
        self.listeners.release();
    }
}
