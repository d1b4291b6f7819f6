// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay DOM.
//!
//! Builds the floating control and mirrors the logical
//! [`Overlay`](speedctl_core::overlay::Overlay) state into it:
//!
//! ```text
//!   #vsc-hud-container (position: fixed)
//!   ├── #vsc-hud-speed          "1.00x"
//!   └── #vsc-hud-controls
//!       ├── #vsc-hud-replay     «
//!       ├── #vsc-hud-decrease   -
//!       ├── #vsc-hud-reset      Reset
//!       ├── #vsc-hud-increase   +
//!       └── #vsc-hud-skip       »
//! ```

use kurbo::Rect;
use speedctl_core::controller::OverlayAction;
use speedctl_core::settings::OverlayPosition;
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, HtmlElement, Node};

pub(crate) const CONTAINER_ID: &str = "vsc-hud-container";
const LABEL_ID: &str = "vsc-hud-speed";
const CONTROLS_ID: &str = "vsc-hud-controls";
const VISIBLE_CLASS: &str = "vsc-hud-visible";

const CONTAINER_CSS: &str = "position: fixed; z-index: 2147483647; display: flex; gap: 8px; \
     align-items: center; padding: 6px 10px; border-radius: 8px; \
     background: rgba(20, 20, 20, 0.85); color: #fff; \
     font: 13px/1.2 system-ui, sans-serif; cursor: grab; user-select: none; \
     transition: opacity 0.2s; opacity: 0; pointer-events: none;";
const LABEL_CSS: &str = "font-weight: bold; min-width: 50px; text-align: center;";
const CONTROLS_CSS: &str = "display: flex; gap: 6px;";
const BUTTON_CSS: &str = "border: 0; border-radius: 4px; padding: 2px 8px; \
     background: rgba(255, 255, 255, 0.15); color: inherit; font: inherit; cursor: pointer;";

/// Buttons in display order: id, text, accessible label, action.
const BUTTONS: [(&str, &str, &str, OverlayAction); 5] = [
    ("vsc-hud-replay", "\u{ab}", "Replay", OverlayAction::Replay),
    ("vsc-hud-decrease", "-", "Decrease speed", OverlayAction::Decrease),
    ("vsc-hud-reset", "Reset", "Reset speed", OverlayAction::Reset),
    ("vsc-hud-increase", "+", "Increase speed", OverlayAction::Increase),
    ("vsc-hud-skip", "\u{bb}", "Skip", OverlayAction::Skip),
];

/// Maps an overlay button id to its action.
#[must_use]
pub fn action_for_id(id: &str) -> Option<OverlayAction> {
    BUTTONS
        .iter()
        .find(|(button, ..)| *button == id)
        .map(|&(.., action)| action)
}

/// The live overlay element.
#[derive(Clone, Debug)]
pub(crate) struct OverlayDom {
    root: HtmlElement,
    label: HtmlElement,
}

impl OverlayDom {
    /// Builds the overlay, hidden, and appends it to `<body>`.
    ///
    /// A stale overlay left by an earlier injection into the same document
    /// is replaced.
    pub(crate) fn create(document: &Document) -> Result<Self, JsValue> {
        let body = document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;
        if let Some(stale) = document.get_element_by_id(CONTAINER_ID) {
            stale.remove();
        }

        let root = element(document, "div")?;
        root.set_id(CONTAINER_ID);
        style(&root, CONTAINER_CSS)?;

        let label = element(document, "div")?;
        label.set_id(LABEL_ID);
        style(&label, LABEL_CSS)?;
        label.set_text_content(Some("1.00x"));
        root.append_child(&label)?;

        let controls = element(document, "div")?;
        controls.set_id(CONTROLS_ID);
        style(&controls, CONTROLS_CSS)?;
        for (id, text, title, _) in BUTTONS {
            let button = element(document, "button")?;
            button.set_id(id);
            button.set_text_content(Some(text));
            button.set_title(title);
            button.set_attribute("aria-label", title)?;
            button.set_attribute("type", "button")?;
            style(&button, BUTTON_CSS)?;
            controls.append_child(&button)?;
        }
        root.append_child(&controls)?;

        body.append_child(&root)?;
        Ok(Self { root, label })
    }

    pub(crate) fn root(&self) -> &HtmlElement {
        &self.root
    }

    pub(crate) fn set_visible(&self, visible: bool) {
        let _ = self.root.class_list().toggle_with_force(VISIBLE_CLASS, visible);
        let s = self.root.style();
        let _ = s.set_property("opacity", if visible { "1" } else { "0" });
        let _ = s.set_property("pointer-events", if visible { "auto" } else { "none" });
    }

    pub(crate) fn set_position(&self, position: OverlayPosition) {
        let (top, left) = position.css();
        let s = self.root.style();
        let _ = s.set_property("top", &top);
        let _ = s.set_property("left", &left);
    }

    pub(crate) fn set_label(&self, text: &str) {
        self.label.set_text_content(Some(text));
    }

    pub(crate) fn rect(&self) -> Rect {
        let r = self.root.get_bounding_client_rect();
        Rect::from_origin_size((r.x(), r.y()), (r.width(), r.height()))
    }

    pub(crate) fn contains(&self, node: &Node) -> bool {
        self.root.contains(Some(node))
    }

    pub(crate) fn remove(&self) {
        self.root.remove();
    }
}

/// The overlay button an event target belongs to, if any.
pub(crate) fn button_of(target: &Element) -> Option<Element> {
    target.closest("button").ok().flatten()
}

fn element(doc: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    Ok(doc.create_element(tag)?.unchecked_into())
}

fn style(el: &Element, css: &str) -> Result<(), JsValue> {
    el.set_attribute("style", css)
}
