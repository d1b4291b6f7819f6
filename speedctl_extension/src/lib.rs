// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-script entry point.
//!
//! Loaded into every frame. The module probes the frame for a visible,
//! loaded `<video>`; when one shows up within the probe window it reads the
//! stored settings and starts a single [`Controller`] over a [`DomHost`].
//!
//! All controller entry points run through [`with_app`], which re-arms the
//! deadline timer afterwards:
//!
//! ```text
//!   DOM / chrome.* listeners ──► with_app ──► Controller::on_*()
//!                                   │
//!                                   ▼
//!   TimeoutTimer ◄── arm(next_deadline) ── Controller::advance(now)
//! ```
//!
//! Build with: `wasm-pack build --target no-modules speedctl_extension`

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use js_sys::{Function, Reflect};
use kurbo::Point;
use speedctl_backend_web::messaging::{parse_announcement, parse_command, reply_value};
use speedctl_backend_web::probe::start_probe;
use speedctl_backend_web::storage::{load_settings, parse_change};
use speedctl_backend_web::{ConsoleSink, DomHost, HostEvent, TimeoutTimer, new_identity, now};
use speedctl_core::config::ControllerConfig;
use speedctl_core::controller::{Controller, Lifecycle};
use speedctl_core::error::HostError;
use speedctl_core::probe::ProbeConfig;
use speedctl_core::time::{Duration, HostTime};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, MessageEvent, MouseEvent, Node, Window};

/// Set on `window` once this script has run in the current world.
const LOADED_FLAG: &str = "__speedctlLoaded";

/// Retry delay when the timer fires while the controller is borrowed.
const BUSY_RETRY: Duration = Duration::from_millis(1);

/// The storage area settings live in.
const SETTINGS_AREA: &str = "sync";

struct App {
    controller: Controller<DomHost>,
    timer: TimeoutTimer,
}

type Shared = Rc<RefCell<App>>;

impl App {
    fn new(window: Window, document: Document) -> Shared {
        Rc::new_cyclic(|weak: &Weak<RefCell<Self>>| {
            let events = weak.clone();
            let host = DomHost::new(window, document, move |event| dispatch(&events, event));

            let ticks = weak.clone();
            let timer = TimeoutTimer::new(move |now| on_deadline(&ticks, now));

            let mut controller =
                Controller::new(host, new_identity(), ControllerConfig::extension());
            controller.set_trace_sink(Box::new(ConsoleSink));
            RefCell::new(Self { controller, timer })
        })
    }

    fn rearm(&self) {
        self.timer.arm(self.controller.next_deadline());
    }
}

/// Entry point, called automatically by `wasm_bindgen(start)`.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    if already_loaded(&window)? {
        tracing::debug!("controller script already ran in this frame");
        return Ok(());
    }
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let probe = start_probe(document, ProbeConfig::extension(), move || {
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = boot(window).await {
                tracing::warn!(%err, "controller did not start");
            }
        });
    });

    // Keep the probe alive; it disconnects its watch once it has injected.
    core::mem::forget(probe);

    Ok(())
}

fn already_loaded(window: &Window) -> Result<bool, JsValue> {
    let key = JsValue::from_str(LOADED_FLAG);
    if Reflect::get(window, &key)?.is_truthy() {
        return Ok(true);
    }
    Reflect::set(window, &key, &JsValue::TRUE)?;
    Ok(false)
}

async fn boot(window: Window) -> Result<(), HostError> {
    let hostname = window
        .location()
        .hostname()
        .map_err(|e| HostError::Dom(format!("{e:?}")))?;
    let settings = load_settings(&hostname).await?;
    let document = window
        .document()
        .ok_or_else(|| HostError::Dom(String::from("no document")))?;

    let app = App::new(window, document);
    {
        let mut guard = app.borrow_mut();
        guard.controller.start(now(), &settings, &hostname);
        if guard.controller.lifecycle() != Lifecycle::Running {
            tracing::info!(%hostname, "speed control disabled on this site");
            return Ok(());
        }
    }
    wire(&app)?;
    app.borrow().rearm();

    // Event closures only hold weak references; there is no teardown
    // beyond deactivation.
    core::mem::forget(app);
    Ok(())
}

/// Installs the document, window and `chrome.*` listeners. They are owned by
/// the host's listener set and released when the controller deactivates.
fn wire(app: &Shared) -> Result<(), HostError> {
    let weak = Rc::downgrade(app);
    let mut guard = app.borrow_mut();
    let host = guard.controller.host_mut();
    let window: EventTarget = host.window().clone().into();
    let document: Node = host.document().clone().into();
    let listeners = host.listeners_mut();

    let w = weak.clone();
    listeners.listen(&document, "mousemove", move |event: Event| {
        let Some(mouse) = event.dyn_ref::<MouseEvent>() else {
            return;
        };
        let pointer = Point::new(f64::from(mouse.client_x()), f64::from(mouse.client_y()));
        let path = composed_path(&event);
        with_app(&w, |controller, now| {
            controller.on_pointer_drag(pointer);
            controller.on_pointer_move(now, &path);
        });
    })?;

    let w = weak.clone();
    listeners.listen(&document, "mouseup", move |_| {
        with_app(&w, |controller, now| controller.on_pointer_up(now));
    })?;

    let w = weak.clone();
    listeners.listen(&document, "fullscreenchange", move |_| {
        with_app(&w, |controller, now| controller.on_fullscreen_change(now));
    })?;

    let w = weak.clone();
    listeners.observe_mutations(&document, move || {
        with_app(&w, |controller, now| controller.on_mutation(now));
    })?;

    let w = weak.clone();
    listeners.listen(&window, "message", move |event: Event| {
        let Some(message) = event.dyn_ref::<MessageEvent>() else {
            return;
        };
        if let Some(announcement) = parse_announcement(message.data()) {
            with_app(&w, |controller, now| controller.on_announcement(now, &announcement));
        }
    })?;

    let w = weak.clone();
    listeners.on_runtime_message(move |message: JsValue, respond: Function| {
        let Some(command) = parse_command(message) else {
            return false;
        };
        let reply = with_app(&w, |controller, now| controller.handle_command(now, command));
        if let Some(Some(reply)) = reply {
            match reply_value(reply) {
                Ok(value) => {
                    let _ = respond.call1(&JsValue::NULL, &value);
                }
                Err(err) => tracing::warn!(%err, "could not encode speed reply"),
            }
        }
        false
    })?;

    listeners.on_storage_changed(move |changes: JsValue, area: String| {
        if area != SETTINGS_AREA {
            return;
        }
        if let Some(change) = parse_change(changes) {
            with_app(&weak, |controller, _| controller.on_settings_changed(&change));
        }
    })
}

/// Nodes the event passed through, innermost first. Document-level
/// listeners see shadow-tree targets retargeted to their host; the composed
/// path still starts inside the shadow tree.
fn composed_path(event: &Event) -> Vec<Node> {
    let path: Vec<Node> = event
        .composed_path()
        .iter()
        .filter_map(|target| target.dyn_into::<Node>().ok())
        .collect();
    if !path.is_empty() {
        return path;
    }
    event
        .target()
        .and_then(|target| target.dyn_into::<Node>().ok())
        .into_iter()
        .collect()
}

/// Runs `f` against the controller, then re-arms the deadline timer.
///
/// Returns `None` when the app is gone or already borrowed further up the
/// stack.
fn with_app<R>(
    app: &Weak<RefCell<App>>,
    f: impl FnOnce(&mut Controller<DomHost>, HostTime) -> R,
) -> Option<R> {
    let app = app.upgrade()?;
    let Ok(mut app) = app.try_borrow_mut() else {
        tracing::debug!("controller busy; event dropped");
        return None;
    };
    let result = f(&mut app.controller, now());
    app.rearm();
    Some(result)
}

fn dispatch(app: &Weak<RefCell<App>>, event: HostEvent) {
    with_app(app, |controller, now| match event {
        HostEvent::RateChange(media) => controller.on_rate_change(&media),
        HostEvent::LoadedData(media) => controller.on_media_loaded(&media),
        HostEvent::OverlayAction(action) => controller.on_overlay_action(now, action),
        HostEvent::OverlayPointerDown { pointer, on_button } => {
            controller.on_overlay_pointer_down(pointer, on_button);
        }
    });
}

/// Timer callback: advances the controller and returns the next deadline.
fn on_deadline(app: &Weak<RefCell<App>>, now: HostTime) -> Option<HostTime> {
    let app = app.upgrade()?;
    let Ok(mut app) = app.try_borrow_mut() else {
        return Some(now + BUSY_RETRY);
    };
    app.controller.advance(now);
    app.controller.next_deadline()
}
