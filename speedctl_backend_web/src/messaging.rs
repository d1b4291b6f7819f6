// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime messages and the cross-frame arbitration broadcast.

use js_sys::Reflect;
use speedctl_core::arbitration::Announcement;
use speedctl_core::command::{BadgeUpdate, Command, CommandMessage, SpeedReply};
use speedctl_core::error::HostError;
use speedctl_core::speed::Speed;
use wasm_bindgen::{JsCast as _, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Window;

use crate::chrome;
use crate::error::{dom_error, messaging_error};
use crate::storage::to_js;

/// Frame nesting followed when broadcasting.
const MAX_FRAME_DEPTH: u32 = 8;

/// Sends the badge update. Delivery is not awaited.
pub fn notify_badge(speed: Speed) -> Result<(), HostError> {
    let runtime = chrome::runtime()?;
    let message = to_js(&BadgeUpdate::new(speed.get()))?;
    let promise = runtime
        .send_message(&message)
        .map_err(|e| messaging_error(&e))?;
    wasm_bindgen_futures::spawn_local(async move {
        // Rejected when no listener is awake; the next update will retry.
        if let Err(err) = JsFuture::from(promise).await {
            tracing::debug!(error = %messaging_error(&err), "badge update not delivered");
        }
    });
    Ok(())
}

/// Parses a `chrome.runtime.onMessage` payload. Foreign messages give
/// `None`.
#[must_use]
pub fn parse_command(message: JsValue) -> Option<Command> {
    serde_wasm_bindgen::from_value::<CommandMessage>(message)
        .ok()?
        .to_command()
}

/// The `sendResponse` argument for a speed query.
pub fn reply_value(reply: SpeedReply) -> Result<JsValue, HostError> {
    to_js(&reply)
}

/// Posts `announcement` to the top-level window and every frame below it.
pub fn announce(window: &Window, announcement: &Announcement) -> Result<(), HostError> {
    let message = to_js(announcement)?;
    let top = window
        .top()
        .map_err(|e| dom_error(&e))?
        .unwrap_or_else(|| window.clone());
    post_recursive(&top, &message, 0);
    Ok(())
}

fn post_recursive(target: &Window, message: &JsValue, depth: u32) {
    if let Err(err) = target.post_message(message, "*") {
        tracing::debug!(error = %dom_error(&err), "postMessage failed");
    }
    if depth >= MAX_FRAME_DEPTH {
        return;
    }
    let Ok(frames) = target.frames() else {
        return;
    };
    for index in 0..frames.length() {
        // Child windows live in other realms, so `instanceof` checks fail.
        if let Ok(child) = Reflect::get_u32(&frames, index)
            && child.is_object()
        {
            post_recursive(&child.unchecked_into::<Window>(), message, depth + 1);
        }
    }
}

/// Parses a `message` event payload as an arbitration announcement.
#[must_use]
pub fn parse_announcement(data: JsValue) -> Option<Announcement> {
    serde_wasm_bindgen::from_value(data).ok()
}
