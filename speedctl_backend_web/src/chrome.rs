// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal `chrome.*` extension API bindings.
//!
//! The objects are looked up through `globalThis.chrome` on every use: once
//! the extension is reloaded or removed, the namespace disappears from
//! already-injected pages and every lookup reports
//! [`HostError::ContextInvalidated`].

use js_sys::{Function, Promise, Reflect};
use speedctl_core::error::HostError;
use wasm_bindgen::prelude::*;

use crate::error::dom_error;

#[wasm_bindgen]
extern "C" {
    /// `chrome.storage.StorageArea`.
    #[derive(Clone, Debug)]
    pub(crate) type StorageArea;

    #[wasm_bindgen(method, catch)]
    pub(crate) fn get(this: &StorageArea, keys: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    pub(crate) fn set(this: &StorageArea, items: &JsValue) -> Result<Promise, JsValue>;

    /// `chrome.runtime`.
    #[derive(Clone, Debug)]
    pub(crate) type Runtime;

    #[wasm_bindgen(method, getter)]
    pub(crate) fn id(this: &Runtime) -> Option<String>;

    #[wasm_bindgen(method, catch, js_name = sendMessage)]
    pub(crate) fn send_message(this: &Runtime, message: &JsValue) -> Result<Promise, JsValue>;

    /// A `chrome.events.Event` such as `runtime.onMessage`.
    #[derive(Clone, Debug)]
    pub(crate) type ChromeEvent;

    #[wasm_bindgen(method, js_name = addListener)]
    pub(crate) fn add_listener(this: &ChromeEvent, callback: &Function);

    #[wasm_bindgen(method, js_name = removeListener)]
    pub(crate) fn remove_listener(this: &ChromeEvent, callback: &Function);
}

fn lookup(path: &[&str]) -> Result<JsValue, HostError> {
    let mut value: JsValue = js_sys::global().into();
    for key in path {
        value = Reflect::get(&value, &JsValue::from_str(key)).map_err(|e| dom_error(&e))?;
        if value.is_undefined() || value.is_null() {
            return Err(HostError::ContextInvalidated);
        }
    }
    Ok(value)
}

pub(crate) fn storage_sync() -> Result<StorageArea, HostError> {
    lookup(&["chrome", "storage", "sync"]).map(JsCast::unchecked_into)
}

/// `chrome.runtime`, only while the extension context is alive.
pub(crate) fn runtime() -> Result<Runtime, HostError> {
    let runtime: Runtime = lookup(&["chrome", "runtime"])?.unchecked_into();
    if runtime.id().is_none() {
        return Err(HostError::ContextInvalidated);
    }
    Ok(runtime)
}

pub(crate) fn on_runtime_message() -> Result<ChromeEvent, HostError> {
    lookup(&["chrome", "runtime", "onMessage"]).map(JsCast::unchecked_into)
}

pub(crate) fn on_storage_changed() -> Result<ChromeEvent, HostError> {
    lookup(&["chrome", "storage", "onChanged"]).map(JsCast::unchecked_into)
}
