// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `chrome.storage.sync` reads, writes and change parsing.

use js_sys::{Array, Reflect};
use serde::Serialize;
use speedctl_core::error::HostError;
use speedctl_core::settings::{
    OverlayPosition, STARTUP_KEYS, SettingsChange, SettingsPatch, StoredSettings, position_key,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::chrome;
use crate::error::storage_error;

/// Reads everything the controller needs at startup for `hostname`.
///
/// A malformed record is logged and replaced by defaults; only an
/// unreachable store is an error.
pub async fn load_settings(hostname: &str) -> Result<StoredSettings, HostError> {
    let area = chrome::storage_sync()?;
    let key = position_key(hostname);
    let keys: Array = STARTUP_KEYS.iter().map(|k| JsValue::from_str(k)).collect();
    keys.push(&JsValue::from_str(&key));

    let promise = area.get(&keys).map_err(|e| storage_error(&e))?;
    let items = JsFuture::from(promise)
        .await
        .map_err(|e| storage_error(&e))?;

    let mut settings = serde_wasm_bindgen::from_value::<StoredSettings>(items.clone())
        .unwrap_or_else(|err| {
            tracing::warn!(%err, "malformed settings; using defaults");
            StoredSettings::default()
        });
    settings.overlay_position = stored_position(&items, &key);
    Ok(settings)
}

fn stored_position(items: &JsValue, key: &str) -> Option<OverlayPosition> {
    let value = Reflect::get(items, &JsValue::from_str(key)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|err| tracing::warn!(%err, key, "ignoring malformed overlay position"))
        .ok()
}

/// Starts writing `patch`. Completion is not awaited; a late failure is
/// logged.
pub fn write(patch: &SettingsPatch) -> Result<(), HostError> {
    let area = chrome::storage_sync()?;
    let items = to_js(patch)?;
    let promise = area.set(&items).map_err(|e| storage_error(&e))?;
    let key = patch.key();
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(err) = JsFuture::from(promise).await {
            tracing::debug!(key = %key, error = %storage_error(&err), "settings write failed");
        }
    });
    Ok(())
}

/// Parses the `changes` argument of `chrome.storage.onChanged`.
#[must_use]
pub fn parse_change(changes: JsValue) -> Option<SettingsChange> {
    serde_wasm_bindgen::from_value(changes).ok()
}

/// Serializes `value` as plain JS objects and numbers.
pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, HostError> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| HostError::Encode(err.to_string()))
}
