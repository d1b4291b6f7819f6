// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `JsValue` errors mapped into [`HostError`] at the boundary.

use speedctl_core::error::HostError;
use wasm_bindgen::{JsCast as _, JsValue};

const INVALIDATED: &str = "Extension context invalidated";

/// Best-effort message for a thrown JS value.
pub(crate) fn describe(err: &JsValue) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{err:?}")
}

/// Wraps `message` with `kind`, except that a torn-down extension context
/// is always reported as [`HostError::ContextInvalidated`].
pub(crate) fn classify(message: String, kind: fn(String) -> HostError) -> HostError {
    if message.contains(INVALIDATED) {
        HostError::ContextInvalidated
    } else {
        kind(message)
    }
}

pub(crate) fn storage_error(err: &JsValue) -> HostError {
    classify(describe(err), HostError::Storage)
}

pub(crate) fn messaging_error(err: &JsValue) -> HostError {
    classify(describe(err), HostError::Messaging)
}

pub(crate) fn dom_error(err: &JsValue) -> HostError {
    classify(describe(err), HostError::Dom)
}
