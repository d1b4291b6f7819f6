// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registrations that can be released together.
//!
//! Handlers are handed to JS with [`Closure::into_js_value`], so the garbage
//! collector owns them. The set only keeps the JS function handles needed to
//! unregister; once unregistered, nothing references the handler and it is
//! collected.

use js_sys::{Array, Function};
use speedctl_core::error::HostError;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Event, EventTarget, MutationObserver, MutationObserverInit, Node};

use crate::chrome::{self, ChromeEvent};
use crate::error::dom_error;

enum Registration {
    Dom {
        target: EventTarget,
        kind: &'static str,
        function: Function,
    },
    Observer(MutationObserver),
    Chrome {
        event: ChromeEvent,
        function: Function,
    },
}

/// Every listener installed on behalf of one controller.
#[derive(Default)]
pub struct ListenerSet {
    entries: Vec<Registration>,
}

impl core::fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl ListenerSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a DOM event listener.
    pub fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), HostError> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let function: Function = closure.into_js_value().unchecked_into();
        target
            .add_event_listener_with_callback(kind, &function)
            .map_err(|e| dom_error(&e))?;
        self.entries.push(Registration::Dom {
            target: target.clone(),
            kind,
            function,
        });
        Ok(())
    }

    /// Calls `handler` once per batch of child-list mutations anywhere under
    /// `target`.
    pub fn observe_mutations(
        &mut self,
        target: &Node,
        mut handler: impl FnMut() + 'static,
    ) -> Result<(), HostError> {
        let closure = Closure::wrap(Box::new(move |_records: Array, _observer: MutationObserver| {
            handler();
        }) as Box<dyn FnMut(Array, MutationObserver)>);
        let function: Function = closure.into_js_value().unchecked_into();
        let observer = MutationObserver::new(&function).map_err(|e| dom_error(&e))?;
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(target, &init)
            .map_err(|e| dom_error(&e))?;
        self.entries.push(Registration::Observer(observer));
        Ok(())
    }

    /// Listens on `chrome.runtime.onMessage`.
    ///
    /// `handler` receives the message and the `sendResponse` callback and
    /// returns whether it will respond asynchronously.
    pub fn on_runtime_message(
        &mut self,
        handler: impl FnMut(JsValue, Function) -> bool + 'static,
    ) -> Result<(), HostError> {
        let mut handler = handler;
        let closure = Closure::wrap(Box::new(
            move |message: JsValue, _sender: JsValue, respond: Function| handler(message, respond),
        ) as Box<dyn FnMut(JsValue, JsValue, Function) -> bool>);
        self.listen_chrome(chrome::on_runtime_message()?, closure.into_js_value())
    }

    /// Listens on `chrome.storage.onChanged`; `handler` receives the changes
    /// object and the storage area name.
    pub fn on_storage_changed(
        &mut self,
        handler: impl FnMut(JsValue, String) + 'static,
    ) -> Result<(), HostError> {
        let closure =
            Closure::wrap(Box::new(handler) as Box<dyn FnMut(JsValue, String)>);
        self.listen_chrome(chrome::on_storage_changed()?, closure.into_js_value())
    }

    fn listen_chrome(&mut self, event: ChromeEvent, function: JsValue) -> Result<(), HostError> {
        let function: Function = function.unchecked_into();
        event.add_listener(&function);
        self.entries.push(Registration::Chrome { event, function });
        Ok(())
    }

    /// Unregisters everything.
    pub fn release(&mut self) {
        for entry in self.entries.drain(..) {
            match entry {
                Registration::Dom {
                    target,
                    kind,
                    function,
                } => {
                    let _ = target.remove_event_listener_with_callback(kind, &function);
                }
                Registration::Observer(observer) => observer.disconnect(),
                Registration::Chrome { event, function } => event.remove_listener(&function),
            }
        }
    }
}
