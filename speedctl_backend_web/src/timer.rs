// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout` deadline source.
//!
//! [`TimeoutTimer`] keeps at most one pending `setTimeout` and fires a
//! callback when the earliest controller deadline elapses. The callback
//! returns the next deadline, which re-arms the timer; returning `None`
//! leaves it idle until [`arm`](TimeoutTimer::arm) is called again.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use speedctl_core::time::HostTime;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// A single re-armable timeout driven by absolute deadlines.
pub struct TimeoutTimer {
    inner: Rc<TimerInner>,
}

type TimerClosure = Closure<dyn FnMut()>;
type TimerCallback = Box<dyn FnMut(HostTime) -> Option<HostTime>>;

struct TimerInner {
    /// Registered with every `setTimeout`. Holds only a weak reference back.
    closure: RefCell<Option<TimerClosure>>,
    callback: RefCell<TimerCallback>,
    /// Handle of the pending timeout.
    pending: Cell<Option<i32>>,
    /// Deadline the pending timeout was scheduled for.
    due: Cell<Option<HostTime>>,
}

impl TimeoutTimer {
    /// Creates an idle timer.
    ///
    /// `callback` receives the current time when a deadline elapses and
    /// returns the next deadline, if any.
    pub fn new(callback: impl FnMut(HostTime) -> Option<HostTime> + 'static) -> Self {
        let inner = Rc::new(TimerInner {
            closure: RefCell::new(None),
            callback: RefCell::new(Box::new(callback)),
            pending: Cell::new(None),
            due: Cell::new(None),
        });

        let weak: Weak<TimerInner> = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.fire();
            }
        }) as Box<dyn FnMut()>);
        *inner.closure.borrow_mut() = Some(closure);

        Self { inner }
    }

    /// Replaces the pending deadline. `None` cancels it.
    ///
    /// Re-arming for the deadline that is already pending is a no-op.
    pub fn arm(&self, deadline: Option<HostTime>) {
        if deadline.is_some() && deadline == self.inner.due.get() {
            return;
        }
        self.inner.clear();
        self.inner.schedule(deadline, crate::now());
    }

    /// The pending deadline, if any.
    #[must_use]
    pub fn armed(&self) -> Option<HostTime> {
        self.inner.due.get()
    }
}

impl TimerInner {
    fn fire(&self) {
        self.pending.set(None);
        self.due.set(None);
        let now = crate::now();
        // A re-entrant fire (callback still running) is dropped; the outer
        // call re-arms on return.
        let Ok(mut callback) = self.callback.try_borrow_mut() else {
            return;
        };
        let next = callback(now);
        drop(callback);
        self.schedule(next, now);
    }

    fn schedule(&self, deadline: Option<HostTime>, now: HostTime) {
        let Some(due) = deadline else {
            return;
        };
        if let Some(ref closure) = *self.closure.borrow() {
            let id = set_timeout(closure.as_ref().unchecked_ref(), delay_millis(now, due));
            self.pending.set(Some(id));
            self.due.set(Some(due));
        }
    }

    fn clear(&self) {
        if let Some(id) = self.pending.take() {
            clear_timeout(id);
        }
        self.due.set(None);
    }
}

impl Drop for TimeoutTimer {
    fn drop(&mut self) {
        self.inner.clear();
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for TimeoutTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeoutTimer")
            .field("due", &self.inner.due.get())
            .finish_non_exhaustive()
    }
}

/// `setTimeout` delay for a deadline. Past deadlines fire immediately.
fn delay_millis(now: HostTime, due: HostTime) -> i32 {
    i32::try_from(due.saturating_duration_since(now).millis()).unwrap_or(i32::MAX)
}
