// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drives an [`InjectionProbe`] from a [`TimeoutTimer`].
//!
//! Samples use the same shadow-piercing search as the controller. After a
//! window ends without a hit, a `MutationObserver` wakes the probe on the
//! next document change; it disconnects itself once a video is found.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Array;
use kurbo::Size;
use speedctl_core::error::HostError;
use speedctl_core::locate::locate_media;
use speedctl_core::media::ReadyState;
use speedctl_core::probe::{Candidate, InjectionProbe, ProbeConfig, ProbeVerdict};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use web_sys::{Document, HtmlVideoElement, MutationObserver, MutationObserverInit};

use crate::error::dom_error;
use crate::timer::TimeoutTimer;
use crate::tree::{DomTree, Scope};

/// Visible size and readiness of every `<video>` in `document`, including
/// those inside open shadow roots.
#[must_use]
pub fn sample_candidates(document: &Document) -> Vec<Candidate> {
    locate_media(&DomTree, &Scope::Document(document.clone()))
        .iter()
        .filter_map(|media| media.element().dyn_ref::<HtmlVideoElement>())
        .map(|video| Candidate {
            size: Size::new(
                f64::from(video.offset_width()),
                f64::from(video.offset_height()),
            ),
            ready: ReadyState::from_dom(video.ready_state()),
        })
        .collect()
}

/// Starts probing `document` and calls `on_inject` at most once.
///
/// Dropping the returned timer cancels the pending sample; the mutation
/// watch holds its own reference and can start a new window.
pub fn start_probe(
    document: Document,
    config: ProbeConfig,
    on_inject: impl FnOnce() + 'static,
) -> Rc<TimeoutTimer> {
    let probe = Rc::new(RefCell::new(InjectionProbe::new(config)));
    let mut on_inject = Some(on_inject);

    let sampled = Rc::clone(&probe);
    let target = document.clone();
    let timer = Rc::new(TimeoutTimer::new(move |now| {
        let candidates = sample_candidates(&target);
        let verdict = sampled.try_borrow_mut().ok()?.sample(now, &candidates)?;
        match verdict {
            ProbeVerdict::Wait(next) => Some(next),
            ProbeVerdict::Inject => {
                tracing::info!(at = now.millis(), "qualifying video found; starting controller");
                if let Some(inject) = on_inject.take() {
                    inject();
                }
                None
            }
            ProbeVerdict::GiveUp => {
                tracing::debug!(at = now.millis(), "no qualifying video; waiting for changes");
                None
            }
        }
    }));
    timer.arm(Some(crate::now()));

    if let Err(err) = watch_mutations(&document, probe, Rc::clone(&timer)) {
        tracing::warn!(%err, "probe cannot watch for late videos");
    }
    timer
}

/// Re-arms a dormant probe when the document changes.
fn watch_mutations(
    document: &Document,
    probe: Rc<RefCell<InjectionProbe>>,
    timer: Rc<TimeoutTimer>,
) -> Result<(), HostError> {
    let closure = Closure::wrap(Box::new(move |_records: Array, observer: MutationObserver| {
        let Ok(probe) = probe.try_borrow() else {
            return;
        };
        if probe.is_done() {
            observer.disconnect();
        } else if probe.is_dormant() && timer.armed().is_none() {
            timer.arm(Some(crate::now()));
        }
    }) as Box<dyn FnMut(Array, MutationObserver)>);
    let observer = MutationObserver::new(closure.into_js_value().unchecked_ref())
        .map_err(|e| dom_error(&e))?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    init.set_subtree(true);
    observer
        .observe_with_options(document, &init)
        .map_err(|e| dom_error(&e))
}
