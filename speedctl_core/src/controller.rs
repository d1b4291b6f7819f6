// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-document controller.
//!
//! A [`Controller`] owns every piece of per-document state: the rate
//! enforcer, the overlay, the arbiter, the detection loop and the active
//! container list. It is driven entirely by its entry points, each of which
//! takes the current [`HostTime`]:
//!
//! ```text
//!   host event ──► Controller::on_*() ──┐
//!                                       ├──► Host calls (DOM, store, badge)
//!   timer ──────► Controller::advance() ┘
//!                       ▲
//!                       └── Controller::next_deadline()
//! ```
//!
//! # Lifecycle
//!
//! ```text
//!   Idle ──start()──► Running ──HUD_CREATED from newer──► Deactivated
//!     └──start() on excluded site──► Disabled
//! ```
//!
//! `Disabled` and `Deactivated` are terminal. In either, every entry point
//! returns immediately.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Point;

use crate::arbitration::{Announcement, Arbiter, InstanceIdentity, Verdict};
use crate::command::{Command, SpeedReply};
use crate::config::ControllerConfig;
use crate::debounce::Throttle;
use crate::detect::DetectionLoop;
use crate::enforce::RateEnforcer;
use crate::error::{HostError, HostOp};
use crate::host::Host;
use crate::media::{Media, seek_by};
use crate::overlay::{Overlay, OverlayPhase};
use crate::settings::{
    DEFAULT_SKIP_SECONDS, DEFAULT_SPEED_STEP, SettingsChange, SettingsPatch, StoredSettings,
    positive_or,
};
use crate::speed::Speed;
use crate::time::{HostTime, earliest};
use crate::trace::{
    ArbitrationEvent, CommandEvent, DetectionEvent, DetectionTrigger, HostErrorEvent,
    OverlayEvent, OverlayTransition, SpeedAppliedEvent, SpeedCause, TraceSink, Tracer,
};

/// Controller lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Constructed, not started.
    Idle,
    /// Started and active.
    Running,
    /// Started on an excluded site; does nothing.
    Disabled,
    /// Lost arbitration; does nothing.
    Deactivated,
}

/// Buttons on the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverlayAction {
    /// Step the speed up.
    Increase,
    /// Step the speed down.
    Decrease,
    /// Back to normal speed.
    Reset,
    /// Seek back by the skip amount.
    Replay,
    /// Seek forward by the skip amount.
    Skip,
}

/// Per-document media-control controller.
pub struct Controller<H: Host> {
    host: H,
    config: ControllerConfig,
    lifecycle: Lifecycle,
    hostname: String,
    speed_step: f64,
    skip_seconds: f64,
    enforcer: RateEnforcer,
    overlay: Overlay,
    arbiter: Arbiter,
    detection: DetectionLoop,
    pointer: Throttle,
    containers: Vec<H::Node>,
    sink: Option<Box<dyn TraceSink>>,
}

impl<H: Host> core::fmt::Debug for Controller<H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("lifecycle", &self.lifecycle)
            .field("hostname", &self.hostname)
            .field("desired", &self.enforcer.desired())
            .field("overlay", &self.overlay.phase())
            .field("identity", &self.arbiter.local())
            .finish_non_exhaustive()
    }
}

impl<H: Host> Controller<H> {
    /// Creates an idle controller.
    #[must_use]
    pub fn new(host: H, identity: InstanceIdentity, config: ControllerConfig) -> Self {
        Self {
            host,
            config,
            lifecycle: Lifecycle::Idle,
            hostname: String::new(),
            speed_step: DEFAULT_SPEED_STEP,
            skip_seconds: DEFAULT_SKIP_SECONDS,
            enforcer: RateEnforcer::new(config.speed_debounce),
            overlay: Overlay::new(),
            arbiter: Arbiter::new(identity),
            detection: DetectionLoop::new(config.mutation_debounce, config.fullscreen_debounce),
            pointer: Throttle::new(config.pointer_throttle),
            containers: Vec::new(),
            sink: None,
        }
    }

    /// Installs a trace sink. Events are only delivered with the `trace`
    /// feature.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// This instance's arbitration identity.
    #[must_use]
    pub const fn identity(&self) -> InstanceIdentity {
        self.arbiter.local()
    }

    /// Overlay phase.
    #[must_use]
    pub const fn overlay_phase(&self) -> OverlayPhase {
        self.overlay.phase()
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Current desired speed. No side effects.
    #[must_use]
    pub const fn desired_speed(&self) -> Speed {
        self.enforcer.desired()
    }

    fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Starts the controller. Calling it again is a no-op.
    ///
    /// On an excluded hostname the controller becomes [`Lifecycle::Disabled`]
    /// and does nothing else. Otherwise the stored speed is seeded (without
    /// persisting and without counting as a user choice), the first detection
    /// pass runs and the badge is told the starting speed.
    pub fn start(&mut self, now: HostTime, settings: &StoredSettings, hostname: &str) {
        if self.lifecycle != Lifecycle::Idle {
            return;
        }
        if settings.is_excluded(hostname) {
            self.lifecycle = Lifecycle::Disabled;
            return;
        }
        self.lifecycle = Lifecycle::Running;
        self.hostname = String::from(hostname);
        self.speed_step = settings.speed_step();
        self.skip_seconds = settings.skip_seconds();
        if let Some(position) = settings.overlay_position {
            self.overlay.set_position(position);
        }

        let speed = settings.initial_speed(hostname);
        self.enforcer.seed(speed);
        let pass = self.detection_pass(now, DetectionTrigger::Startup);
        if self.enforcer.should_seed() {
            let e = SpeedAppliedEvent {
                at: now,
                speed,
                applied: pass.seeded,
                skipped: pass.newly_claimed - pass.seeded,
                cause: SpeedCause::Startup,
            };
            self.tracer().speed_applied(&e);
        }
        let notified = self.host.notify_speed(speed);
        self.absorb(HostOp::Notify, notified);
    }

    /// Earliest pending deadline across all timers.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        if !self.is_running() {
            return None;
        }
        earliest(
            earliest(self.enforcer.deadline(), self.detection.deadline()),
            self.overlay.hide_deadline(),
        )
    }

    /// Fires every timer that is due at `now`.
    pub fn advance(&mut self, now: HostTime) {
        if !self.is_running() {
            return;
        }
        if let Some(speed) = self.enforcer.poll(now) {
            self.commit_speed(now, speed);
        }
        if let Some(trigger) = self.detection.poll(now) {
            self.detection_pass(now, trigger);
        }
        if self.overlay.poll(now) {
            self.host.set_overlay_visible(false);
            self.trace_overlay(now, OverlayTransition::Hidden);
        }
    }

    // -----------------------------------------------------------------------
    // Speed
    // -----------------------------------------------------------------------

    /// Requests an absolute speed; debounced, last call wins.
    pub fn request_speed(&mut self, now: HostTime, requested: f64) {
        if self.is_running() {
            self.enforcer.request(now, requested);
        }
    }

    fn request_step(&mut self, now: HostTime, delta: f64) {
        if self.is_running() {
            self.enforcer.request_step(now, delta);
        }
    }

    /// Handles an inbound command. Only [`Command::GetSpeed`] replies.
    pub fn handle_command(&mut self, now: HostTime, command: Command) -> Option<SpeedReply> {
        if !self.is_running() {
            return None;
        }
        self.tracer().command(&CommandEvent { at: now, command });
        match command {
            Command::GetSpeed => {
                return Some(SpeedReply {
                    speed: self.enforcer.desired().get(),
                });
            }
            Command::SetSpeed(speed) => self.request_speed(now, speed),
            Command::IncreaseSpeed => self.request_step(now, self.speed_step),
            Command::DecreaseSpeed => self.request_step(now, -self.speed_step),
            Command::ResetSpeed => self.request_speed(now, Speed::NORMAL.get()),
        }
        None
    }

    fn commit_speed(&mut self, now: HostTime, speed: Speed) {
        let media = self.host.locate_media();
        let report = self.enforcer.apply_all(&media);
        let e = SpeedAppliedEvent {
            at: now,
            speed,
            applied: report.applied,
            skipped: report.skipped,
            cause: SpeedCause::UserRequest,
        };
        self.tracer().speed_applied(&e);

        let persisted = self.host.persist(SettingsPatch::GlobalSpeed(speed));
        self.absorb(HostOp::Persist, persisted);
        let notified = self.host.notify_speed(speed);
        self.absorb(HostOp::Notify, notified);

        if self.overlay.phase().exists() {
            self.host.set_overlay_label(&speed.label());
        }
        self.show_overlay(now);
    }

    // -----------------------------------------------------------------------
    // Media events
    // -----------------------------------------------------------------------

    /// Native `ratechange` on a claimed element.
    pub fn on_rate_change(&mut self, media: &H::Media) {
        if self.is_running() {
            self.enforcer.on_rate_change(media);
        }
    }

    /// Native `loadeddata` on a claimed element.
    pub fn on_media_loaded(&mut self, media: &H::Media) {
        if self.is_running() {
            self.enforcer.seed_element(media);
        }
    }

    // -----------------------------------------------------------------------
    // Detection
    // -----------------------------------------------------------------------

    /// A batch of document mutations was observed.
    pub fn on_mutation(&mut self, now: HostTime) {
        if self.is_running() {
            self.detection.on_mutation(now);
        }
    }

    /// The document entered or left fullscreen.
    pub fn on_fullscreen_change(&mut self, now: HostTime) {
        if self.is_running() {
            self.detection.on_fullscreen_change(now);
        }
    }

    fn detection_pass(&mut self, now: HostTime, trigger: DetectionTrigger) -> PassReport {
        let media = self.host.locate_media();
        let mut report = PassReport::default();
        for m in &media {
            if !m.claim() {
                continue;
            }
            report.newly_claimed += 1;
            let attached = self.host.attach_media_listeners(m);
            self.absorb(HostOp::AttachListeners, attached);
            if self.enforcer.seed_element(m) {
                report.seeded += 1;
            }
        }

        let mut containers: Vec<H::Node> = Vec::with_capacity(media.len());
        for m in &media {
            if let Some(c) = self.host.interactive_container(m, self.config.container_selectors)
                && !containers.contains(&c)
            {
                containers.push(c);
            }
        }
        self.containers = containers;
        self.detection.record_pass();

        let e = DetectionEvent {
            at: now,
            trigger,
            media: media.len(),
            newly_claimed: report.newly_claimed,
            containers: self.containers.len(),
        };
        self.tracer().detection(&e);

        if !media.is_empty() && self.overlay.phase() == OverlayPhase::Absent {
            self.create_overlay(now);
        }
        report
    }

    /// Number of interactive containers from the last detection pass.
    #[must_use]
    pub fn active_containers(&self) -> usize {
        self.containers.len()
    }

    // -----------------------------------------------------------------------
    // Overlay
    // -----------------------------------------------------------------------

    fn create_overlay(&mut self, now: HostTime) {
        if let Err(error) = self.host.create_overlay() {
            self.absorb(HostOp::CreateOverlay, Err(error));
            return;
        }
        self.overlay.create();
        self.host.set_overlay_position(self.overlay.position());
        self.host.set_overlay_label(&self.enforcer.desired().label());
        self.trace_overlay(now, OverlayTransition::Created);

        let announcement = self.arbiter.local().announcement();
        let announced = self.host.announce(&announcement);
        self.absorb(HostOp::Announce, announced);
    }

    fn show_overlay(&mut self, now: HostTime) {
        if self.overlay.show() {
            self.host.set_overlay_visible(true);
            self.trace_overlay(now, OverlayTransition::Shown);
        }
        self.overlay.schedule_hide(now, self.config.hide_delay);
    }

    /// Pointer moved. `path` is the event's composed path, innermost node
    /// first, so targets inside shadow trees are seen before retargeting.
    ///
    /// Throttled; reveals the overlay when any node on the path is inside an
    /// active container or the overlay itself.
    pub fn on_pointer_move(&mut self, now: HostTime, path: &[H::Node]) {
        if !self.is_running() || !self.overlay.phase().exists() || !self.pointer.admit(now) {
            return;
        }
        let over = path.iter().any(|target| {
            self.host.overlay_contains(target)
                || self.containers.iter().any(|c| self.host.contains(c, target))
        });
        if over {
            self.show_overlay(now);
        }
    }

    /// Pointer pressed on the overlay. Presses on a button never start a
    /// drag.
    pub fn on_overlay_pointer_down(&mut self, pointer: Point, on_button: bool) {
        if !self.is_running() || on_button {
            return;
        }
        let origin = self.host.overlay_rect().origin();
        self.overlay.begin_drag(pointer, origin);
    }

    /// Pointer moved while a drag may be in progress.
    pub fn on_pointer_drag(&mut self, pointer: Point) {
        if !self.is_running() || !self.overlay.is_dragging() {
            return;
        }
        let size = self.host.overlay_rect().size();
        let viewport = self.host.viewport();
        if let Some(position) = self.overlay.drag_to(pointer, size, viewport) {
            self.host.set_overlay_position(position);
        }
    }

    /// Pointer released. Ends a drag and persists the position for this
    /// hostname.
    pub fn on_pointer_up(&mut self, now: HostTime) {
        if !self.is_running() {
            return;
        }
        let Some(position) = self.overlay.end_drag() else {
            return;
        };
        let patch = SettingsPatch::OverlayPosition {
            hostname: self.hostname.clone(),
            position,
        };
        let persisted = self.host.persist(patch);
        self.absorb(HostOp::Persist, persisted);
        self.trace_overlay(now, OverlayTransition::Moved);
    }

    /// An overlay button was clicked.
    pub fn on_overlay_action(&mut self, now: HostTime, action: OverlayAction) {
        if !self.is_running() {
            return;
        }
        match action {
            OverlayAction::Increase => self.request_step(now, self.speed_step),
            OverlayAction::Decrease => self.request_step(now, -self.speed_step),
            OverlayAction::Reset => self.request_speed(now, Speed::NORMAL.get()),
            OverlayAction::Replay => self.skip_by(now, -self.skip_seconds),
            OverlayAction::Skip => self.skip_by(now, self.skip_seconds),
        }
    }

    fn skip_by(&mut self, now: HostTime, offset: f64) {
        for m in self.host.locate_media() {
            seek_by(&m, offset);
        }
        self.show_overlay(now);
    }

    // -----------------------------------------------------------------------
    // Arbitration & settings
    // -----------------------------------------------------------------------

    /// An arbitration message arrived on the broadcast channel.
    pub fn on_announcement(&mut self, now: HostTime, announcement: &Announcement) {
        if !self.is_running() {
            return;
        }
        if let Verdict::Yield(winner) = self.arbiter.judge(announcement) {
            self.deactivate(now, winner);
        }
    }

    fn deactivate(&mut self, now: HostTime, winner: InstanceIdentity) {
        if self.overlay.remove() {
            self.host.remove_overlay();
            self.trace_overlay(now, OverlayTransition::Removed);
        }
        self.enforcer.cancel();
        self.detection.cancel();
        self.containers.clear();
        self.host.release();
        self.lifecycle = Lifecycle::Deactivated;
        let e = ArbitrationEvent {
            local: self.arbiter.local(),
            winner,
        };
        self.tracer().arbitration(&e);
    }

    /// The settings store reported a change.
    pub fn on_settings_changed(&mut self, change: &SettingsChange) {
        if !self.is_running() {
            return;
        }
        if let Some(step) = &change.speed_step {
            self.speed_step = positive_or(step.new_value, DEFAULT_SPEED_STEP);
        }
        if let Some(skip) = &change.skip_amount {
            self.skip_seconds = positive_or(skip.new_value, DEFAULT_SKIP_SECONDS);
        }
    }

    // -----------------------------------------------------------------------
    // Tracing
    // -----------------------------------------------------------------------

    fn tracer(&mut self) -> Tracer<'_> {
        Tracer::new(self.sink.as_deref_mut().map(|s| s as &mut dyn TraceSink))
    }

    fn trace_overlay(&mut self, at: HostTime, transition: OverlayTransition) {
        self.tracer().overlay(&OverlayEvent { at, transition });
    }

    fn absorb(&mut self, op: HostOp, result: Result<(), HostError>) {
        if let Err(error) = result {
            self.tracer().host_error(&HostErrorEvent { op, error: &error });
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct PassReport {
    newly_claimed: usize,
    seeded: usize,
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    use kurbo::{Rect, Size};

    use super::*;
    use crate::media::ReadyState;
    use crate::media::fake::FakeMedia;
    use crate::settings::{ChangedValue, OverlayPosition};
    use crate::time::Duration;

    const OVERLAY_NODE: u32 = 9_999;

    /// Node ids: `100 + media id` is a media element's container; its
    /// descendants are `1000 * container + n`.
    #[derive(Debug, Default)]
    struct FakeHost {
        media: Vec<FakeMedia>,
        fail_create: u32,
        fail_persist: bool,
        created: u32,
        removed: u32,
        released: u32,
        visible: bool,
        position: Option<OverlayPosition>,
        label: String,
        attached: Vec<u32>,
        persisted: Vec<SettingsPatch>,
        notified: Vec<Speed>,
        announced: Vec<Announcement>,
    }

    impl FakeHost {
        fn with_media(media: &[FakeMedia]) -> Self {
            Self {
                media: media.to_vec(),
                ..Self::default()
            }
        }
    }

    impl Host for FakeHost {
        type Media = FakeMedia;
        type Node = u32;

        fn locate_media(&self) -> Vec<FakeMedia> {
            self.media.clone()
        }

        fn interactive_container(&self, media: &FakeMedia, _selectors: &[&str]) -> Option<u32> {
            Some(100 + media.id())
        }

        fn attach_media_listeners(&mut self, media: &FakeMedia) -> Result<(), HostError> {
            self.attached.push(media.id());
            Ok(())
        }

        fn contains(&self, container: &u32, target: &u32) -> bool {
            target == container || target / 1000 == *container
        }

        fn overlay_contains(&self, target: &u32) -> bool {
            *target == OVERLAY_NODE
        }

        fn create_overlay(&mut self) -> Result<(), HostError> {
            if self.fail_create > 0 {
                self.fail_create -= 1;
                return Err(HostError::Dom(String::from("body not ready")));
            }
            self.created += 1;
            Ok(())
        }

        fn set_overlay_visible(&mut self, visible: bool) {
            self.visible = visible;
        }

        fn set_overlay_position(&mut self, position: OverlayPosition) {
            self.position = Some(position);
        }

        fn set_overlay_label(&mut self, label: &str) {
            self.label = String::from(label);
        }

        fn overlay_rect(&self) -> Rect {
            let p = self.position.unwrap_or(OverlayPosition::DEFAULT);
            Rect::from_origin_size(Point::new(p.left, p.top), Size::new(200.0, 40.0))
        }

        fn viewport(&self) -> Size {
            Size::new(800.0, 600.0)
        }

        fn remove_overlay(&mut self) {
            self.removed += 1;
        }

        fn persist(&mut self, patch: SettingsPatch) -> Result<(), HostError> {
            if self.fail_persist {
                return Err(HostError::ContextInvalidated);
            }
            self.persisted.push(patch);
            Ok(())
        }

        fn notify_speed(&mut self, speed: Speed) -> Result<(), HostError> {
            self.notified.push(speed);
            Ok(())
        }

        fn announce(&mut self, announcement: &Announcement) -> Result<(), HostError> {
            self.announced.push(*announcement);
            Ok(())
        }

        fn release(&mut self) {
            self.released += 1;
        }
    }

    fn controller(media: &[FakeMedia]) -> Controller<FakeHost> {
        controller_with_identity(media, InstanceIdentity::new(1, 1_000))
    }

    fn controller_with_identity(media: &[FakeMedia], id: InstanceIdentity) -> Controller<FakeHost> {
        Controller::new(FakeHost::with_media(media), id, ControllerConfig::extension())
    }

    fn started(media: &[FakeMedia]) -> Controller<FakeHost> {
        let mut c = controller(media);
        c.start(HostTime(0), &StoredSettings::default(), "example.com");
        c
    }

    /// Runs every due timer up to and including `until`, like the host's
    /// single re-armed timeout would.
    fn run_until(c: &mut Controller<FakeHost>, until: HostTime) {
        while let Some(due) = c.next_deadline() {
            if due > until {
                break;
            }
            c.advance(due);
        }
    }

    #[test]
    fn start_is_idempotent() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        c.start(HostTime(10), &StoredSettings::default(), "example.com");
        assert_eq!(c.host().created, 1, "one overlay");
        assert_eq!(c.host().attached, vec![1], "listeners attached once");
        assert_eq!(c.host().announced.len(), 1, "one announcement");
        assert_eq!(c.host().notified, vec![Speed::NORMAL], "badge told once");
    }

    #[test]
    fn excluded_site_stays_disabled() {
        let m = FakeMedia::new(1);
        let mut c = controller(&[m.clone()]);
        let settings: StoredSettings =
            serde_json::from_str(r#"{"excludedSites":["example.com"]}"#).expect("settings");
        c.start(HostTime(0), &settings, "example.com");
        assert_eq!(c.lifecycle(), Lifecycle::Disabled, "disabled");
        c.request_speed(HostTime(0), 2.0);
        run_until(&mut c, HostTime(10_000));
        assert_eq!(c.host().created, 0, "no overlay");
        assert_eq!(m.rate_writes(), 0, "media untouched");
        assert!(c.host().persisted.is_empty(), "nothing written");
    }

    #[test]
    fn startup_seeds_stored_speed_without_persisting() {
        let m = FakeMedia::new(1);
        let mut c = controller(&[m.clone()]);
        let settings: StoredSettings = serde_json::from_str(
            r#"{"videoSpeed":1.5,"siteRules":{"example.com":2.25}}"#,
        )
        .expect("settings");
        c.start(HostTime(0), &settings, "example.com");
        assert_eq!(m.playback_rate(), 2.25, "site rule applied");
        assert_eq!(c.desired_speed().get(), 2.25, "desired");
        assert!(c.host().persisted.is_empty(), "startup never persists");
        assert_eq!(c.host().label, "2.25x", "label rendered");

        m.0.playing.set(true);
        m.page_sets_rate(1.0);
        c.on_rate_change(&m);
        assert_eq!(m.playback_rate(), 1.0, "no enforcement before a user choice");
    }

    #[test]
    fn normal_speed_leaves_untouched_pages_alone() {
        let m = FakeMedia::new(1);
        m.page_sets_rate(1.5);
        let _c = started(&[m.clone()]);
        assert_eq!(m.playback_rate(), 1.5, "page's own rate kept");
        assert_eq!(m.rate_writes(), 0, "never written");
    }

    #[test]
    fn debounced_request_persists_and_notifies_once() {
        let a = FakeMedia::new(1);
        let b = FakeMedia::new(2);
        let mut c = started(&[a.clone(), b.clone()]);
        c.request_speed(HostTime(1000), 1.5);
        c.request_speed(HostTime(1010), 1.75);
        c.request_speed(HostTime(1020), 2.0);
        assert_eq!(c.next_deadline(), Some(HostTime(1070)), "50ms after the last");
        run_until(&mut c, HostTime(1100));

        assert_eq!(a.playback_rate(), 2.0, "a updated");
        assert_eq!(b.playback_rate(), 2.0, "b updated");
        assert_eq!(
            c.host().persisted,
            vec![SettingsPatch::GlobalSpeed(Speed::clamped(2.0))],
            "one write"
        );
        assert_eq!(c.host().notified.len(), 2, "startup notify plus one");
        assert_eq!(c.host().label, "2.00x", "label refreshed");
        assert!(c.host().visible, "overlay shown");
    }

    #[test]
    fn requests_are_clamped() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m.clone()]);
        c.request_speed(HostTime(0), 0.01);
        run_until(&mut c, HostTime(100));
        assert_eq!(c.desired_speed().get(), 0.1, "lower bound");
        c.request_speed(HostTime(200), 99.0);
        run_until(&mut c, HostTime(300));
        assert_eq!(m.playback_rate(), 16.0, "upper bound");
    }

    #[test]
    fn unready_media_is_skipped_then_seeded_on_load() {
        let m = FakeMedia::new(1).with_ready(ReadyState::HaveNothing);
        let mut c = started(&[m.clone()]);
        c.request_speed(HostTime(0), 1.5);
        run_until(&mut c, HostTime(100));
        assert_eq!(m.playback_rate(), 1.0, "not ready yet");

        m.0.ready.set(ReadyState::HaveEnoughData);
        c.on_media_loaded(&m);
        assert_eq!(m.playback_rate(), 1.5, "seeded on loadeddata");
    }

    #[test]
    fn page_rate_change_is_reverted_after_user_choice() {
        let m = FakeMedia::new(1);
        m.0.playing.set(true);
        let mut c = started(&[m.clone()]);
        c.request_speed(HostTime(0), 1.75);
        run_until(&mut c, HostTime(100));
        m.page_sets_rate(1.0);
        c.on_rate_change(&m);
        assert_eq!(m.playback_rate(), 1.75, "restored");
    }

    #[test]
    fn commands_route_to_enforcer() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m.clone()]);
        assert_eq!(
            c.handle_command(HostTime(0), Command::GetSpeed),
            Some(SpeedReply { speed: 1.0 }),
            "cached speed"
        );
        assert_eq!(c.handle_command(HostTime(0), Command::IncreaseSpeed), None, "no reply");
        c.handle_command(HostTime(10), Command::IncreaseSpeed);
        run_until(&mut c, HostTime(100));
        assert_eq!(c.desired_speed().get(), 1.2, "two steps accumulate");

        c.handle_command(HostTime(200), Command::SetSpeed(3.0));
        c.handle_command(HostTime(210), Command::DecreaseSpeed);
        run_until(&mut c, HostTime(300));
        assert_eq!(c.desired_speed().get(), 2.9, "step from pending target");

        c.handle_command(HostTime(400), Command::ResetSpeed);
        run_until(&mut c, HostTime(500));
        assert_eq!(m.playback_rate(), 1.0, "reset");
    }

    #[test]
    fn step_follows_settings_changes() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        let change = SettingsChange {
            speed_step: Some(ChangedValue {
                new_value: Some(0.5),
            }),
            skip_amount: None,
        };
        c.on_settings_changed(&change);
        c.on_overlay_action(HostTime(0), OverlayAction::Increase);
        run_until(&mut c, HostTime(100));
        assert_eq!(c.desired_speed().get(), 1.5, "new step");
    }

    #[test]
    fn overlay_visibility_timing() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        let inside = 101 * 1000 + 7;
        let elsewhere = 42;

        c.on_pointer_move(HostTime(0), &[elsewhere]);
        assert!(!c.host().visible, "outside every container");

        c.on_pointer_move(HostTime(200), &[inside]);
        assert!(c.host().visible, "shown over the container");
        c.on_pointer_move(HostTime(4200), &[OVERLAY_NODE]);
        run_until(&mut c, HostTime(5200));
        assert!(c.host().visible, "first timer was replaced");
        run_until(&mut c, HostTime(9199));
        assert!(c.host().visible, "not yet");
        run_until(&mut c, HostTime(9200));
        assert!(!c.host().visible, "hidden 5000ms after the last move");
    }

    #[test]
    fn pointer_moves_are_throttled() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        c.on_pointer_move(HostTime(0), &[42]);
        c.on_pointer_move(HostTime(50), &[101]);
        assert!(!c.host().visible, "second sample dropped");
        c.on_pointer_move(HostTime(100), &[101]);
        assert!(c.host().visible, "next window admitted");
    }

    #[test]
    fn pointer_matches_anywhere_on_the_composed_path() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        let shadow_host = 42;
        let inside_shadow = 101 * 1000 + 3;

        assert_eq!(c.active_containers(), 1, "one player");
        c.on_pointer_move(HostTime(0), &[shadow_host, 43]);
        assert!(!c.host().visible, "no node inside a container");
        c.on_pointer_move(HostTime(100), &[]);
        assert!(!c.host().visible, "empty path");
        c.on_pointer_move(HostTime(200), &[shadow_host, inside_shadow]);
        assert!(c.host().visible, "matched through a later path node");
    }

    #[test]
    fn skip_clamps_and_shows_overlay() {
        let a = FakeMedia::new(1);
        let live = FakeMedia::new(2);
        live.0.duration.set(f64::INFINITY);
        live.0.time.set(30.0);
        let mut c = started(&[a.clone(), live.clone()]);

        c.on_overlay_action(HostTime(0), OverlayAction::Replay);
        assert_eq!(a.current_time(), 0.0, "clamped at zero");
        c.on_overlay_action(HostTime(0), OverlayAction::Skip);
        assert_eq!(a.current_time(), 5.0, "forward");
        a.set_current_time(98.0);
        c.on_overlay_action(HostTime(0), OverlayAction::Skip);
        assert_eq!(a.current_time(), 100.0, "clamped at duration");
        assert_eq!(live.current_time(), 30.0, "live stream untouched");
        assert!(c.host().visible, "overlay shown");
        assert_eq!(c.next_deadline(), Some(HostTime(5000)), "hide timer armed");
    }

    #[test]
    fn drag_persists_final_position() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        c.on_overlay_pointer_down(Point::new(15.0, 15.0), true);
        c.on_pointer_drag(Point::new(300.0, 300.0));
        assert_eq!(c.host().position, Some(OverlayPosition::DEFAULT), "buttons never drag");

        c.on_overlay_pointer_down(Point::new(15.0, 15.0), false);
        c.on_pointer_drag(Point::new(105.0, 55.0));
        c.on_pointer_drag(Point::new(5000.0, 55.0));
        c.on_pointer_up(HostTime(0));
        let expected = OverlayPosition {
            top: 50.0,
            left: 600.0,
        };
        assert_eq!(c.host().position, Some(expected), "clamped into the viewport");
        assert_eq!(
            c.host().persisted,
            vec![SettingsPatch::OverlayPosition {
                hostname: String::from("example.com"),
                position: expected,
            }],
            "persisted per hostname"
        );
        c.on_pointer_up(HostTime(10));
        assert_eq!(c.host().persisted.len(), 1, "no drag, no write");
    }

    #[test]
    fn stored_position_is_applied_on_creation() {
        let m = FakeMedia::new(1);
        let mut c = controller(&[m]);
        let stored = OverlayPosition {
            top: 120.0,
            left: 33.0,
        };
        let settings = StoredSettings {
            overlay_position: Some(stored),
            ..StoredSettings::default()
        };
        c.start(HostTime(0), &settings, "example.com");
        assert_eq!(c.host().position, Some(stored), "restored");
    }

    #[test]
    fn overlay_waits_for_media_and_retries_failed_creation() {
        let mut c = controller(&[]);
        c.host_mut().fail_create = 1;
        c.start(HostTime(0), &StoredSettings::default(), "example.com");
        assert_eq!(c.overlay_phase(), OverlayPhase::Absent, "no media, no overlay");

        let m = FakeMedia::new(1);
        c.host_mut().media.push(m);
        c.on_mutation(HostTime(100));
        run_until(&mut c, HostTime(600));
        assert_eq!(c.overlay_phase(), OverlayPhase::Absent, "creation failed");

        c.on_fullscreen_change(HostTime(700));
        run_until(&mut c, HostTime(800));
        assert_eq!(c.overlay_phase(), OverlayPhase::Hidden, "retried on the next pass");
        assert_eq!(c.host().created, 1, "created once");
        assert_eq!(c.host().attached, vec![1], "late media claimed once");
    }

    #[test]
    fn mutation_storm_runs_one_pass() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m]);
        for t in 0..20 {
            c.on_mutation(HostTime(t * 100));
        }
        run_until(&mut c, HostTime(10_000));
        assert_eq!(c.detection.passes(), 2, "startup plus one");
    }

    fn shared_announcements() -> (Controller<FakeHost>, Controller<FakeHost>) {
        let older = controller_with_identity(&[FakeMedia::new(1)], InstanceIdentity::new(7, 100));
        let newer = controller_with_identity(&[FakeMedia::new(2)], InstanceIdentity::new(3, 200));
        (older, newer)
    }

    fn exchange(from: &Controller<FakeHost>, to: &mut Controller<FakeHost>) {
        for a in from.host().announced.clone() {
            to.on_announcement(HostTime(0), &a);
        }
    }

    #[test]
    fn newer_instance_wins_when_created_last() {
        let (mut older, mut newer) = shared_announcements();
        older.start(HostTime(0), &StoredSettings::default(), "example.com");
        newer.start(HostTime(0), &StoredSettings::default(), "example.com");
        exchange(&older, &mut newer);
        exchange(&newer, &mut older);
        assert_eq!(older.lifecycle(), Lifecycle::Deactivated, "older yields");
        assert_eq!(newer.lifecycle(), Lifecycle::Running, "newer keeps");
        assert_eq!(older.host().removed, 1, "older overlay removed");
        assert_eq!(older.host().released, 1, "listeners released");
        assert_eq!(newer.host().removed, 0, "newer overlay kept");
    }

    #[test]
    fn newer_instance_wins_when_heard_first() {
        let (mut older, mut newer) = shared_announcements();
        newer.start(HostTime(0), &StoredSettings::default(), "example.com");
        older.start(HostTime(0), &StoredSettings::default(), "example.com");
        exchange(&newer, &mut older);
        exchange(&older, &mut newer);
        assert_eq!(older.lifecycle(), Lifecycle::Deactivated, "older yields");
        assert_eq!(newer.lifecycle(), Lifecycle::Running, "newer keeps");
    }

    #[test]
    fn deactivated_instance_ignores_everything() {
        let m = FakeMedia::new(1);
        let mut c = started(&[m.clone()]);
        c.request_speed(HostTime(0), 2.0);
        c.on_announcement(HostTime(0), &InstanceIdentity::new(2, 5_000).announcement());
        assert_eq!(c.next_deadline(), None, "timers cancelled");

        run_until(&mut c, HostTime(10_000));
        c.request_speed(HostTime(100), 3.0);
        c.advance(HostTime(1_000));
        c.on_pointer_move(HostTime(200), &[101]);
        c.on_overlay_action(HostTime(300), OverlayAction::Skip);
        c.on_mutation(HostTime(400));
        assert_eq!(c.handle_command(HostTime(500), Command::GetSpeed), None, "no reply");
        c.on_announcement(HostTime(600), &InstanceIdentity::new(3, 9_000).announcement());

        assert_eq!(m.rate_writes(), 0, "media untouched");
        assert_eq!(m.current_time(), 0.0, "no seek");
        assert!(c.host().persisted.is_empty(), "nothing persisted");
        assert!(!c.host().visible, "overlay never shown");
        assert_eq!(c.host().released, 1, "released once");
        assert_eq!(c.host().created, 1, "never recreated");
    }

    #[test]
    fn removal_is_traced() {
        struct Transitions(Rc<RefCell<Vec<OverlayTransition>>>);
        impl TraceSink for Transitions {
            fn on_overlay(&mut self, e: &OverlayEvent) {
                self.0.borrow_mut().push(e.transition);
            }
        }

        let mut c = controller(&[FakeMedia::new(1)]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        c.set_trace_sink(Box::new(Transitions(Rc::clone(&seen))));
        c.start(HostTime(0), &StoredSettings::default(), "example.com");
        c.on_announcement(HostTime(300), &InstanceIdentity::new(2, 200_000).announcement());
        assert_eq!(c.overlay_phase(), OverlayPhase::Removed, "removed");
        assert_eq!(
            *seen.borrow(),
            vec![OverlayTransition::Created, OverlayTransition::Removed],
            "terminal transition reported"
        );

        c.on_announcement(HostTime(400), &InstanceIdentity::new(3, 300_000).announcement());
        assert_eq!(seen.borrow().len(), 2, "reported once");
    }

    #[test]
    fn host_errors_are_absorbed() {
        #[derive(Default)]
        struct Errors(Rc<RefCell<Vec<HostOp>>>);
        impl TraceSink for Errors {
            fn on_host_error(&mut self, e: &HostErrorEvent<'_>) {
                self.0.borrow_mut().push(e.op);
            }
        }

        let m = FakeMedia::new(1);
        let mut c = controller(&[m.clone()]);
        let seen = Rc::new(RefCell::new(Vec::new()));
        c.set_trace_sink(Box::new(Errors(Rc::clone(&seen))));
        c.host_mut().fail_persist = true;
        c.start(HostTime(0), &StoredSettings::default(), "example.com");
        c.request_speed(HostTime(0), 2.0);
        run_until(&mut c, HostTime(100));
        assert_eq!(m.playback_rate(), 2.0, "speed applied despite the failed write");
        assert_eq!(c.host().notified.len(), 2, "badge still notified");
        assert_eq!(c.lifecycle(), Lifecycle::Running, "still running");
        assert_eq!(*seen.borrow(), vec![HostOp::Persist], "error traced");
    }

    #[test]
    fn hide_delay_comes_from_config() {
        let config = ControllerConfig {
            hide_delay: Duration::from_millis(1000),
            ..ControllerConfig::extension()
        };
        let mut c = Controller::new(
            FakeHost::with_media(&[FakeMedia::new(1)]),
            InstanceIdentity::new(1, 1),
            config,
        );
        c.start(HostTime(0), &StoredSettings::default(), "example.com");
        c.on_pointer_move(HostTime(0), &[101]);
        assert_eq!(c.next_deadline(), Some(HostTime(1000)), "custom delay");
    }
}
