// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Media element handles.
//!
//! A [`Media`] is a non-owning handle to a playable element that the host page
//! owns. The page may detach or replace it at any time, so the controller
//! never caches handles across detection passes; it re-queries instead.

/// `HTMLMediaElement.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    /// No information about the media resource.
    #[default]
    HaveNothing,
    /// Duration and dimensions are known.
    HaveMetadata,
    /// Data for the current position is available.
    HaveCurrentData,
    /// Data beyond the current position is available.
    HaveFutureData,
    /// Enough data to play through.
    HaveEnoughData,
}

impl ReadyState {
    /// Maps the numeric DOM value; unknown values saturate to
    /// [`HaveEnoughData`](Self::HaveEnoughData).
    #[must_use]
    pub const fn from_dom(value: u16) -> Self {
        match value {
            0 => Self::HaveNothing,
            1 => Self::HaveMetadata,
            2 => Self::HaveCurrentData,
            3 => Self::HaveFutureData,
            _ => Self::HaveEnoughData,
        }
    }

    /// Whether the element will accept a `playbackRate` write.
    #[must_use]
    pub const fn accepts_rate(self) -> bool {
        !matches!(self, Self::HaveNothing)
    }

    /// Whether enough is buffered that rate restoration will not fight the
    /// page during startup or seeking.
    #[must_use]
    pub const fn is_buffered(self) -> bool {
        matches!(self, Self::HaveFutureData | Self::HaveEnoughData)
    }
}

/// A handle to an `<audio>` or `<video>` element.
///
/// Implementations must be cheap to clone and compare by element identity.
pub trait Media: Clone + PartialEq {
    /// Current native playback rate.
    fn playback_rate(&self) -> f64;

    /// Writes the native playback rate.
    fn set_playback_rate(&self, rate: f64);

    /// Current readiness.
    fn ready_state(&self) -> ReadyState;

    /// `true` when not paused and not ended.
    fn is_playing(&self) -> bool;

    /// Duration in seconds; `NaN` or infinite when unknown or live.
    fn duration(&self) -> f64;

    /// Playback position in seconds.
    fn current_time(&self) -> f64;

    /// Seeks to `seconds`.
    fn set_current_time(&self, seconds: f64);

    /// Marks the element as processed by this controller.
    ///
    /// Returns `true` the first time, `false` if the marker was already
    /// present. The marker lives on the element itself so that repeat passes
    /// do not double-attach listeners.
    fn claim(&self) -> bool;
}

/// Seeks `media` by `offset` seconds, clamped to `[0, duration]`.
///
/// Returns `false` and leaves the element alone when the duration is not a
/// finite known value.
pub fn seek_by<M: Media>(media: &M, offset: f64) -> bool {
    let duration = media.duration();
    if !duration.is_finite() {
        return false;
    }
    let target = (media.current_time() + offset).clamp(0.0, duration.max(0.0));
    media.set_current_time(target);
    true
}


#[cfg(test)]
mod tests {
    use super::fake::FakeMedia;
    use super::*;

    #[test]
    fn ready_state_from_dom() {
        assert_eq!(ReadyState::from_dom(0), ReadyState::HaveNothing, "0");
        assert_eq!(ReadyState::from_dom(3), ReadyState::HaveFutureData, "3");
        assert_eq!(ReadyState::from_dom(9), ReadyState::HaveEnoughData, "9");
        assert!(!ReadyState::HaveNothing.accepts_rate(), "nothing loaded");
        assert!(ReadyState::HaveMetadata.accepts_rate(), "metadata is enough");
        assert!(!ReadyState::HaveCurrentData.is_buffered(), "not buffered");
        assert!(ReadyState::HaveFutureData.is_buffered(), "buffered");
    }

    #[test]
    fn seek_clamps_to_duration_bounds() {
        let m = FakeMedia::new(1);
        m.0.duration.set(100.0);
        m.0.time.set(3.0);
        assert!(seek_by(&m, -5.0), "finite duration seeks");
        assert_eq!(m.current_time(), 0.0, "replay clamps at zero");

        m.0.time.set(3.0);
        assert!(seek_by(&m, 200.0), "finite duration seeks");
        assert_eq!(m.current_time(), 100.0, "skip clamps at duration");
    }

    #[test]
    fn seek_skips_unknown_duration() {
        let m = FakeMedia::new(1);
        m.0.time.set(7.0);
        for d in [f64::NAN, f64::INFINITY] {
            m.0.duration.set(d);
            assert!(!seek_by(&m, 5.0), "duration {d} is not seekable");
            assert_eq!(m.current_time(), 7.0, "position untouched");
        }
    }

    #[test]
    fn claim_is_once() {
        let m = FakeMedia::new(1);
        assert!(m.claim(), "first claim wins");
        assert!(!m.clone().claim(), "clones share the marker");
    }
}
