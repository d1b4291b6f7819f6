// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed view of the shared settings store.
//!
//! The store is a flat key-value record shared by every page and by the
//! options UI. Reads happen once before the controller starts
//! ([`StoredSettings`]); writes are single-key patches ([`SettingsPatch`]);
//! live edits from other contexts arrive as [`SettingsChange`].
//!
//! Key names match what the options page writes, so existing user data keeps
//! working:
//!
//! | Key | Shape |
//! |---|---|
//! | `videoSpeed` | number |
//! | `siteRules` | `{ [hostname]: number }` |
//! | `speedStep` | number |
//! | `skipAmount` | number |
//! | `excludedSites` | `string[]` |
//! | `vsc_hud_pos_<hostname>` | `{ top: "12px", left: "34px" }` |

use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::ser::SerializeMap as _;
use serde::{Deserialize, Serialize, Serializer};

use crate::speed::Speed;

/// Key of the global desired speed.
pub const KEY_VIDEO_SPEED: &str = "videoSpeed";
/// Key of the per-hostname speed overrides.
pub const KEY_SITE_RULES: &str = "siteRules";
/// Key of the increase/decrease step.
pub const KEY_SPEED_STEP: &str = "speedStep";
/// Key of the skip/replay amount in seconds.
pub const KEY_SKIP_AMOUNT: &str = "skipAmount";
/// Key of the list of hostnames the controller must not run on.
pub const KEY_EXCLUDED_SITES: &str = "excludedSites";

/// Keys read by [`StoredSettings`], excluding the per-host position key.
pub const STARTUP_KEYS: [&str; 5] = [
    KEY_VIDEO_SPEED,
    KEY_SITE_RULES,
    KEY_SPEED_STEP,
    KEY_SKIP_AMOUNT,
    KEY_EXCLUDED_SITES,
];

/// Default increase/decrease step.
pub const DEFAULT_SPEED_STEP: f64 = 0.1;
/// Default skip/replay amount in seconds.
pub const DEFAULT_SKIP_SECONDS: f64 = 5.0;

/// Returns the store key holding the overlay position for `hostname`.
#[must_use]
pub fn position_key(hostname: &str) -> String {
    format!("vsc_hud_pos_{hostname}")
}

/// Settings as read from the store at startup.
///
/// Every field tolerates absence. Values of the wrong type make the whole
/// record fail to deserialize; callers fall back to [`Default`] in that case.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSettings {
    /// Global desired speed.
    pub video_speed: Option<f64>,
    /// Per-hostname overrides.
    pub site_rules: BTreeMap<String, f64>,
    /// Increase/decrease step.
    pub speed_step: Option<f64>,
    /// Skip/replay amount in seconds.
    pub skip_amount: Option<f64>,
    /// Hostnames the controller must not run on.
    pub excluded_sites: Vec<String>,
    /// Stored overlay position for the current hostname.
    ///
    /// Lives under a dynamic key, so the host fills it in separately.
    #[serde(skip)]
    pub overlay_position: Option<OverlayPosition>,
}

impl StoredSettings {
    /// Effective starting speed: site rule, then global speed, then `1.0`.
    #[must_use]
    pub fn initial_speed(&self, hostname: &str) -> Speed {
        self.site_rules
            .get(hostname)
            .copied()
            .or(self.video_speed)
            .map_or(Speed::NORMAL, Speed::clamped)
    }

    /// Configured step, or the default when missing or not positive.
    #[must_use]
    pub fn speed_step(&self) -> f64 {
        positive_or(self.speed_step, DEFAULT_SPEED_STEP)
    }

    /// Configured skip amount, or the default when missing or not positive.
    #[must_use]
    pub fn skip_seconds(&self) -> f64 {
        positive_or(self.skip_amount, DEFAULT_SKIP_SECONDS)
    }

    /// Whether the controller is disabled on `hostname`.
    #[must_use]
    pub fn is_excluded(&self, hostname: &str) -> bool {
        self.excluded_sites.iter().any(|site| site == hostname)
    }
}

pub(crate) fn positive_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

/// Top-left corner of the overlay in viewport pixels.
///
/// Stored as CSS length strings so the options page and older builds can
/// read it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PositionWire", into = "PositionWire")]
pub struct OverlayPosition {
    /// Distance from the viewport's top edge.
    pub top: f64,
    /// Distance from the viewport's left edge.
    pub left: f64,
}

impl OverlayPosition {
    /// Where a fresh overlay appears.
    pub const DEFAULT: Self = Self {
        top: 10.0,
        left: 10.0,
    };

    /// CSS lengths for `top` and `left`, in that order.
    #[must_use]
    pub fn css(self) -> (String, String) {
        (format!("{}px", self.top), format!("{}px", self.left))
    }
}

#[derive(Serialize, Deserialize)]
struct PositionWire {
    top: String,
    left: String,
}

impl TryFrom<PositionWire> for OverlayPosition {
    type Error = String;

    fn try_from(wire: PositionWire) -> Result<Self, Self::Error> {
        Ok(Self {
            top: parse_px(&wire.top)?,
            left: parse_px(&wire.left)?,
        })
    }
}

impl From<OverlayPosition> for PositionWire {
    fn from(pos: OverlayPosition) -> Self {
        let (top, left) = pos.css();
        Self { top, left }
    }
}

fn parse_px(value: &str) -> Result<f64, String> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    match number.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("not a pixel length: {value:?}")),
    }
}

/// A single-key write to the store.
///
/// Serializes as a one-entry map, ready to hand to the store's `set`.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingsPatch {
    /// Write the global desired speed.
    GlobalSpeed(Speed),
    /// Write the overlay position for a hostname.
    OverlayPosition {
        /// Hostname the position belongs to.
        hostname: String,
        /// Final dragged position.
        position: OverlayPosition,
    },
}

impl SettingsPatch {
    /// Store key this patch writes.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::GlobalSpeed(_) => String::from(KEY_VIDEO_SPEED),
            Self::OverlayPosition { hostname, .. } => position_key(hostname),
        }
    }
}

impl Serialize for SettingsPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::GlobalSpeed(speed) => map.serialize_entry(KEY_VIDEO_SPEED, speed)?,
            Self::OverlayPosition { hostname, position } => {
                map.serialize_entry(&position_key(hostname), position)?;
            }
        }
        map.end()
    }
}

/// One key's entry in a store change notification.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangedValue<T> {
    /// Value after the change; absent when the key was removed.
    pub new_value: Option<T>,
}

/// The subset of a store change notification the controller reacts to.
///
/// Deserializes directly from the `changes` object of the store's change
/// event: `{ speedStep: { oldValue, newValue }, ... }`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsChange {
    /// Step changed or was cleared.
    pub speed_step: Option<ChangedValue<f64>>,
    /// Skip amount changed or was cleared.
    pub skip_amount: Option<ChangedValue<f64>>,
}
