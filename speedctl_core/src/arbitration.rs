// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Leader election between controller instances sharing one visual context.
//!
//! Each isolated frame on a page may run its own controller, and each would
//! otherwise draw its own overlay on top of the others. When an instance
//! creates its overlay it broadcasts an [`Announcement`]; every instance that
//! hears an announcement from a *newer* instance yields: it removes its
//! overlay and goes permanently quiet.
//!
//! "Newer" is the total order on `(creation_timestamp, instance_id)`, so two
//! instances created in the same millisecond still agree on a single winner.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Identity of one controller instantiation.
///
/// `created_at` is wall-clock milliseconds so that instances in different
/// frames (with different monotonic clock origins) can be compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceIdentity {
    /// Random identifier, unique per instantiation.
    pub id: u64,
    /// Wall-clock creation time in milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl InstanceIdentity {
    /// Largest id that survives a round trip through a JavaScript number.
    pub const MAX_ID: u64 = (1 << 53) - 1;

    /// Creates an identity; `id` is masked into the exactly representable
    /// JavaScript integer range.
    #[must_use]
    pub const fn new(id: u64, created_at: u64) -> Self {
        Self {
            id: id & Self::MAX_ID,
            created_at,
        }
    }

    /// Orders instances by creation time, breaking ties by id.
    #[must_use]
    pub fn rank(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then(self.id.cmp(&other.id))
    }

    /// The message this instance broadcasts after creating its overlay.
    #[must_use]
    pub const fn announcement(&self) -> Announcement {
        Announcement::HudCreated {
            instance_id: self.id,
            creation_timestamp: self.created_at,
        }
    }
}

/// Broadcast message on the arbitration channel.
///
/// Wire shape: `{ "type": "HUD_CREATED", "instanceId": 123, "creationTimestamp": 456 }`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Announcement {
    /// An instance created its overlay.
    #[serde(rename = "HUD_CREATED", rename_all = "camelCase")]
    HudCreated {
        /// Sender's id.
        instance_id: u64,
        /// Sender's creation time.
        creation_timestamp: u64,
    },
}

impl Announcement {
    /// Identity of the sender.
    #[must_use]
    pub const fn sender(&self) -> InstanceIdentity {
        match *self {
            Self::HudCreated {
                instance_id,
                creation_timestamp,
            } => InstanceIdentity {
                id: instance_id,
                created_at: creation_timestamp,
            },
        }
    }
}

/// Outcome of judging an announcement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Keep running.
    Keep,
    /// A newer instance exists; deactivate.
    Yield(InstanceIdentity),
}

/// Per-instance arbitration state.
#[derive(Clone, Copy, Debug)]
pub struct Arbiter {
    local: InstanceIdentity,
    yielded: bool,
}

impl Arbiter {
    /// Creates the arbiter for `local`.
    #[must_use]
    pub const fn new(local: InstanceIdentity) -> Self {
        Self {
            local,
            yielded: false,
        }
    }

    /// This instance's identity.
    #[must_use]
    pub const fn local(&self) -> InstanceIdentity {
        self.local
    }

    /// Judges an announcement.
    ///
    /// Our own echo is ignored. Once yielded, every further announcement is
    /// ignored too.
    pub fn judge(&mut self, announcement: &Announcement) -> Verdict {
        if self.yielded {
            return Verdict::Keep;
        }
        let sender = announcement.sender();
        if sender.id == self.local.id {
            return Verdict::Keep;
        }
        if sender.rank(&self.local) == Ordering::Greater {
            self.yielded = true;
            Verdict::Yield(sender)
        } else {
            Verdict::Keep
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_instance_yields_to_newer() {
        let a = InstanceIdentity::new(1, 100);
        let b = InstanceIdentity::new(2, 200);
        let mut arb_a = Arbiter::new(a);
        let mut arb_b = Arbiter::new(b);

        assert_eq!(arb_a.judge(&a.announcement()), Verdict::Keep, "own echo");
        assert_eq!(arb_b.judge(&a.announcement()), Verdict::Keep, "B ignores older A");
        assert_eq!(arb_a.judge(&b.announcement()), Verdict::Yield(b), "A yields to B");
    }

    #[test]
    fn reverse_creation_order() {
        let b = InstanceIdentity::new(2, 100);
        let a = InstanceIdentity::new(1, 200);
        let mut arb_a = Arbiter::new(a);
        let mut arb_b = Arbiter::new(b);
        assert_eq!(arb_a.judge(&b.announcement()), Verdict::Keep, "A is newer");
        assert_eq!(arb_b.judge(&a.announcement()), Verdict::Yield(a), "B yields");
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let low = InstanceIdentity::new(10, 500);
        let high = InstanceIdentity::new(20, 500);
        let mut arb_low = Arbiter::new(low);
        let mut arb_high = Arbiter::new(high);
        assert_eq!(arb_high.judge(&low.announcement()), Verdict::Keep, "larger id keeps");
        assert_eq!(
            arb_low.judge(&high.announcement()),
            Verdict::Yield(high),
            "smaller id yields"
        );
    }

    #[test]
    fn yielded_arbiter_stays_quiet() {
        let me = InstanceIdentity::new(1, 1);
        let mut arb = Arbiter::new(me);
        let newer = InstanceIdentity::new(2, 2);
        let newest = InstanceIdentity::new(3, 3);
        assert!(matches!(arb.judge(&newer.announcement()), Verdict::Yield(_)), "yield");
        assert_eq!(arb.judge(&newest.announcement()), Verdict::Keep, "only once");
    }

    #[test]
    fn ids_fit_javascript_numbers() {
        let id = InstanceIdentity::new(u64::MAX, 0);
        assert_eq!(id.id, InstanceIdentity::MAX_ID, "masked to 53 bits");
    }

    #[test]
    fn wire_shape() {
        let msg = InstanceIdentity::new(42, 1_700_000_000_000).announcement();
        let json = serde_json::to_value(msg).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "HUD_CREATED",
                "instanceId": 42,
                "creationTimestamp": 1_700_000_000_000_u64,
            }),
            "broadcast shape"
        );
        let back: Announcement = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, msg, "parses back");
        assert!(
            serde_json::from_str::<Announcement>(r#"{"type":"OTHER"}"#).is_err(),
            "unrelated postMessage traffic is rejected"
        );
    }
}
