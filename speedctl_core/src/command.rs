// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inbound command channel.
//!
//! Keyboard shortcuts, the popup and the background relay all send the same
//! message shape: `{ action: "increase-speed" }`, optionally with a `speed`
//! for `set-speed`. Messages for other components share the channel, so
//! anything unrecognized parses to `None` instead of an error.

use serde::{Deserialize, Serialize};

/// A command routed into the controller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Reply with the cached desired speed.
    GetSpeed,
    /// Request an absolute speed.
    SetSpeed(f64),
    /// Step the speed up by the configured step.
    IncreaseSpeed,
    /// Step the speed down by the configured step.
    DecreaseSpeed,
    /// Request normal speed.
    ResetSpeed,
}

/// Wire shape of an inbound message.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommandMessage {
    /// Action name.
    pub action: Option<alloc::string::String>,
    /// Absolute speed for `set-speed`.
    pub speed: Option<f64>,
}

impl CommandMessage {
    /// Maps the message to a [`Command`], if it names one.
    ///
    /// `set-speed` without a finite `speed` is ignored.
    #[must_use]
    pub fn to_command(&self) -> Option<Command> {
        match self.action.as_deref()? {
            "get-speed" | "getSpeed" => Some(Command::GetSpeed),
            "set-speed" => match self.speed {
                Some(speed) if speed.is_finite() => Some(Command::SetSpeed(speed)),
                _ => None,
            },
            "increase-speed" => Some(Command::IncreaseSpeed),
            "decrease-speed" => Some(Command::DecreaseSpeed),
            "reset-speed" => Some(Command::ResetSpeed),
            _ => None,
        }
    }
}

/// Synchronous reply to [`Command::GetSpeed`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SpeedReply {
    /// Cached desired speed.
    pub speed: f64,
}

/// One-way notification to the badge collaborator.
///
/// Wire shape: `{ "action": "updateBadge", "speed": 1.5 }`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BadgeUpdate {
    action: &'static str,
    /// Speed to display.
    pub speed: f64,
}

impl BadgeUpdate {
    /// Creates the notification for `speed`.
    #[must_use]
    pub const fn new(speed: f64) -> Self {
        Self {
            action: "updateBadge",
            speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<Command> {
        serde_json::from_str::<CommandMessage>(json)
            .expect("object")
            .to_command()
    }

    #[test]
    fn recognizes_every_action() {
        assert_eq!(parse(r#"{"action":"get-speed"}"#), Some(Command::GetSpeed), "get");
        assert_eq!(parse(r#"{"action":"getSpeed"}"#), Some(Command::GetSpeed), "alias");
        assert_eq!(
            parse(r#"{"action":"set-speed","speed":2.5}"#),
            Some(Command::SetSpeed(2.5)),
            "set"
        );
        assert_eq!(
            parse(r#"{"action":"increase-speed"}"#),
            Some(Command::IncreaseSpeed),
            "increase"
        );
        assert_eq!(
            parse(r#"{"action":"decrease-speed"}"#),
            Some(Command::DecreaseSpeed),
            "decrease"
        );
        assert_eq!(parse(r#"{"action":"reset-speed"}"#), Some(Command::ResetSpeed), "reset");
    }

    #[test]
    fn ignores_foreign_and_incomplete_messages() {
        assert_eq!(parse(r#"{"action":"updateBadge","speed":2}"#), None, "other component");
        assert_eq!(parse(r#"{"action":"set-speed"}"#), None, "set without speed");
        assert_eq!(parse("{}"), None, "no action");
    }

    #[test]
    fn reply_shape() {
        let json = serde_json::to_string(&SpeedReply { speed: 1.25 }).expect("reply");
        assert_eq!(json, r#"{"speed":1.25}"#, "reply is {{speed}}");
    }

    #[test]
    fn badge_update_shape() {
        let json = serde_json::to_string(&BadgeUpdate::new(2.5)).expect("badge");
        assert_eq!(json, r#"{"action":"updateBadge","speed":2.5}"#, "badge message");
    }
}
