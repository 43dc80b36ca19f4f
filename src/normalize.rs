// This file is part of bracketeer.
//
// bracketeer is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// bracketeer is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Defaults and shape checks for raw tournament documents.
//!
//! Stored documents are loosely typed: numbers may arrive as strings, legacy
//! records may lack fields entirely, and `participants` may be the wrong
//! shape. Everything in here is side-effect free.

use serde_json::Value;

use crate::{
    clock::Millis,
    format::Format,
    tournament::{Participant, Tournament},
};

pub const NAME_MIN_LEN: usize = 3;
pub const TEAM_NAME_MIN_LEN: usize = 2;
pub const DEFAULT_GAME_TYPE: &str = "esports";

/// Inclusive bounds and default for an integer tournament setting.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

pub const MATCH_DURATION_MINUTES: Limits = Limits {
    min: 10,
    max: 240,
    default: 30,
};

pub const BREAK_MINUTES: Limits = Limits {
    min: 0,
    max: 120,
    default: 10,
};

pub const MAX_PARTICIPANTS: Limits = Limits {
    min: 2,
    max: 64,
    default: 8,
};

impl Limits {
    /// Missing or non-numeric values take the default, everything else is
    /// rounded and clamped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply(self, value: Option<f64>) -> u32 {
        match value {
            Some(value) if value.is_finite() => {
                value
                    .round()
                    .clamp(f64::from(self.min), f64::from(self.max)) as u32
            }
            _ => self.default,
        }
    }

    #[must_use]
    pub fn apply_value(self, value: Option<&Value>) -> u32 {
        self.apply(value.and_then(number))
    }
}

/// Strips every character outside `[A-Za-z0-9 _-]` and trims the result.
#[must_use]
pub fn sanitize_name(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// A record is valid when its `name` is a string of at least
/// [`NAME_MIN_LEN`] characters.
#[must_use]
pub fn is_valid_record(raw: &Value) -> bool {
    raw.get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| name.chars().count() >= NAME_MIN_LEN)
}

/// Absent-like values: `null`, `false`, zero and the empty string.
#[must_use]
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(boolean) => !boolean,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(string) => string.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[must_use]
pub fn is_missing(value: Option<&Value>) -> bool {
    value.is_none_or(is_blank)
}

/// Reads a number, accepting numeric strings.
#[must_use]
pub fn number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// Reads a timestamp. Zero counts as unset.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn millis(value: &Value) -> Option<Millis> {
    number(value)
        .filter(|number| *number != 0.0)
        .map(|number| number.round() as Millis)
}

impl Participant {
    /// Reads a stored participant entry. The map key wins when the entry does
    /// not carry its own `uid`.
    #[must_use]
    pub fn from_value(uid: &str, raw: &Value) -> Self {
        Self {
            uid: raw
                .get("uid")
                .and_then(Value::as_str)
                .unwrap_or(uid)
                .to_string(),
            display_name: raw
                .get("displayName")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            joined_at: raw.get("joinedAt").and_then(millis),
        }
    }
}

impl Tournament {
    /// Builds the canonical view of a stored record. The input is never
    /// modified. Returns `None` for records that fail [`is_valid_record`].
    #[must_use]
    pub fn normalize(id: &str, raw: &Value) -> Option<Self> {
        if !is_valid_record(raw) {
            return None;
        }

        let text = |field: &str| {
            raw.get(field)
                .and_then(Value::as_str)
                .filter(|text| !text.is_empty())
                .map(str::to_string)
        };

        let participants = raw
            .get("participants")
            .and_then(Value::as_object)
            .map(|participants| {
                participants
                    .iter()
                    .filter(|(_, entry)| !is_blank(entry))
                    .map(|(uid, entry)| (uid.clone(), Participant::from_value(uid, entry)))
                    .collect()
            })
            .unwrap_or_default();

        let seed_teams = raw
            .get("seedTeams")
            .and_then(Value::as_array)
            .map(|teams| {
                teams
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id: id.to_string(),
            name: text("name").unwrap_or_default(),
            owner_uid: text("ownerUid"),
            created_at: raw.get("createdAt").and_then(millis),
            game_type: text("gameType").unwrap_or_else(|| DEFAULT_GAME_TYPE.to_string()),
            format: Format::from_tag(raw.get("format").and_then(Value::as_str)),
            join_deadline: raw.get("joinDeadline").and_then(millis),
            start_at: raw.get("startAt").and_then(millis),
            match_duration_minutes: MATCH_DURATION_MINUTES.apply_value(raw.get("matchDurationMinutes")),
            break_minutes: BREAK_MINUTES.apply_value(raw.get("breakMinutes")),
            max_participants: MAX_PARTICIPANTS.apply_value(raw.get("maxParticipants")),
            participants,
            seed_teams,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sanitize_strips_and_trims() {
        assert_eq!(sanitize_name("  Spring <Cup> 2026!  "), "Spring Cup 2026");
        assert_eq!(sanitize_name("team_one-b"), "team_one-b");
        assert_eq!(sanitize_name("Ünïcødé"), "ncd");
        assert_eq!(sanitize_name("***"), "");
    }

    #[test]
    fn validity_needs_a_long_enough_string_name() {
        assert!(is_valid_record(&json!({ "name": "Cup" })));
        assert!(!is_valid_record(&json!({ "name": "Cu" })));
        assert!(!is_valid_record(&json!({ "name": 12345 })));
        assert!(!is_valid_record(&json!({})));
        assert!(!is_valid_record(&json!("Spring Cup")));
        assert!(!is_valid_record(&Value::Null));
    }

    #[test]
    fn normalize_fills_defaults() -> anyhow::Result<()> {
        let raw = json!({ "name": "Legacy Cup" });
        let tournament = Tournament::normalize("t1", &raw)
            .ok_or_else(|| anyhow::Error::msg("record should be valid"))?;

        assert_eq!(tournament.id, "t1");
        assert_eq!(tournament.owner_uid, None);
        assert_eq!(tournament.created_at, None);
        assert_eq!(tournament.game_type, "esports");
        assert_eq!(tournament.format, Format::Knockout);
        assert_eq!(tournament.join_deadline, None);
        assert_eq!(tournament.start_at, None);
        assert_eq!(tournament.match_duration_minutes, 30);
        assert_eq!(tournament.break_minutes, 10);
        assert_eq!(tournament.max_participants, 8);
        assert!(tournament.participants.is_empty());
        assert!(tournament.seed_teams.is_empty());

        Ok(())
    }

    #[test]
    fn normalize_clamps_and_coerces() -> anyhow::Result<()> {
        let raw = json!({
            "name": "Clamp Cup",
            "format": "round_robin",
            "matchDurationMinutes": 5,
            "breakMinutes": "500",
            "maxParticipants": 1000,
            "startAt": "1700000000000",
            "joinDeadline": 0,
            "participants": "oops",
            "seedTeams": ["Falcons", 7, "Ravens"],
        });
        let tournament = Tournament::normalize("t2", &raw)
            .ok_or_else(|| anyhow::Error::msg("record should be valid"))?;

        assert_eq!(tournament.format, Format::RoundRobin);
        assert_eq!(tournament.match_duration_minutes, 10);
        assert_eq!(tournament.break_minutes, 120);
        assert_eq!(tournament.max_participants, 64);
        assert_eq!(tournament.start_at, Some(1_700_000_000_000));
        assert_eq!(tournament.join_deadline, None);
        assert!(tournament.participants.is_empty());
        assert_eq!(tournament.seed_teams, vec!["Falcons", "Ravens"]);

        Ok(())
    }

    #[test]
    fn normalize_keeps_a_zero_break() -> anyhow::Result<()> {
        let raw = json!({ "name": "No Rest Cup", "breakMinutes": 0 });
        let tournament = Tournament::normalize("t3", &raw)
            .ok_or_else(|| anyhow::Error::msg("record should be valid"))?;
        assert_eq!(tournament.break_minutes, 0);

        Ok(())
    }

    #[test]
    fn normalize_does_not_touch_the_input() {
        let raw = json!({ "name": "Frozen Cup", "participants": null });
        let before = raw.clone();
        let _tournament = Tournament::normalize("t4", &raw);
        assert_eq!(raw, before);
    }

    #[test]
    fn normalize_rejects_invalid_records() {
        assert!(Tournament::normalize("t5", &json!({ "name": "ab" })).is_none());
    }

    #[test]
    fn participants_are_read_by_key() -> anyhow::Result<()> {
        let raw = json!({
            "name": "Keyed Cup",
            "participants": {
                "u1": { "uid": "u1", "displayName": "alice", "joinedAt": 42 },
                "u2": { "displayName": "bob" },
                "u3": null,
            },
        });
        let tournament = Tournament::normalize("t6", &raw)
            .ok_or_else(|| anyhow::Error::msg("record should be valid"))?;

        assert_eq!(tournament.participant_count(), 2);
        assert_eq!(
            tournament.participants.get("u1"),
            Some(&Participant {
                uid: "u1".to_string(),
                display_name: "alice".to_string(),
                joined_at: Some(42),
            })
        );
        assert_eq!(
            tournament.participants.get("u2").map(|p| p.uid.as_str()),
            Some("u2")
        );

        Ok(())
    }
}
