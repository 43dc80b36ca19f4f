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

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{clock::Millis, format::Format, schedule::Timing};

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub uid: String,
    pub display_name: String,
    #[serde(default)]
    pub joined_at: Option<Millis>,
}

/// A tournament record with every field defaulted.
///
/// Built from a raw stored document by [`Tournament::normalize`].
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub owner_uid: Option<String>,
    pub created_at: Option<Millis>,
    pub game_type: String,
    pub format: Format,
    pub join_deadline: Option<Millis>,
    pub start_at: Option<Millis>,
    pub match_duration_minutes: u32,
    pub break_minutes: u32,
    pub max_participants: u32,
    /// Keyed by user id.
    pub participants: BTreeMap<String, Participant>,
    pub seed_teams: Vec<String>,
}

impl Tournament {
    #[must_use]
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn has_participant(&self, uid: &str) -> bool {
        self.participants.contains_key(uid)
    }

    #[must_use]
    pub fn is_join_closed(&self, now: Millis) -> bool {
        self.join_deadline.is_some_and(|deadline| now > deadline)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        u32::try_from(self.participant_count()).map_or(true, |count| count >= self.max_participants)
    }

    #[must_use]
    pub fn timing(&self) -> Timing {
        Timing {
            start_at: self.start_at,
            match_duration_minutes: self.match_duration_minutes,
            break_minutes: self.break_minutes,
        }
    }

    /// Whether `uid` could join right now, judged from this copy of the record.
    #[must_use]
    pub fn join_state(&self, uid: Option<&str>, now: Millis) -> JoinState {
        if uid.is_some_and(|uid| self.has_participant(uid)) {
            JoinState::Joined
        } else if self.is_join_closed(now) {
            JoinState::Closed
        } else if self.is_full() {
            JoinState::Full
        } else {
            JoinState::Open
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinState {
    Joined,
    Closed,
    Full,
    Open,
}

impl fmt::Display for JoinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Joined => write!(f, "Joined"),
            Self::Closed => write!(f, "Closed"),
            Self::Full => write!(f, "Full"),
            Self::Open => write!(f, "Open"),
        }
    }
}
