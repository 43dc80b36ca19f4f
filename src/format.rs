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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Knockout,
    RoundRobin,
    LeagueKnockout,
}

impl Format {
    /// Reads a stored format tag. Unknown or unset tags fall back to knockout.
    #[must_use]
    pub fn from_tag(tag: Option<&str>) -> Self {
        tag.and_then(|tag| tag.parse().ok()).unwrap_or_default()
    }

    /// The format suggested to an organizer for a game type.
    #[must_use]
    pub fn recommended_for(game_type: &str) -> Self {
        match game_type {
            "cricket_t20" => Self::LeagueKnockout,
            "baseball" => Self::RoundRobin,
            _ => Self::Knockout,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Knockout => write!(f, "knockout"),
            Self::RoundRobin => write!(f, "round_robin"),
            Self::LeagueKnockout => write!(f, "league_knockout"),
        }
    }
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string {
            "knockout" => Ok(Self::Knockout),
            "round_robin" => Ok(Self::RoundRobin),
            "league_knockout" => Ok(Self::LeagueKnockout),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to Format!"
            ))),
        }
    }
}
