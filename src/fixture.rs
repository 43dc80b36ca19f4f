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

use std::{collections::HashSet, fmt};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    clock::Millis,
    format::Format,
    normalize::{TEAM_NAME_MIN_LEN, sanitize_name},
    schedule::{format_kickoff, schedule},
    tournament::Tournament,
};

pub const BYE: &str = "BYE";
pub const FINAL_LABEL: &str = "Final (Top 2 after league)";
pub const LEAGUE_WINNER: &str = "TBD #1";
pub const LEAGUE_RUNNER_UP: &str = "TBD #2";

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub label: String,
    pub team_a: String,
    pub team_b: String,
    pub scheduled_at: Option<Millis>,
}

impl Fixture {
    #[must_use]
    pub fn new(label: String, team_a: &str, team_b: &str) -> Self {
        Self {
            label,
            team_a: team_a.to_string(),
            team_b: team_b.to_string(),
            scheduled_at: None,
        }
    }

    #[must_use]
    pub fn teams(&self) -> (&str, &str) {
        (&self.team_a, &self.team_b)
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} vs {} | Starts: {}",
            self.label,
            self.team_a,
            self.team_b,
            format_kickoff(self.scheduled_at)
        )
    }
}

/// The teams a tournament's fixtures are drawn between.
///
/// Participant display names (in user id order) come first, then the
/// organizer's seed teams. Names are sanitized, names shorter than
/// [`TEAM_NAME_MIN_LEN`] are dropped, duplicates collapse onto their first
/// occurrence and the result is cut to `max_participants`.
///
/// A participant whose name matches a seed team shares that entry with it.
#[must_use]
pub fn roster(tournament: &Tournament) -> Vec<String> {
    let participant_names: Vec<String> = tournament
        .participants
        .values()
        .map(|participant| sanitize_name(&participant.display_name))
        .collect();
    let seed_names: Vec<String> = tournament
        .seed_teams
        .iter()
        .map(|team| sanitize_name(team))
        .collect();

    for seed in &seed_names {
        if !seed.is_empty() && participant_names.contains(seed) {
            debug!(
                "tournament {}: seed team {seed} collides with a participant",
                tournament.id
            );
        }
    }

    let limit = usize::try_from(tournament.max_participants).unwrap_or(usize::MAX);
    let mut seen = HashSet::new();

    participant_names
        .into_iter()
        .chain(seed_names)
        .filter(|name| name.chars().count() >= TEAM_NAME_MIN_LEN)
        .filter(|name| seen.insert(name.clone()))
        .take(limit)
        .collect()
}

/// Pairs the roster according to `format`. Fewer than two teams give no
/// fixtures.
#[must_use]
pub fn generate(teams: &[String], format: Format) -> Vec<Fixture> {
    if teams.len() < 2 {
        return Vec::new();
    }

    match format {
        Format::Knockout => knockout(teams),
        Format::RoundRobin => round_robin(teams),
        Format::LeagueKnockout => league_knockout(teams),
    }
}

/// First against second, third against fourth, and so on. An odd team out
/// plays [`BYE`].
#[must_use]
pub fn knockout(teams: &[String]) -> Vec<Fixture> {
    teams
        .chunks(2)
        .zip(1..)
        .filter_map(|(pair, number)| {
            let team_a = pair.first()?;
            let team_b = pair.get(1).map_or(BYE, String::as_str);
            Some(Fixture::new(format!("Knockout Match {number}"), team_a, team_b))
        })
        .collect()
}

/// Every pair once, ordered by the first team's roster position and then the
/// second's.
#[must_use]
pub fn round_robin(teams: &[String]) -> Vec<Fixture> {
    let mut fixtures = Vec::with_capacity(teams.len() * teams.len().saturating_sub(1) / 2);
    let mut number = 1;

    for (i, team_a) in teams.iter().enumerate() {
        for team_b in teams.iter().skip(i + 1) {
            fixtures.push(Fixture::new(
                format!("League Match {number}"),
                team_a,
                team_b,
            ));
            number += 1;
        }
    }

    fixtures
}

/// The full league followed by one final between the top two.
#[must_use]
pub fn league_knockout(teams: &[String]) -> Vec<Fixture> {
    let mut fixtures = round_robin(teams);
    fixtures.push(Fixture::new(
        FINAL_LABEL.to_string(),
        LEAGUE_WINNER,
        LEAGUE_RUNNER_UP,
    ));
    fixtures
}

/// Roster, pairings and kickoff times for a tournament.
#[must_use]
pub fn build_fixtures(tournament: &Tournament) -> Vec<Fixture> {
    let teams = roster(tournament);
    schedule(generate(&teams, tournament.format), &tournament.timing())
}
