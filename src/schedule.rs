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

use chrono::{DateTime, Local};

use crate::{
    clock::{MINUTE, Millis},
    fixture::Fixture,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    pub start_at: Option<Millis>,
    pub match_duration_minutes: u32,
    pub break_minutes: u32,
}

impl Timing {
    /// Time between two consecutive kickoffs.
    #[must_use]
    pub fn slot(&self) -> Millis {
        (Millis::from(self.match_duration_minutes) + Millis::from(self.break_minutes)) * MINUTE
    }
}

/// Fixture `i` kicks off at `start_at + i * slot`. Without a start time
/// nothing is scheduled.
#[must_use]
pub fn schedule(fixtures: Vec<Fixture>, timing: &Timing) -> Vec<Fixture> {
    let slot = timing.slot();

    fixtures
        .into_iter()
        .zip(0..)
        .map(|(mut fixture, index): (Fixture, Millis)| {
            fixture.scheduled_at = timing
                .start_at
                .map(|start_at| start_at.saturating_add(index.saturating_mul(slot)));
            fixture
        })
        .collect()
}

#[must_use]
pub fn format_kickoff(scheduled_at: Option<Millis>) -> String {
    match scheduled_at.and_then(DateTime::from_timestamp_millis) {
        Some(datetime) => datetime
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => "TBD".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unscheduled(count: usize) -> Vec<Fixture> {
        (1..=count)
            .map(|number| Fixture::new(format!("Match {number}"), "Home", "Away"))
            .collect()
    }

    #[test]
    fn no_start_means_no_kickoffs() {
        let timing = Timing {
            start_at: None,
            match_duration_minutes: 30,
            break_minutes: 10,
        };

        let fixtures = schedule(unscheduled(4), &timing);
        assert_eq!(fixtures.len(), 4);
        assert!(fixtures.iter().all(|fixture| fixture.scheduled_at.is_none()));
    }

    #[test]
    fn kickoffs_are_evenly_spaced() {
        let start_at = 1_767_225_600_000;
        let timing = Timing {
            start_at: Some(start_at),
            match_duration_minutes: 45,
            break_minutes: 15,
        };
        assert_eq!(timing.slot(), 3_600_000);

        let kickoffs: Vec<Millis> = schedule(unscheduled(5), &timing)
            .iter()
            .filter_map(|fixture| fixture.scheduled_at)
            .collect();

        assert_eq!(kickoffs.len(), 5);
        assert_eq!(kickoffs.first(), Some(&start_at));
        for window in kickoffs.windows(2) {
            assert_eq!(window[1] - window[0], timing.slot());
        }
    }

    #[test]
    fn zero_break_still_spaces_by_duration() {
        let timing = Timing {
            start_at: Some(0),
            match_duration_minutes: 10,
            break_minutes: 0,
        };
        assert_eq!(timing.slot(), 600_000);
    }

    #[test]
    fn labels_and_teams_survive_scheduling() {
        let timing = Timing {
            start_at: Some(60_000),
            match_duration_minutes: 30,
            break_minutes: 10,
        };
        let before = unscheduled(2);
        let after = schedule(before.clone(), &timing);

        for (before, after) in before.iter().zip(&after) {
            assert_eq!(before.label, after.label);
            assert_eq!(before.teams(), after.teams());
        }
    }

    #[test]
    fn unscheduled_kickoff_is_tbd() {
        assert_eq!(format_kickoff(None), "TBD");
        assert_ne!(format_kickoff(Some(1_767_225_600_000)), "TBD");
    }
}
