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

use std::{io::Write as _, path::PathBuf};

use bracketeer::{
    COPYRIGHT, LONG_VERSION, clock::Millis, format::Format, session::TournamentDraft,
};
use chrono::{DateTime, Local, NaiveDateTime};
use clap::{CommandFactory, Parser};

/// Bracketeer
///
/// Lists tournaments, creates and joins them, and prints the fixtures of the
/// selected one. The tournaments are kept in a JSON file.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Bracketeer")]
pub(crate) struct Args {
    /// JSON file holding the tournaments, written back on exit
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// User id to sign in as
    #[arg(long)]
    pub uid: Option<String>,

    /// Email of the signed in user, its local part is the display name
    #[arg(long, requires = "uid")]
    pub email: Option<String>,

    /// Show the fixtures of this tournament
    #[arg(long)]
    pub tournament: Option<String>,

    /// Join this tournament
    #[arg(long)]
    pub join: Option<String>,

    /// Create a tournament with this name
    #[arg(long)]
    pub create: Option<String>,

    /// Game type of the new tournament
    #[arg(long)]
    pub game_type: Option<String>,

    /// Format of the new tournament [default: recommended for the game type]
    #[arg(long)]
    pub format: Option<Format>,

    /// Team seeded into the new tournament, may be repeated
    #[arg(long)]
    pub seed_team: Vec<String>,

    /// First kickoff, e.g. 2026-10-20T18:00 or RFC 3339
    #[arg(long, value_parser = parse_datetime)]
    pub start_at: Option<Millis>,

    /// Last moment to join, e.g. 2026-10-19T23:59 or RFC 3339
    #[arg(long, value_parser = parse_datetime)]
    pub join_deadline: Option<Millis>,

    /// Minutes per match [10, 240]
    #[arg(long)]
    pub match_duration: Option<u32>,

    /// Minutes between matches [0, 120]
    #[arg(long)]
    pub break_minutes: Option<u32>,

    /// Seats in the new tournament [2, 64]
    #[arg(long)]
    pub max_participants: Option<u32>,

    /// Whether to log on the debug level
    #[arg(long)]
    pub debug: bool,

    /// Whether the application is being run by systemd
    #[arg(long)]
    pub systemd: bool,

    /// Build the manpage
    #[arg(long)]
    pub man: bool,
}

impl Args {
    pub(crate) fn draft(&self, name: &str) -> TournamentDraft {
        TournamentDraft {
            name: name.to_string(),
            game_type: self.game_type.clone(),
            format: self.format,
            join_deadline: self.join_deadline,
            start_at: self.start_at,
            match_duration_minutes: self.match_duration,
            break_minutes: self.break_minutes,
            max_participants: self.max_participants,
            seed_teams: self.seed_team.clone(),
        }
    }

    pub(crate) fn generate_man_page() -> anyhow::Result<()> {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Self::command().name("bracketeer").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-16");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        std::fs::write("bracketeer.1", buffer)?;
        Ok(())
    }
}

/// Reads an RFC 3339 time, or a local time without seconds.
fn parse_datetime(input: &str) -> Result<Millis, String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Ok(datetime.timestamp_millis());
    }

    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .and_then(|naive| naive.and_local_timezone(Local).earliest())
        .map(|datetime| datetime.timestamp_millis())
        .ok_or_else(|| format!("'{input}' is not a date and time like 2026-10-20T18:00"))
}
