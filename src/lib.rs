//! Tournament fixtures, kickoff scheduling and conflict-safe enrollment for
//! tournaments kept in a shared record store.
//!
//! Organizers create tournaments, players join them and everybody sees the
//! fixtures derived from the current roster. There is no server between the
//! clients and the store: enrollment relies on the store's atomic update
//! alone, see [`join`].
//!
//! ## Formats
//!
//! * knockout - first against second, third against fourth; an odd team out
//!   plays `BYE`
//! * round robin - every pair once
//! * league knockout - the round robin followed by a final between the top two
//!
//! ## Feature Flags
//!
//! * bench - build the criterion benchmarks

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

#![deny(clippy::panic)]

pub mod clock;
pub mod fixture;
pub mod format;
pub mod identity;
pub mod init;
pub mod join;
pub mod memory_store;
pub mod normalize;
pub mod repair;
pub mod schedule;
pub mod session;
pub mod store;
pub mod tournament;
pub mod utils;

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2026 Bracketeer Developers

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU Affero General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU Affero General Public License for more details.

You should have received a copy of the GNU Affero General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
";

pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "
Copyright (c) 2026 Bracketeer Developers
Licensed under the AGPLv3"
);
