//! Tournament bracket layout, standings and map veto.
//!
//! Everything in here is a pure function over a snapshot of the host's
//! records: lay out a bracket, rank its standings, or fold the committed map
//! selections of a match into its veto state.
//!
//! ## Feature Flags
//!
//! * bench - enable the criterion benchmarks

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

pub mod bracket;
pub mod dimensions;
pub mod elimination;
pub mod error;
pub mod generate;
pub mod layout;
pub mod matches;
pub mod procedure;
pub mod round_robin;
pub mod snapshot;
pub mod standings;
pub mod tiebreak;
pub mod utils;
pub mod veto;

pub type Id = u128;

pub const COPYRIGHT: &str = r".SH COPYRIGHT
Copyright (C) 2026 Developers of the bracketeer project

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
Copyright (c) 2026 Developers of the bracketeer project
Licensed under the AGPLv3"
);
