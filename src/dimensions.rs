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

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

/// The geometry a bracket is laid out with. Every length is in the units of
/// the canvas the renderer draws on.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Dimensions {
    pub team_height: f64,
    pub team_distance: f64,
    pub pair_inner_distance: f64,
    pub pair_outer_distance: f64,
    pub round_width: f64,
    pub match_width: f64,
    pub bracket_padding: f64,
    pub round_header_height: f64,
    pub connection_segment: f64,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            team_height: 32.0,
            team_distance: 2.0,
            pair_inner_distance: 48.0,
            pair_outer_distance: 32.0,
            round_width: 320.0,
            match_width: 200.0,
            bracket_padding: 64.0,
            round_header_height: 128.0,
            connection_segment: 30.0,
        }
    }
}

impl Dimensions {
    #[must_use]
    pub fn match_height(&self) -> f64 {
        self.team_height * 2.0 + self.team_distance
    }

    #[must_use]
    pub fn round_padding(&self) -> f64 {
        (self.round_width - self.match_width) / 2.0
    }

    #[must_use]
    pub fn connection_width(&self) -> f64 {
        self.round_padding() * 2.0
    }

    /// Where the column of `round` starts.
    #[must_use]
    pub fn round_x(&self, round: u32) -> f64 {
        f64::from(round.saturating_sub(1)) * self.round_width + self.round_padding()
    }

    /// # Errors
    ///
    /// If the string isn't valid RON.
    pub fn from_ron(string: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(string)
    }

    /// # Errors
    ///
    /// If the file can't be read or isn't valid RON.
    pub fn from_ron_file(path: &Path) -> anyhow::Result<Self> {
        let string = fs::read_to_string(path)?;
        Ok(Self::from_ron(&string)?)
    }
}
