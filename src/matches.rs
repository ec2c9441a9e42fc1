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

use crate::Id;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Side {
    X,
    Y,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
        }
    }
}

impl FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(string: &str) -> anyhow::Result<Self> {
        match string.to_lowercase().as_str() {
            "x" | "home" => Ok(Self::X),
            "y" | "away" => Ok(Self::Y),
            _ => Err(anyhow::Error::msg(format!(
                "Error trying to convert '{string}' to a Side!"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Winner {
    X,
    Y,
    Draw,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "x"),
            Self::Y => write!(f, "y"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// How far along a match is, as shown next to it in a bracket.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum MatchState {
    #[default]
    Pending,
    Seeded,
    Win,
    Draw,
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Seeded => write!(f, "seeded"),
            Self::Win => write!(f, "win"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

/// The agreed upon report of a played match.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct MatchReport {
    pub raw_score_x: f64,
    pub raw_score_y: f64,
    pub maps_played: u32,
    pub maps_x: u32,
    pub maps_y: u32,
    pub rounds_played: u32,
    pub rounds_x: u32,
    pub rounds_y: u32,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Match {
    pub id: Id,
    pub bracket_id: Id,
    pub bracket_round: u32,
    pub sort_number: u32,
    #[serde(default)]
    pub seed_x: Option<u32>,
    #[serde(default)]
    pub seed_y: Option<u32>,
    #[serde(default)]
    pub team_x: Option<Id>,
    #[serde(default)]
    pub team_y: Option<Id>,
    #[serde(default)]
    pub score_x: Option<f64>,
    #[serde(default)]
    pub score_y: Option<f64>,
    #[serde(default)]
    pub parent_match_x: Option<Id>,
    #[serde(default)]
    pub parent_match_x_is_loser: bool,
    #[serde(default)]
    pub parent_match_y: Option<Id>,
    #[serde(default)]
    pub parent_match_y_is_loser: bool,
    #[serde(default)]
    pub report: Option<MatchReport>,
}

impl Match {
    #[must_use]
    pub fn winner(&self) -> Option<Winner> {
        let (Some(x), Some(y)) = (self.score_x, self.score_y) else {
            return None;
        };

        if x > y {
            Some(Winner::X)
        } else if x < y {
            Some(Winner::Y)
        } else {
            Some(Winner::Draw)
        }
    }

    #[must_use]
    pub fn state(&self) -> MatchState {
        match self.winner() {
            Some(Winner::Draw) => MatchState::Draw,
            Some(_) => MatchState::Win,
            None if self.is_fully_seeded() => MatchState::Seeded,
            None => MatchState::Pending,
        }
    }

    #[must_use]
    pub fn is_fully_seeded(&self) -> bool {
        self.team_x.is_some() && self.team_y.is_some()
    }

    #[must_use]
    pub fn is_reported(&self) -> bool {
        self.report.is_some() && self.score_x.is_some() && self.score_y.is_some()
    }

    /// A match fed by the losers of earlier matches, such as the bronze match.
    #[must_use]
    pub fn is_loser_sourced(&self) -> bool {
        self.parent_match_x_is_loser || self.parent_match_y_is_loser
    }

    #[must_use]
    pub fn has_parents(&self) -> bool {
        self.parent_match_x.is_some() || self.parent_match_y.is_some()
    }

    #[must_use]
    pub fn parent(&self, side: Side) -> Option<Id> {
        match side {
            Side::X => self.parent_match_x,
            Side::Y => self.parent_match_y,
        }
    }

    #[must_use]
    pub fn parent_is_loser(&self, side: Side) -> bool {
        match side {
            Side::X => self.parent_match_x_is_loser,
            Side::Y => self.parent_match_y_is_loser,
        }
    }

    /// The parent whose winner feeds `side`.
    #[must_use]
    pub fn winner_parent(&self, side: Side) -> Option<Id> {
        if self.parent_is_loser(side) {
            None
        } else {
            self.parent(side)
        }
    }

    #[must_use]
    pub fn team(&self, side: Side) -> Option<Id> {
        match side {
            Side::X => self.team_x,
            Side::Y => self.team_y,
        }
    }

    #[must_use]
    pub fn side_of(&self, team: Id) -> Option<Side> {
        if self.team_x == Some(team) {
            Some(Side::X)
        } else if self.team_y == Some(team) {
            Some(Side::Y)
        } else {
            None
        }
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let team = |team: Option<Id>| team.map_or("-".to_string(), |team| team.to_string());
        let score = |score: Option<f64>| score.map_or("-".to_string(), |score| score.to_string());

        write!(
            f,
            "{} {} {} {} {} {}",
            self.id,
            team(self.team_x),
            score(self.score_x),
            score(self.score_y),
            team(self.team_y),
            self.state()
        )
    }
}
