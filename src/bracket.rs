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

use crate::{Id, error::MalformedInput};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum BracketType {
    RoundRobinGroup,
    SingleElimination,
    SwissA,
    SwissB,
}

impl BracketType {
    /// Whether the matches form a tree of parent matches.
    #[must_use]
    pub fn is_elimination(&self) -> bool {
        *self == Self::SingleElimination
    }

    #[must_use]
    pub fn is_swiss(&self) -> bool {
        matches!(self, Self::SwissA | Self::SwissB)
    }

    /// Swiss B breaks score ties with the median Buchholz before anything else.
    #[must_use]
    pub fn uses_median_buchholz(&self) -> bool {
        *self == Self::SwissB
    }
}

impl fmt::Display for BracketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobinGroup => write!(f, "round-robin-group"),
            Self::SingleElimination => write!(f, "single-elimination"),
            Self::SwissA => write!(f, "swiss-a"),
            Self::SwissB => write!(f, "swiss-b"),
        }
    }
}

impl FromStr for BracketType {
    type Err = MalformedInput;

    fn from_str(string: &str) -> Result<Self, MalformedInput> {
        match string.to_lowercase().as_str() {
            "round-robin-group" | "bcl-s8-group-stage" => Ok(Self::RoundRobinGroup),
            "single-elimination" | "bcl-s8-playoffs" => Ok(Self::SingleElimination),
            "swiss-a" | "bcl-sc16-swiss" => Ok(Self::SwissA),
            "swiss-b" | "ace-pre-swiss" => Ok(Self::SwissB),
            _ => Err(MalformedInput::BracketType(string.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Bracket {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub map_veto_procedure: String,
    #[serde(default)]
    pub sort_number: u32,
}

impl Bracket {
    /// # Errors
    ///
    /// If the kind isn't a known bracket type.
    pub fn bracket_type(&self) -> Result<BracketType, MalformedInput> {
        BracketType::from_str(&self.kind)
    }
}

impl fmt::Display for Bracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.id, self.name, self.kind)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BracketRound {
    pub id: Id,
    pub bracket_id: Id,
    pub number: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bye_team_id: Option<Id>,
    #[serde(default)]
    pub map_veto_procedure: String,
}

impl BracketRound {
    /// The round's own procedure wins over the bracket's default; `None` means
    /// the maps aren't vetoed at all.
    #[must_use]
    pub fn veto_procedure<'a>(&'a self, bracket: &'a Bracket) -> Option<&'a str> {
        if !self.map_veto_procedure.trim().is_empty() {
            Some(&self.map_veto_procedure)
        } else if !bracket.map_veto_procedure.trim().is_empty() {
            Some(&bracket.map_veto_procedure)
        } else {
            None
        }
    }
}
