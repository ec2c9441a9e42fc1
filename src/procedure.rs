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

use crate::{error::MalformedInput, matches::Side};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Actor {
    X,
    Y,
    /// Resolved automatically, never offered to a team.
    Random,
}

impl Actor {
    #[must_use]
    pub fn side(&self) -> Option<Side> {
        match self {
            Self::X => Some(Side::X),
            Self::Y => Some(Side::Y),
            Self::Random => None,
        }
    }
}

impl From<Side> for Actor {
    fn from(side: Side) -> Self {
        match side {
            Side::X => Self::X,
            Side::Y => Self::Y,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ActionKind {
    Ban,
    Pick,
}

impl ActionKind {
    #[must_use]
    pub fn is_ban(&self) -> bool {
        *self == Self::Ban
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ban => write!(f, "ban"),
            Self::Pick => write!(f, "pick"),
        }
    }
}

/// One step of a veto procedure, written as a token like `X`, `y`, `R2`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Action {
    pub actor: Actor,
    pub kind: ActionKind,
    pub sub_pool: Option<u8>,
}

impl Action {
    /// Parses a single non-empty token. `index` is the 1-based position of the
    /// token, used in the error.
    ///
    /// # Errors
    ///
    /// If the token is longer than two characters, doesn't start with one of
    /// `XYRxyr` or has a second character that isn't a digit.
    pub fn parse(token: &str, index: usize) -> Result<Self, MalformedInput> {
        let mut chars = token.chars();
        let Some(letter) = chars.next() else {
            return Err(MalformedInput::ActionTooLong(index));
        };
        let digit = chars.next();
        if chars.next().is_some() {
            return Err(MalformedInput::ActionTooLong(index));
        }

        let kind = if letter.is_uppercase() {
            ActionKind::Pick
        } else {
            ActionKind::Ban
        };

        let actor = match letter.to_ascii_uppercase() {
            'X' => Actor::X,
            'Y' => Actor::Y,
            'R' => Actor::Random,
            _ => return Err(MalformedInput::ActionLetter(index, letter)),
        };

        let sub_pool = match digit {
            None => None,
            Some(digit) => {
                let Some(sub_pool) = digit
                    .to_digit(10)
                    .and_then(|sub_pool| u8::try_from(sub_pool).ok())
                else {
                    return Err(MalformedInput::ActionDigit(index, digit));
                };
                Some(sub_pool)
            }
        };

        Ok(Self {
            actor,
            kind,
            sub_pool,
        })
    }

    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.actor == Actor::Random
    }

    /// Whether a map from `sub_pool` can be used for this action.
    #[must_use]
    pub fn accepts(&self, sub_pool: u8) -> bool {
        self.sub_pool.is_none_or(|required| required == sub_pool)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match (self.actor, self.kind) {
            (Actor::X, ActionKind::Pick) => 'X',
            (Actor::X, ActionKind::Ban) => 'x',
            (Actor::Y, ActionKind::Pick) => 'Y',
            (Actor::Y, ActionKind::Ban) => 'y',
            (Actor::Random, ActionKind::Pick) => 'R',
            (Actor::Random, ActionKind::Ban) => 'r',
        };

        write!(f, "{letter}")?;
        if let Some(sub_pool) = self.sub_pool {
            write!(f, "{sub_pool}")?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Procedure(pub Vec<Action>);

impl Procedure {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Action> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.0.iter()
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", actions.join(" "))
    }
}

impl FromStr for Procedure {
    type Err = MalformedInput;

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        let mut actions = Vec::new();

        for (i, token) in string.split(char::is_whitespace).enumerate() {
            // Extra whitespace.
            if token.is_empty() {
                continue;
            }

            actions.push(Action::parse(token, i + 1)?);
        }

        Ok(Self(actions))
    }
}
