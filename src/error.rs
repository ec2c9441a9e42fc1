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

use thiserror::Error;

use crate::{Id, matches::Side};

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum MalformedInput {
    #[error("bracket: unknown bracket type '{0}'")]
    BracketType(String),
    #[error("bracket: the number of participants isn't in [{min}, {max}] range")]
    BracketSize { min: usize, max: usize },
    #[error("layout: match {0} has parents, but the bracket type has no tree")]
    UnexpectedParent(Id),
    #[error("layout: match {match_id} references the missing parent match {parent}")]
    DanglingParent { match_id: Id, parent: Id },
    #[error("layout: match {0} is in round {1}, which doesn't exist")]
    UnknownRound(Id, u32),
    #[error("layout: round numbers must run from 1 without gaps or repeats, found {0}")]
    RoundNumber(u32),
    #[error("layout: sort number {sort_number} is used twice in round {round}")]
    DuplicateSortNumber { round: u32, sort_number: u32 },
    #[error("layout: the final round doesn't have a gold match")]
    NoGoldMatch,
    #[error("layout: match {0} is reachable more than once")]
    PlacedTwice(Id),
    #[error("layout: match {0} isn't reachable from the gold match")]
    Unreachable(Id),
    #[error("layout: match {0} is a second bronze match")]
    SecondBronze(Id),
    #[error("generate: match {0} doesn't have a report")]
    Unreported(Id),
    #[error("generate: failed to find a team to bye")]
    NoByeCandidate,
    #[error("generate: failed to pair the teams")]
    NoPairing,
    #[error("procedure: bad action #{0}, too long")]
    ActionTooLong(usize),
    #[error("procedure: bad action #{0}, bad letter '{1}'")]
    ActionLetter(usize, char),
    #[error("procedure: bad action #{0}, bad digit '{1}'")]
    ActionDigit(usize, char),
    #[error("veto: the procedure has {actions} actions, but the bracket has only {maps} maps")]
    ProcedureTooLong { actions: usize, maps: usize },
    #[error("veto: {selections} selections for a procedure of {actions} actions")]
    TooManySelections { selections: usize, actions: usize },
    #[error("veto: match {0} doesn't exist")]
    UnknownMatch(Id),
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum IllegalVetoAction {
    #[error("veto: the maps are ready")]
    Ready,
    #[error("veto: the next action is automatic")]
    Automatic,
    #[error("veto: it's side {0}'s turn")]
    Turn(Side),
    #[error("veto: map {0} isn't eligible")]
    Ineligible(Id),
    #[error("veto: impossible action, zero viable maps")]
    NoViableMap,
}
