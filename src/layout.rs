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

use std::fmt;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    bracket::{BracketRound, BracketType},
    dimensions::Dimensions,
    elimination,
    error::MalformedInput,
    matches::{Match, MatchState, Side, Winner},
    round_robin,
};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Layout {
    pub bracket_type: BracketType,
    pub width: f64,
    /// The whole canvas, round headers and padding included.
    pub height: f64,
    /// The height the matches and byes take up.
    pub body_height: f64,
    pub round_headers: Vec<RoundHeader>,
    pub placed_matches: Vec<PlacedMatch>,
    pub bye_markers: Vec<ByeMarker>,
    pub connectors: Vec<Connector>,
}

impl Layout {
    #[must_use]
    pub fn placed(&self, match_id: Id) -> Option<&PlacedMatch> {
        self.placed_matches
            .iter()
            .find(|placed| placed.match_id == match_id)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {}x{} (body {})",
            self.bracket_type, self.width, self.height, self.body_height
        )?;

        for header in &self.round_headers {
            writeln!(f, "round {} '{}' x {}", header.number, header.name, header.x)?;
        }

        for placed in &self.placed_matches {
            writeln!(f, "    {placed}")?;
        }

        for bye in &self.bye_markers {
            writeln!(f, "    {bye}")?;
        }

        for connector in &self.connectors {
            writeln!(f, "    {connector}")?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoundHeader {
    pub number: u32,
    pub name: String,
    pub x: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PlacedMatch {
    pub match_id: Id,
    pub round: u32,
    pub x: f64,
    pub offset: f64,
    pub winner: Option<Winner>,
    pub state: MatchState,
    pub is_bronze: bool,
}

impl PlacedMatch {
    #[must_use]
    pub fn title(&self) -> Option<&'static str> {
        if self.is_bronze {
            Some("bronze match")
        } else {
            None
        }
    }
}

impl fmt::Display for PlacedMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "match {} round {} at ({}, {}) {}",
            self.match_id, self.round, self.x, self.offset, self.state
        )?;

        if let Some(title) = self.title() {
            write!(f, " {title}")?;
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ByeMarker {
    pub team_id: Id,
    pub round: u32,
    pub x: f64,
    pub offset: f64,
}

impl fmt::Display for ByeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bye {} round {} at ({}, {})",
            self.team_id, self.round, self.x, self.offset
        )
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ConnectorStyle {
    Pending,
    Seeded,
    Win,
}

impl fmt::Display for ConnectorStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Seeded => write!(f, "seeded"),
            Self::Win => write!(f, "win"),
        }
    }
}

/// The line from a parent match to the side of the match its winner feeds.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Connector {
    pub match_id: Id,
    pub parent_id: Id,
    pub side: Side,
    pub x_from: f64,
    pub y_from: f64,
    pub x_to: f64,
    pub y_to: f64,
    pub style: ConnectorStyle,
}

impl Connector {
    /// The polyline: out of the parent, across, and into the match.
    #[must_use]
    pub fn points(&self, dimensions: &Dimensions) -> [(f64, f64); 4] {
        let segment = dimensions.connection_segment;

        [
            (self.x_from, self.y_from),
            (self.x_from + segment, self.y_from),
            (self.x_to - segment, self.y_to),
            (self.x_to, self.y_to),
        ]
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "connector {} -> {}.{} ({}, {}) -> ({}, {}) {}",
            self.parent_id,
            self.match_id,
            self.side,
            self.x_from,
            self.y_from,
            self.x_to,
            self.y_to,
            self.style
        )
    }
}

/// What a layout strategy computes: an offset per input match.
pub(crate) struct Body {
    pub height: f64,
    pub offsets: Vec<f64>,
    pub bronze: Option<usize>,
    pub byes: Vec<ByeMarker>,
}

/// Lays out a bracket with the default dimensions.
///
/// # Errors
///
/// If the rounds and matches don't describe a consistent bracket.
pub fn layout(
    bracket_type: BracketType,
    rounds: &[BracketRound],
    matches: &[Match],
) -> Result<Option<Layout>, MalformedInput> {
    layout_with(&Dimensions::default(), bracket_type, rounds, matches)
}

/// Returns `Ok(None)` while the bracket has no rounds or matches yet.
///
/// # Errors
///
/// If the rounds and matches don't describe a consistent bracket.
pub fn layout_with(
    dimensions: &Dimensions,
    bracket_type: BracketType,
    rounds: &[BracketRound],
    matches: &[Match],
) -> Result<Option<Layout>, MalformedInput> {
    if rounds.is_empty() || matches.is_empty() {
        trace!("layout: {} rounds and {} matches, not ready", rounds.len(), matches.len());
        return Ok(None);
    }

    check(rounds, matches)?;

    let body = if bracket_type.is_elimination() {
        elimination::tree(dimensions, rounds, matches)?
    } else {
        round_robin::grid(dimensions, rounds, matches)?
    };

    let mut placed_matches = Vec::with_capacity(matches.len());
    for (i, game) in matches.iter().enumerate() {
        let is_bronze = body.bronze == Some(i);
        let mut x = dimensions.round_x(game.bracket_round);
        if is_bronze {
            x += dimensions.round_padding() / 2.0;
        }

        placed_matches.push(PlacedMatch {
            match_id: game.id,
            round: game.bracket_round,
            x,
            offset: body.offsets[i],
            winner: game.winner(),
            state: game.state(),
            is_bronze,
        });
    }

    let connectors = connectors(dimensions, matches, &body.offsets);

    let round_count = rounds.iter().map(|round| round.number).max().unwrap_or_default();
    let round_headers = rounds
        .iter()
        .map(|round| RoundHeader {
            number: round.number,
            name: round.name.clone(),
            x: (f64::from(round.number) - 0.5) * dimensions.round_width,
        })
        .collect();

    let layout = Layout {
        bracket_type,
        width: dimensions.round_width * f64::from(round_count) + dimensions.round_padding() * 2.0,
        height: dimensions.round_header_height + body.height + dimensions.bracket_padding,
        body_height: body.height,
        round_headers,
        placed_matches,
        bye_markers: body.byes,
        connectors,
    };

    debug!(
        "layout: {bracket_type} with {} matches is {}x{}",
        matches.len(),
        layout.width,
        layout.height
    );

    Ok(Some(layout))
}

fn check(rounds: &[BracketRound], matches: &[Match]) -> Result<(), MalformedInput> {
    let mut numbers: Vec<u32> = rounds.iter().map(|round| round.number).collect();
    numbers.sort_unstable();
    for (expected, number) in (1..).zip(&numbers) {
        if *number != expected {
            return Err(MalformedInput::RoundNumber(*number));
        }
    }

    let mut sort_numbers = FxHashSet::default();
    for game in matches {
        if numbers.binary_search(&game.bracket_round).is_err() {
            return Err(MalformedInput::UnknownRound(game.id, game.bracket_round));
        }

        if !sort_numbers.insert((game.bracket_round, game.sort_number)) {
            return Err(MalformedInput::DuplicateSortNumber {
                round: game.bracket_round,
                sort_number: game.sort_number,
            });
        }
    }

    Ok(())
}

fn connectors(dimensions: &Dimensions, matches: &[Match], offsets: &[f64]) -> Vec<Connector> {
    let index: FxHashMap<Id, usize> = matches
        .iter()
        .enumerate()
        .map(|(i, game)| (game.id, i))
        .collect();

    let team_height = dimensions.team_height;
    let match_height = dimensions.match_height();
    let mut connectors = Vec::new();

    for (i, game) in matches.iter().enumerate() {
        for side in [Side::X, Side::Y] {
            let Some(parent_index) = game.winner_parent(side).and_then(|id| index.get(&id)) else {
                continue;
            };
            let parent = &matches[*parent_index];
            let parent_offset = offsets[*parent_index];

            let y_from = match parent.winner() {
                Some(Winner::X) => parent_offset + team_height / 2.0,
                Some(Winner::Y) => parent_offset + match_height - team_height / 2.0,
                Some(Winner::Draw) | None => parent_offset + match_height / 2.0,
            };

            let y_to = match side {
                Side::X => offsets[i] + team_height / 2.0,
                Side::Y => offsets[i] + match_height - team_height / 2.0,
            };

            let style = if parent.winner().is_some() {
                ConnectorStyle::Win
            } else if parent.is_fully_seeded() {
                ConnectorStyle::Seeded
            } else {
                ConnectorStyle::Pending
            };

            let x_to = dimensions.round_x(game.bracket_round);

            connectors.push(Connector {
                match_id: game.id,
                parent_id: parent.id,
                side,
                x_from: x_to - dimensions.connection_width(),
                y_from,
                x_to,
                y_to,
                style,
            });
        }
    }

    connectors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(number: u32) -> BracketRound {
        BracketRound {
            id: u128::from(number),
            number,
            name: format!("round {number}"),
            ..BracketRound::default()
        }
    }

    fn game(id: Id, round: u32, sort_number: u32) -> Match {
        Match {
            id,
            bracket_round: round,
            sort_number,
            ..Match::default()
        }
    }

    #[test]
    fn empty_brackets_are_not_ready() -> anyhow::Result<()> {
        assert_eq!(layout(BracketType::SwissA, &[], &[])?, None);
        assert_eq!(
            layout(BracketType::SingleElimination, &[round(1)], &[])?,
            None
        );

        Ok(())
    }

    #[test]
    fn unknown_round() {
        let result = layout(BracketType::RoundRobinGroup, &[round(1)], &[game(5, 2, 0)]);
        assert_eq!(result, Err(MalformedInput::UnknownRound(5, 2)));
    }

    #[test]
    fn duplicate_sort_number() {
        let result = layout(
            BracketType::RoundRobinGroup,
            &[round(1)],
            &[game(1, 1, 0), game(2, 1, 0)],
        );

        assert_eq!(
            result,
            Err(MalformedInput::DuplicateSortNumber {
                round: 1,
                sort_number: 0
            })
        );
    }

    #[test]
    fn zero_round_number() {
        let result = layout(BracketType::SwissB, &[round(0)], &[game(1, 0, 0)]);
        assert_eq!(result, Err(MalformedInput::RoundNumber(0)));
    }

    #[test]
    fn round_number_gap() {
        let result = layout(
            BracketType::SingleElimination,
            &[round(1), round(5_000_000)],
            &[game(1, 1, 0), game(2, 5_000_000, 0)],
        );
        assert_eq!(result, Err(MalformedInput::RoundNumber(5_000_000)));
    }

    #[test]
    fn repeated_round_number() {
        let result = layout(
            BracketType::RoundRobinGroup,
            &[round(1), round(1), round(2)],
            &[game(1, 1, 0)],
        );
        assert_eq!(result, Err(MalformedInput::RoundNumber(1)));
    }

    #[test]
    fn canvas_includes_headers_and_padding() -> anyhow::Result<()> {
        let rounds = [round(1), round(2)];
        let matches = [game(1, 1, 0), game(2, 2, 0)];
        let layout = layout(BracketType::RoundRobinGroup, &rounds, &matches)?
            .ok_or_else(|| anyhow::Error::msg("expected a layout"))?;

        assert!((layout.width - 760.0).abs() < f64::EPSILON);
        assert!((layout.body_height - 66.0).abs() < f64::EPSILON);
        assert!((layout.height - (128.0 + 66.0 + 64.0)).abs() < f64::EPSILON);
        assert!((layout.round_headers[1].x - 480.0).abs() < f64::EPSILON);
        assert!((layout.placed_matches[1].x - 380.0).abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn connector_points() {
        let connector = Connector {
            match_id: 2,
            parent_id: 1,
            side: Side::X,
            x_from: 260.0,
            y_from: 33.0,
            x_to: 380.0,
            y_to: 73.0,
            style: ConnectorStyle::Pending,
        };

        assert_eq!(
            connector.points(&Dimensions::default()),
            [(260.0, 33.0), (290.0, 33.0), (350.0, 73.0), (380.0, 73.0)]
        );
    }
}
