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

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::{
    Id,
    bracket::BracketRound,
    dimensions::Dimensions,
    error::MalformedInput,
    layout::Body,
    matches::{Match, Side},
};

struct Tree<'a> {
    dimensions: &'a Dimensions,
    matches: &'a [Match],
    index: FxHashMap<Id, usize>,
    /// The smallest height a subtree rooted in round `r` fits in, indexed by `r`.
    spans: Vec<f64>,
    offsets: Vec<Option<f64>>,
}

impl Tree<'_> {
    fn span(&self, round: u32) -> f64 {
        self.spans[round as usize]
    }

    fn parent(&self, i: usize, side: Side) -> Result<Option<usize>, MalformedInput> {
        let game = &self.matches[i];
        let Some(parent) = game.winner_parent(side) else {
            return Ok(None);
        };

        match self.index.get(&parent) {
            Some(parent) => Ok(Some(*parent)),
            None => Err(MalformedInput::DanglingParent {
                match_id: game.id,
                parent,
            }),
        }
    }

    /// Places match `i` at `offset` and its parents relative to it. Returns the
    /// final offset and how far the caller has to move down so that nothing
    /// above it sticks out of the canvas.
    fn space_out(&mut self, i: usize, offset: f64) -> Result<(f64, f64), MalformedInput> {
        if self.offsets[i].is_some() {
            return Err(MalformedInput::PlacedTwice(self.matches[i].id));
        }

        let (mut offset, mut overflow) = if offset < 0.0 {
            (0.0, -offset)
        } else {
            (offset, 0.0)
        };
        self.offsets[i] = Some(offset);

        let team_height = self.dimensions.team_height;
        let half_distance = self.dimensions.team_distance / 2.0;

        if let Some(parent) = self.parent(i, Side::X)? {
            let span = self.span(self.matches[parent].bracket_round);
            let (_, move_more) =
                self.space_out(parent, offset + team_height + half_distance - span / 2.0)?;

            offset += move_more;
            overflow += move_more;
        }

        if let Some(parent) = self.parent(i, Side::Y)? {
            let span = self.span(self.matches[parent].bracket_round);
            self.space_out(
                parent,
                offset + team_height + half_distance + span / 2.0
                    - self.dimensions.match_height(),
            )?;
        }

        trace!(
            "elimination: match {} at {offset}, moving {overflow}",
            self.matches[i].id
        );
        self.offsets[i] = Some(offset);

        Ok((offset, overflow))
    }
}

#[must_use]
pub fn spans(dimensions: &Dimensions, round_count: u32) -> Vec<f64> {
    let first = dimensions.match_height() * 2.0 + dimensions.pair_inner_distance;
    let mut spans = vec![0.0, first];

    let mut pairs = 1.0;
    for _ in 2..=round_count {
        spans.push(
            first * pairs
                + dimensions.pair_outer_distance * pairs
                + dimensions.team_height * 2.0
                + dimensions.team_distance,
        );
        pairs *= 2.0;
    }

    spans
}

/// Single elimination: the gold match is pinned to the top and every parent is
/// centered on the side it feeds; the bronze match sits under the gold match.
pub(crate) fn tree(
    dimensions: &Dimensions,
    rounds: &[BracketRound],
    matches: &[Match],
) -> Result<Body, MalformedInput> {
    let index: FxHashMap<Id, usize> = matches
        .iter()
        .enumerate()
        .map(|(i, game)| (game.id, i))
        .collect();

    for game in matches {
        for side in [Side::X, Side::Y] {
            if let Some(parent) = game.parent(side)
                && !index.contains_key(&parent)
            {
                return Err(MalformedInput::DanglingParent {
                    match_id: game.id,
                    parent,
                });
            }
        }
    }

    let last_round = rounds.iter().map(|round| round.number).max().unwrap_or_default();

    let mut gold = None;
    let mut bronze = None;
    for (i, game) in matches.iter().enumerate() {
        if game.bracket_round != last_round {
            continue;
        }

        if game.is_loser_sourced() {
            if bronze.is_some() {
                return Err(MalformedInput::SecondBronze(game.id));
            }
            bronze = Some(i);
        } else {
            gold.get_or_insert(i);
        }
    }

    let Some(gold) = gold else {
        return Err(MalformedInput::NoGoldMatch);
    };

    let mut tree = Tree {
        dimensions,
        matches,
        index,
        spans: spans(dimensions, last_round),
        offsets: vec![None; matches.len()],
    };

    let (gold_offset, _) = tree.space_out(gold, 0.0)?;

    if let Some(bronze) = bronze {
        tree.offsets[bronze] =
            Some(gold_offset + dimensions.match_height() + dimensions.pair_inner_distance);
    }

    let mut offsets = Vec::with_capacity(matches.len());
    for (game, offset) in matches.iter().zip(&tree.offsets) {
        match offset {
            Some(offset) => offsets.push(*offset),
            None => return Err(MalformedInput::Unreachable(game.id)),
        }
    }

    let height = offsets.iter().copied().fold(0.0, f64::max) + dimensions.match_height();

    debug!("elimination: {last_round} rounds, gold match at {gold_offset}, height {height}");

    Ok(Body {
        height,
        offsets,
        bronze,
        byes: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use crate::{
        bracket::BracketType,
        generate,
        layout::{ConnectorStyle, Layout, layout},
    };

    use super::*;

    fn lay_out(teams: u128) -> anyhow::Result<Layout> {
        let teams: Vec<Id> = (1..=teams).collect();
        let (rounds, matches) = generate::single_elimination(1, 100, &teams)?;

        layout(BracketType::SingleElimination, &rounds, &matches)?
            .ok_or_else(|| anyhow::Error::msg("expected a layout"))
    }

    fn center(layout: &Layout, match_id: Id) -> anyhow::Result<f64> {
        let placed = layout
            .placed(match_id)
            .ok_or_else(|| anyhow::Error::msg("the match isn't placed"))?;

        Ok(placed.offset + Dimensions::default().match_height() / 2.0)
    }

    #[test]
    fn spans_double_per_round() {
        let spans = spans(&Dimensions::default(), 4);

        assert_eq!(spans, vec![0.0, 180.0, 278.0, 490.0, 914.0]);
    }

    #[test]
    fn balanced_bracket_is_symmetric() -> anyhow::Result<()> {
        let teams: Vec<Id> = (1..=8).collect();
        let (rounds, matches) = generate::single_elimination(1, 100, &teams)?;
        let layout = layout(BracketType::SingleElimination, &rounds, &matches)?
            .ok_or_else(|| anyhow::Error::msg("expected a layout"))?;

        for game in matches.iter().filter(|game| game.bracket_round > 1) {
            if game.is_loser_sourced() {
                continue;
            }

            let (Some(x), Some(y)) = (game.parent_match_x, game.parent_match_y) else {
                return Err(anyhow::Error::msg("a balanced bracket has two parents"));
            };

            let here = center(&layout, game.id)?;
            let above = here - center(&layout, x)?;
            let below = center(&layout, y)? - here;

            assert!(above > 0.0);
            assert!((above - below).abs() < f64::EPSILON);
        }

        Ok(())
    }

    #[test]
    fn eight_teams() -> anyhow::Result<()> {
        let layout = lay_out(8)?;

        let mut offsets: Vec<f64> = layout
            .placed_matches
            .iter()
            .filter(|placed| !placed.is_bronze)
            .map(|placed| placed.offset)
            .collect();
        offsets.sort_by(f64::total_cmp);

        assert_eq!(
            offsets,
            vec![0.0, 57.0, 114.0, 163.0, 212.0, 269.0, 326.0]
        );
        assert!((layout.body_height - 392.0).abs() < f64::EPSILON);

        Ok(())
    }

    #[test]
    fn bronze_sits_under_gold() -> anyhow::Result<()> {
        let layout = lay_out(8)?;

        let gold = layout
            .placed_matches
            .iter()
            .find(|placed| placed.round == 3 && !placed.is_bronze)
            .ok_or_else(|| anyhow::Error::msg("no gold match"))?;
        let bronze = layout
            .placed_matches
            .iter()
            .find(|placed| placed.is_bronze)
            .ok_or_else(|| anyhow::Error::msg("no bronze match"))?;

        assert!((bronze.offset - (gold.offset + 66.0 + 48.0)).abs() < f64::EPSILON);
        assert!((bronze.x - (gold.x + 30.0)).abs() < f64::EPSILON);
        assert_eq!(bronze.title(), Some("bronze match"));
        assert!(
            layout
                .connectors
                .iter()
                .all(|connector| connector.match_id != bronze.match_id)
        );

        Ok(())
    }

    #[test]
    fn one_bronze_match() -> anyhow::Result<()> {
        let teams: Vec<Id> = (1..=4).collect();
        let (rounds, mut matches) = generate::single_elimination(1, 100, &teams)?;
        let bronze = matches
            .last()
            .cloned()
            .ok_or_else(|| anyhow::Error::msg("no bronze"))?;
        matches.push(Match {
            id: 999,
            sort_number: bronze.sort_number + 1,
            ..bronze
        });

        assert_eq!(
            layout(BracketType::SingleElimination, &rounds, &matches),
            Err(MalformedInput::SecondBronze(999))
        );

        Ok(())
    }

    #[test]
    fn nothing_is_off_canvas() -> anyhow::Result<()> {
        for teams in 2..=40 {
            let layout = lay_out(teams)?;
            let lowest = layout
                .placed_matches
                .iter()
                .map(|placed| placed.offset)
                .fold(0.0, f64::max);

            assert!(layout.placed_matches.iter().all(|placed| placed.offset >= 0.0));
            assert!(layout.body_height >= lowest + 66.0);
        }

        Ok(())
    }

    #[test]
    fn dangling_parent() -> anyhow::Result<()> {
        let teams: Vec<Id> = (1..=4).collect();
        let (rounds, mut matches) = generate::single_elimination(1, 100, &teams)?;
        let last = matches.len() - 1;
        matches[last].parent_match_y = Some(999);

        assert!(matches!(
            layout(BracketType::SingleElimination, &rounds, &matches),
            Err(MalformedInput::DanglingParent { parent: 999, .. })
        ));

        Ok(())
    }

    #[test]
    fn shared_parent() -> anyhow::Result<()> {
        let teams: Vec<Id> = (1..=4).collect();
        let (rounds, mut matches) = generate::single_elimination(1, 100, &teams)?;
        let final_index = matches
            .iter()
            .position(|game| game.bracket_round == 2 && !game.is_loser_sourced())
            .ok_or_else(|| anyhow::Error::msg("no final"))?;
        matches[final_index].parent_match_y = matches[final_index].parent_match_x;

        assert!(matches!(
            layout(BracketType::SingleElimination, &rounds, &matches),
            Err(MalformedInput::PlacedTwice(_))
        ));

        Ok(())
    }

    #[test]
    fn connectors_follow_the_parent_winner() -> anyhow::Result<()> {
        let teams: Vec<Id> = (1..=4).collect();
        let (rounds, mut matches) = generate::single_elimination(1, 100, &teams)?;
        matches[0].score_x = Some(0.0);
        matches[0].score_y = Some(2.0);

        let layout = layout(BracketType::SingleElimination, &rounds, &matches)?
            .ok_or_else(|| anyhow::Error::msg("expected a layout"))?;
        let parent = layout
            .placed(matches[0].id)
            .ok_or_else(|| anyhow::Error::msg("the match isn't placed"))?;

        let connector = layout
            .connectors
            .iter()
            .find(|connector| connector.parent_id == matches[0].id)
            .ok_or_else(|| anyhow::Error::msg("no connector"))?;

        assert_eq!(connector.style, ConnectorStyle::Win);
        assert!((connector.y_from - (parent.offset + 66.0 - 16.0)).abs() < f64::EPSILON);

        let seeded = layout
            .connectors
            .iter()
            .find(|connector| connector.parent_id == matches[1].id)
            .ok_or_else(|| anyhow::Error::msg("no connector"))?;

        assert_eq!(seeded.style, ConnectorStyle::Seeded);
        assert_eq!(layout.connectors.len(), 2);

        Ok(())
    }

    #[test]
    fn unseeded_parents_are_pending() -> anyhow::Result<()> {
        let layout = lay_out(8)?;
        let gold = layout
            .placed_matches
            .iter()
            .find(|placed| placed.round == 3 && !placed.is_bronze)
            .ok_or_else(|| anyhow::Error::msg("no gold match"))?;

        let styles: Vec<ConnectorStyle> = layout
            .connectors
            .iter()
            .filter(|connector| connector.match_id == gold.match_id)
            .map(|connector| connector.style)
            .collect();
        assert_eq!(styles, vec![ConnectorStyle::Pending; 2]);

        let first_round = layout
            .connectors
            .iter()
            .filter(|connector| connector.style == ConnectorStyle::Seeded)
            .count();
        assert_eq!(first_round, 4);

        Ok(())
    }
}
