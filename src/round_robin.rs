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

use log::trace;
use rustc_hash::FxHashMap;

use crate::{
    bracket::BracketRound,
    dimensions::Dimensions,
    error::MalformedInput,
    layout::{Body, ByeMarker},
    matches::Match,
};

/// Group stage and Swiss brackets: every round is a column of stacked matches
/// ordered by sort number, with the round's bye underneath.
pub(crate) fn grid(
    dimensions: &Dimensions,
    rounds: &[BracketRound],
    matches: &[Match],
) -> Result<Body, MalformedInput> {
    let match_height = dimensions.match_height();
    let outer = dimensions.pair_outer_distance;
    let inner = dimensions.pair_inner_distance;

    let mut matches_per_round: FxHashMap<u32, u32> = FxHashMap::default();
    for game in matches {
        if game.has_parents() {
            return Err(MalformedInput::UnexpectedParent(game.id));
        }

        *matches_per_round.entry(game.bracket_round).or_default() += 1;
    }

    let max_matches = matches_per_round.values().copied().max().unwrap_or_default();
    let is_max_odd = rounds.iter().any(|round| {
        round.bye_team_id.is_some()
            && matches_per_round.get(&round.number).copied().unwrap_or_default() == max_matches
    });

    let mut height = column_height(dimensions, max_matches);
    if is_max_odd {
        height += inner + dimensions.team_height;
    }

    let offsets = matches
        .iter()
        .map(|game| f64::from(game.sort_number) * (match_height + outer))
        .collect();

    let mut byes = Vec::new();
    for round in rounds {
        let Some(team_id) = round.bye_team_id else {
            continue;
        };

        let count = matches_per_round.get(&round.number).copied().unwrap_or_default();
        let offset = if count == 0 {
            0.0
        } else {
            column_height(dimensions, count) + inner
        };

        byes.push(ByeMarker {
            team_id,
            round: round.number,
            x: dimensions.round_x(round.number),
            offset,
        });
    }

    trace!("round robin: {max_matches} matches per round at most, odd: {is_max_odd}");

    Ok(Body {
        height,
        offsets,
        bronze: None,
        byes,
    })
}

fn column_height(dimensions: &Dimensions, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }

    f64::from(count) * dimensions.match_height()
        + f64::from(count - 1) * dimensions.pair_outer_distance
}
