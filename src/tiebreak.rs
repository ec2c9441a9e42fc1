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

use std::cmp::Ordering;

use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    Id,
    bracket::{BracketRound, BracketType},
    matches::{Match, Winner},
    standings::Standing,
};

/// Ratios closer than this count as equal.
const RATIO_EPSILON: f64 = 0.0001;

/// Score added for every Swiss round a team sits out.
const BYE_SCORE: f64 = 3.0;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum HeadToHead {
    #[default]
    Pending,
    Win,
    Loss,
    Draw,
}

/// Computes the standings of a bracket, sorted best first and with
/// `equals_below` filled in. `None` means the bracket isn't ready to be
/// ranked yet.
#[must_use]
pub fn standings(
    bracket_type: BracketType,
    rounds: &[BracketRound],
    matches: &[Match],
) -> Option<Vec<Standing>> {
    let mut matches: Vec<&Match> = matches.iter().collect();
    matches.sort_by_key(|game| game.id);

    let standings = if bracket_type.is_elimination() {
        elimination(rounds, &matches)
    } else {
        if bracket_type == BracketType::RoundRobinGroup
            && !matches.first().is_some_and(|game| game.is_fully_seeded())
        {
            debug!("standings: the group stage isn't seeded yet");
            return None;
        }

        group(bracket_type, rounds, &matches)
    };

    debug!("standings: {} teams in a {bracket_type}", standings.len());
    Some(standings)
}

struct Table {
    standings: Vec<Standing>,
    index: FxHashMap<Id, usize>,
    opponents: Vec<Vec<usize>>,
}

impl Table {
    fn new() -> Self {
        Self {
            standings: Vec::new(),
            index: FxHashMap::default(),
            opponents: Vec::new(),
        }
    }

    fn entry(&mut self, team_id: Id, byes: u32) -> usize {
        if let Some(i) = self.index.get(&team_id) {
            return *i;
        }

        let i = self.standings.len();
        self.standings.push(Standing {
            team_id,
            byes,
            ..Standing::default()
        });
        self.opponents.push(Vec::new());
        self.index.insert(team_id, i);
        i
    }
}

fn group(
    bracket_type: BracketType,
    rounds: &[BracketRound],
    matches: &[&Match],
) -> Vec<Standing> {
    let default_byes = u32::from(bracket_type == BracketType::RoundRobinGroup);
    let mut table = Table::new();
    let mut head_to_head = FxHashMap::default();

    for game in matches {
        // Swiss rounds that aren't paired yet.
        let (Some(team_x), Some(team_y)) = (game.team_x, game.team_y) else {
            continue;
        };

        let x = table.entry(team_x, default_byes);
        let y = table.entry(team_y, default_byes);

        let (Some(report), Some(score_x), Some(score_y)) =
            (game.report.as_ref(), game.score_x, game.score_y)
        else {
            head_to_head.insert((team_x, team_y), HeadToHead::Pending);
            head_to_head.insert((team_y, team_x), HeadToHead::Pending);
            continue;
        };

        table.opponents[x].push(y);
        table.opponents[y].push(x);

        let (x_result, y_result) = match game.winner() {
            Some(Winner::X) => (HeadToHead::Win, HeadToHead::Loss),
            Some(Winner::Y) => (HeadToHead::Loss, HeadToHead::Win),
            _ => (HeadToHead::Draw, HeadToHead::Draw),
        };
        head_to_head.insert((team_x, team_y), x_result);
        head_to_head.insert((team_y, team_x), y_result);

        let standing = &mut table.standings[x];
        standing.matches_played += 1;
        standing.score_won += score_x;
        standing.score_lost += score_y;
        standing.raw_score_won += report.raw_score_x;
        standing.raw_score_lost += report.raw_score_y;
        standing.maps_played += report.maps_played;
        standing.maps_won += report.maps_x;
        standing.maps_lost += report.maps_y;
        standing.rounds_played += report.rounds_played;
        standing.rounds_won += report.rounds_x;
        standing.rounds_lost += report.rounds_y;

        let standing = &mut table.standings[y];
        standing.matches_played += 1;
        standing.score_won += score_y;
        standing.score_lost += score_x;
        standing.raw_score_won += report.raw_score_y;
        standing.raw_score_lost += report.raw_score_x;
        standing.maps_played += report.maps_played;
        standing.maps_won += report.maps_y;
        standing.maps_lost += report.maps_x;
        standing.rounds_played += report.rounds_played;
        standing.rounds_won += report.rounds_y;
        standing.rounds_lost += report.rounds_x;
    }

    if bracket_type.is_swiss() {
        for team_id in rounds.iter().filter_map(|round| round.bye_team_id) {
            let i = table.entry(team_id, 0);
            table.standings[i].byes += 1;
            table.standings[i].score_won += BYE_SCORE;
        }
    }

    for standing in &mut table.standings {
        raw_score_ratio(standing);
    }

    let scores: Vec<f64> = table
        .standings
        .iter()
        .map(|standing| standing.score_won)
        .collect();
    for (standing, opponents) in table.standings.iter_mut().zip(&table.opponents) {
        buchholz(standing, opponents.iter().map(|i| scores[*i]).collect());
    }

    let median_buchholz = bracket_type.uses_median_buchholz();
    let compare = |a: &Standing, b: &Standing| {
        b.score_won
            .total_cmp(&a.score_won)
            .then_with(|| {
                if median_buchholz {
                    b.median_buchholz.total_cmp(&a.median_buchholz)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| b.maps_won.cmp(&a.maps_won))
            .then_with(|| b.rounds_won.cmp(&a.rounds_won))
            .then_with(|| compare_ratios(b, a))
    };

    let mut standings = table.standings;
    standings.sort_by_key(|standing| standing.team_id);
    standings.sort_by(compare);

    let result = |a: &Standing, b: &Standing| {
        head_to_head
            .get(&(a.team_id, b.team_id))
            .copied()
            .unwrap_or_default()
    };

    // Within a block tied on every other key, winners move ahead of the teams
    // they beat.
    let mut start = 0;
    while start < standings.len() {
        let mut end = start + 1;
        while end < standings.len() && compare(&standings[start], &standings[end]).is_eq()
        {
            end += 1;
        }

        for i in start + 1..end {
            let mut j = i;
            while j > start && result(&standings[j], &standings[j - 1]) == HeadToHead::Win {
                standings.swap(j, j - 1);
                j -= 1;
            }
        }

        start = end;
    }

    let mut block = 0;
    for i in 1..standings.len() {
        let tied = compare(&standings[block], &standings[i]).is_eq()
            && matches!(
                result(&standings[i], &standings[block]),
                HeadToHead::Pending | HeadToHead::Draw
            );

        if tied {
            standings[block].equals_below += 1;
        } else {
            block = i;
        }
    }

    standings
}

fn elimination(rounds: &[BracketRound], matches: &[&Match]) -> Vec<Standing> {
    let round_count = u32::try_from(rounds.len()).unwrap_or(u32::MAX);
    let mut table = Table::new();

    for game in matches {
        let x = game.team_x.map(|team| table.entry(team, 0));
        let y = game.team_y.map(|team| table.entry(team, 0));

        let (Some(x), Some(y), true) = (x, y, game.is_reported()) else {
            continue;
        };

        let loss_weight =
            2_u32.saturating_pow(round_count.saturating_sub(game.bracket_round));

        table.standings[x].matches_played += 1;
        table.standings[y].matches_played += 1;

        let loser = match game.winner() {
            Some(Winner::X) => Some(y),
            Some(Winner::Y) => Some(x),
            _ => None,
        };

        if let Some(loser) = loser {
            table.standings[loser].matches_lost += 1;
            table.standings[loser].match_loss_weight += loss_weight;
        }
    }

    let mut standings = table.standings;
    standings.sort_by_key(|standing| (standing.match_loss_weight, standing.matches_lost));

    let mut block = 0;
    for i in 1..standings.len() {
        if standings[block].match_loss_weight == standings[i].match_loss_weight
            && standings[block].matches_lost == standings[i].matches_lost
        {
            standings[block].equals_below += 1;
        } else {
            block = i;
        }
    }

    standings
}

fn raw_score_ratio(standing: &mut Standing) {
    if standing.raw_score_lost < 0.0 {
        standing.raw_score_won -= standing.raw_score_lost;
        standing.raw_score_lost = 0.0;
    }

    if standing.raw_score_won < 0.0 {
        standing.raw_score_lost -= standing.raw_score_won;
        standing.raw_score_won = 0.0;
    }

    standing.raw_score_ratio = if standing.raw_score_lost == 0.0 {
        if standing.raw_score_won == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        standing.raw_score_won / standing.raw_score_lost
    };
}

fn buchholz(standing: &mut Standing, mut scores: Vec<f64>) {
    if scores.len() < 3 {
        return;
    }

    scores.sort_by(f64::total_cmp);
    let n = scores.len();

    standing.buchholz = scores.iter().sum();
    standing.median_buchholz = standing.buchholz - scores[0] - scores[n - 1];
    if n >= 9 {
        standing.median_buchholz -= scores[1] + scores[n - 2];
    }
}

/// A total order on raw score ratios: an infinite ratio beats every finite one
/// and ties on the raw score won, finite ratios are compared in steps of
/// [`RATIO_EPSILON`] and teams that won nothing prefer having lost less.
fn compare_ratios(a: &Standing, b: &Standing) -> Ordering {
    let key = |standing: &Standing| {
        if standing.raw_score_ratio.is_infinite() {
            (1, standing.raw_score_won, 0.0)
        } else {
            let tie = if standing.raw_score_won == 0.0 {
                -standing.raw_score_lost
            } else {
                0.0
            };

            (0, (standing.raw_score_ratio / RATIO_EPSILON).round(), tie)
        }
    };

    let (a_class, a_primary, a_tie) = key(a);
    let (b_class, b_primary, b_tie) = key(b);

    a_class
        .cmp(&b_class)
        .then_with(|| a_primary.total_cmp(&b_primary))
        .then_with(|| a_tie.total_cmp(&b_tie))
}
