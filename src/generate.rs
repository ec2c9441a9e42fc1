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
use rustc_hash::FxHashSet;

use crate::{
    Id, bracket::BracketRound, error::MalformedInput, matches::Match, standings::Standing,
};

const ROUND_ROBIN_TEAMS: (usize, usize) = (2, 16);
const SINGLE_ELIMINATION_TEAMS: (usize, usize) = (2, 256);
const SWISS_TEAMS: (usize, usize) = (2, 256);

struct Ids(Id);

impl Ids {
    fn next(&mut self) -> Id {
        let id = self.0;
        self.0 += 1;
        id
    }
}

fn team_count(teams: &[Id], (min, max): (usize, usize)) -> Result<u32, MalformedInput> {
    if teams.len() < min || teams.len() > max {
        return Err(MalformedInput::BracketSize { min, max });
    }

    u32::try_from(teams.len()).map_err(|_| MalformedInput::BracketSize { min, max })
}

fn team(teams: &[Id], seed: Option<u32>) -> Option<Id> {
    seed.and_then(|seed| teams.get(seed as usize - 1).copied())
}

/// Creates a group stage where everybody plays everybody once. `teams` is in
/// seed order.
///
/// # Errors
///
/// If there are fewer than 2 or more than 16 teams.
pub fn round_robin(
    bracket_id: Id,
    first_id: Id,
    teams: &[Id],
) -> Result<(Vec<BracketRound>, Vec<Match>), MalformedInput> {
    let size = team_count(teams, ROUND_ROBIN_TEAMS)?;
    let round_count = if size % 2 == 0 { size - 1 } else { size };
    // With an odd number of teams the last seed is a dummy and playing it is a bye.
    let count = size + size % 2;

    let mut ids = Ids(first_id);
    let mut rounds: Vec<BracketRound> = (1..=round_count)
        .map(|number| BracketRound {
            id: ids.next(),
            bracket_id,
            number,
            name: format!("round {number}"),
            ..BracketRound::default()
        })
        .collect();

    let mut matches = Vec::new();
    for round in &mut rounds {
        let number = round.number;
        let mut sort_number = 0;

        for i in 0..count / 2 {
            let x = if i == 0 {
                0
            } else {
                count - 1 - (count - i + number - 2) % (count - 1)
            };
            let y = count - 1 - (i + number - 1) % (count - 1);

            if y >= size {
                round.bye_team_id = team(teams, Some(x + 1));
                continue;
            } else if x >= size {
                round.bye_team_id = team(teams, Some(y + 1));
                continue;
            }

            let (mut seed_x, mut seed_y) = (x + 1, y + 1);
            if seed_x == 1 && number % 2 == 0 {
                (seed_x, seed_y) = (seed_y, seed_x);
            }

            matches.push(Match {
                id: ids.next(),
                bracket_id,
                bracket_round: number,
                sort_number,
                seed_x: Some(seed_x),
                seed_y: Some(seed_y),
                team_x: team(teams, Some(seed_x)),
                team_y: team(teams, Some(seed_y)),
                ..Match::default()
            });
            sort_number += 1;
        }
    }

    debug!(
        "generate: round robin for {size} teams, {round_count} rounds, {} matches",
        matches.len()
    );

    Ok((rounds, matches))
}

/// The standard seed order, so that the best seeds meet as late as possible.
#[must_use]
pub fn seed_order(bracket_size: u32) -> Vec<u32> {
    let mut seeds: Vec<u32> = (1..=bracket_size).collect();

    let mut group = 1;
    while group < bracket_size / 2 {
        seeds = (0..bracket_size)
            .map(|i| {
                let index = if (i / group) % 2 == 0 {
                    (i / 2 / group) * group + i % group
                } else {
                    bracket_size - (i / 2 / group + 1) * group + i % group
                };
                seeds[index as usize]
            })
            .collect();

        group *= 2;
    }

    seeds
}

#[derive(Clone, Copy)]
struct Slot {
    seed: Option<u32>,
    parent: Option<Id>,
    bye: bool,
}

fn elimination_round_name(slots: u32, number: u32) -> String {
    match slots {
        2 => "finals".to_string(),
        4 => "semi-finals".to_string(),
        8 => "quarter-finals".to_string(),
        _ => format!("round {number}"),
    }
}

/// Creates a single elimination bracket, plus a bronze match when there are
/// at least 4 teams. `teams` is in seed order; the best seeds get the byes.
///
/// # Errors
///
/// If there are fewer than 2 or more than 256 teams.
pub fn single_elimination(
    bracket_id: Id,
    first_id: Id,
    teams: &[Id],
) -> Result<(Vec<BracketRound>, Vec<Match>), MalformedInput> {
    let size = team_count(teams, SINGLE_ELIMINATION_TEAMS)?;
    let bracket_size = size.next_power_of_two();
    let round_count = bracket_size.trailing_zeros();
    let byes = bracket_size - size;

    let mut ids = Ids(first_id);
    let rounds: Vec<BracketRound> = (1..=round_count)
        .map(|number| BracketRound {
            id: ids.next(),
            bracket_id,
            number,
            name: elimination_round_name(bracket_size >> (number - 1), number),
            ..BracketRound::default()
        })
        .collect();

    let mut slots: Vec<Slot> = seed_order(bracket_size)
        .into_iter()
        .map(|seed| Slot {
            seed: Some(seed),
            parent: None,
            bye: seed <= byes,
        })
        .collect();

    let mut matches: Vec<Match> = Vec::new();
    let mut final_match = None;
    let mut number = 1;

    while slots.len() > 1 {
        let mut next_round = Vec::with_capacity(slots.len() / 2);
        let mut sort_number = 0;

        for pair in slots.chunks_exact(2) {
            let (x, y) = (pair[0], pair[1]);
            if x.bye {
                next_round.push(Slot { bye: false, ..x });
                continue;
            }

            let id = ids.next();
            matches.push(Match {
                id,
                bracket_id,
                bracket_round: number,
                sort_number,
                seed_x: x.seed,
                seed_y: y.seed,
                team_x: team(teams, x.seed),
                team_y: team(teams, y.seed),
                parent_match_x: x.parent,
                parent_match_y: y.parent,
                ..Match::default()
            });
            sort_number += 1;

            next_round.push(Slot {
                seed: None,
                parent: Some(id),
                bye: false,
            });
        }

        if slots.len() == 2 {
            final_match = matches.last().cloned();
        }

        slots = next_round;
        number += 1;
    }

    if size >= 4
        && let Some(final_match) = final_match
    {
        matches.push(Match {
            id: ids.next(),
            bracket_id,
            bracket_round: final_match.bracket_round,
            sort_number: final_match.sort_number + 1,
            parent_match_x: final_match.parent_match_x,
            parent_match_x_is_loser: true,
            parent_match_y: final_match.parent_match_y,
            parent_match_y_is_loser: true,
            ..Match::default()
        });
    }

    debug!(
        "generate: single elimination for {size} teams, {round_count} rounds, {} matches",
        matches.len()
    );

    Ok((rounds, matches))
}

/// A run of teams with the same score in the standings.
struct ScoreGroup {
    offset: usize,
    size: usize,
}

impl ScoreGroup {
    /// The first team of the bottom half.
    fn middle(&self) -> usize {
        self.offset + self.size.div_ceil(2)
    }

    fn end(&self) -> usize {
        self.offset + self.size
    }
}

fn score_groups(standings: &[Standing]) -> (Vec<ScoreGroup>, Vec<usize>) {
    let mut groups: Vec<ScoreGroup> = Vec::new();
    let mut group_of = Vec::with_capacity(standings.len());

    for (i, standing) in standings.iter().enumerate() {
        match groups.last_mut() {
            Some(group)
                if standings[group.offset]
                    .score_won
                    .total_cmp(&standing.score_won)
                    .is_eq() =>
            {
                group.size += 1;
            }
            _ => groups.push(ScoreGroup { offset: i, size: 1 }),
        }
        group_of.push(groups.len() - 1);
    }

    (groups, group_of)
}

/// The lowest score group with a team that hasn't had a bye yet gives the
/// bye, starting from its middle.
fn pick_bye(standings: &[Standing], groups: &[ScoreGroup]) -> Option<usize> {
    groups.iter().rev().find_map(|group| {
        let middle = group.middle();
        (group.offset..middle)
            .rev()
            .chain(middle..group.end())
            .find(|i| standings[*i].byes == 0)
    })
}

struct Pairing {
    teams: Vec<Id>,
    groups: Vec<ScoreGroup>,
    group_of: Vec<usize>,
    played: FxHashSet<(Id, Id)>,
    picked: Vec<bool>,
    pairs: Vec<(usize, usize)>,
}

impl Pairing {
    /// Dutch pairing: within a score group the top half meets the bottom half
    /// (1v5, 2v6, 3v7, 4v8 for a group of 8). When that fails, the rest of
    /// the top half is tried going up, then the weaker score groups.
    fn candidates(&self, x: usize) -> Vec<usize> {
        let group = &self.groups[self.group_of[x]];
        let middle = group.middle();

        if x >= middle {
            return (x + 1..self.teams.len()).collect();
        }

        let mut candidates: Vec<usize> = (middle..group.end())
            .chain((x + 1..middle).rev())
            .collect();
        for group in &self.groups[self.group_of[x] + 1..] {
            let middle = group.middle();
            candidates.extend(middle..group.end());
            candidates.extend((group.offset..middle).rev());
        }

        candidates
    }

    fn find_pair(&mut self, x: usize) -> bool {
        self.picked[x] = true;

        for y in self.candidates(x) {
            if self.try_pair(x, y) {
                return true;
            }
        }

        self.picked[x] = false;
        false
    }

    fn try_pair(&mut self, x: usize, y: usize) -> bool {
        if self.picked[y] || self.played.contains(&(self.teams[x], self.teams[y])) {
            return false;
        }

        // The weaker team plays as X.
        self.picked[y] = true;
        self.pairs.push((y, x));

        let next = (x + 1..self.teams.len()).find(|i| !self.picked[*i]);
        if next.is_none_or(|next| self.find_pair(next)) {
            return true;
        }

        trace!("generate: backtracking from {} vs {}", self.teams[y], self.teams[x]);
        self.picked[y] = false;
        self.pairs.pop();
        false
    }
}

/// Pairs the next round of a Swiss bracket.
///
/// `standings` is the current table, best first, as returned by
/// [`crate::tiebreak::standings`], with teams that haven't played yet
/// appended. `rounds` and `matches` are the bracket's existing records. The
/// new round is numbered after the highest existing one; it gets `first_id`
/// and its matches the ids after it.
///
/// # Errors
///
/// If an existing match isn't reported, there are fewer than 2 or more than
/// 256 teams, every team already had a bye, or the teams can't be paired
/// without a rematch.
pub fn swiss_round(
    bracket_id: Id,
    first_id: Id,
    standings: &[Standing],
    rounds: &[BracketRound],
    matches: &[Match],
) -> Result<(BracketRound, Vec<Match>), MalformedInput> {
    if let Some(game) = matches.iter().find(|game| !game.is_reported()) {
        return Err(MalformedInput::Unreported(game.id));
    }

    let teams: Vec<Id> = standings.iter().map(|standing| standing.team_id).collect();
    team_count(&teams, SWISS_TEAMS)?;

    let (groups, group_of) = score_groups(standings);
    let mut picked = vec![false; teams.len()];

    let bye = if teams.len() % 2 == 1 {
        let bye = pick_bye(standings, &groups).ok_or(MalformedInput::NoByeCandidate)?;
        picked[bye] = true;
        Some(bye)
    } else {
        None
    };

    let mut played = FxHashSet::default();
    for game in matches {
        if let (Some(x), Some(y)) = (game.team_x, game.team_y) {
            played.insert((x, y));
            played.insert((y, x));
        }
    }

    let start = picked.iter().position(|picked| !picked);
    let mut pairing = Pairing {
        teams,
        groups,
        group_of,
        played,
        picked,
        pairs: Vec::new(),
    };

    if let Some(start) = start
        && !pairing.find_pair(start)
    {
        return Err(MalformedInput::NoPairing);
    }

    let number = rounds
        .iter()
        .map(|round| round.number)
        .max()
        .unwrap_or_default()
        + 1;

    let mut ids = Ids(first_id);
    let round = BracketRound {
        id: ids.next(),
        bracket_id,
        number,
        name: format!("round {number}"),
        bye_team_id: bye.map(|i| pairing.teams[i]),
        ..BracketRound::default()
    };

    let matches: Vec<Match> = pairing
        .pairs
        .iter()
        .zip(0..)
        .map(|(&(x, y), sort_number)| Match {
            id: ids.next(),
            bracket_id,
            bracket_round: number,
            sort_number,
            team_x: Some(pairing.teams[x]),
            team_y: Some(pairing.teams[y]),
            ..Match::default()
        })
        .collect();

    debug!(
        "generate: swiss round {number}, {} score groups, {} matches",
        pairing.groups.len(),
        matches.len()
    );

    Ok((round, matches))
}
