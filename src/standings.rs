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

use serde::{Deserialize, Serialize};

use crate::Id;

/// One team's row in a bracket's standings, already in ranking order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Standing {
    pub team_id: Id,
    pub matches_played: u32,
    pub matches_lost: u32,
    pub match_loss_weight: u32,
    pub byes: u32,
    pub score_won: f64,
    pub score_lost: f64,
    pub raw_score_won: f64,
    pub raw_score_lost: f64,
    pub raw_score_ratio: f64,
    pub maps_played: u32,
    pub maps_won: u32,
    pub maps_lost: u32,
    pub rounds_played: u32,
    pub rounds_won: u32,
    pub rounds_lost: u32,
    pub buchholz: f64,
    pub median_buchholz: f64,
    /// How many of the rows right below this one are tied with it.
    pub equals_below: usize,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    #[must_use]
    pub fn from_place(place: usize) -> Option<Self> {
        match place {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }
}

impl fmt::Display for Medal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gold => write!(f, "gold"),
            Self::Silver => write!(f, "silver"),
            Self::Bronze => write!(f, "bronze"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StandingRow<'a> {
    pub standing: &'a Standing,
    /// Only the first row of a tied block has a place.
    pub place: Option<usize>,
    pub place_to: Option<usize>,
    pub odd: bool,
    pub medal: Option<Medal>,
}

impl StandingRow<'_> {
    /// How many rows the place cell spans.
    #[must_use]
    pub fn row_span(&self) -> usize {
        match (self.place, self.place_to) {
            (Some(place), Some(place_to)) => place_to - place + 1,
            _ => 1,
        }
    }
}

impl fmt::Display for StandingRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let place = match (self.place, self.place_to) {
            (Some(place), Some(place_to)) => format!("{place} - {place_to}"),
            (Some(place), None) => place.to_string(),
            _ => String::new(),
        };
        let standing = self.standing;

        write!(
            f,
            "{place:>7} | {:<8} {:>6} {:>4} {:>4} {:>8}",
            standing.team_id,
            standing.score_won,
            standing.maps_won,
            standing.rounds_won,
            standing.match_loss_weight
        )?;

        if let Some(medal) = self.medal {
            write!(f, " {medal}")?;
        }

        Ok(())
    }
}

/// Numbers the rows of `standings`, merging tied rows into blocks.
#[must_use]
pub fn rank(standings: &[Standing]) -> Vec<StandingRow<'_>> {
    let mut rows = Vec::with_capacity(standings.len());
    let mut ties_left = 0;
    let mut odd = true;

    for (i, standing) in standings.iter().enumerate() {
        let counter = i + 1;

        let (place, place_to) = if ties_left == 0 {
            if standing.equals_below > 0 {
                ties_left = standing.equals_below;
                (Some(counter), Some(counter + standing.equals_below))
            } else {
                (Some(counter), None)
            }
        } else {
            ties_left -= 1;
            (None, None)
        };

        rows.push(StandingRow {
            standing,
            place,
            place_to,
            odd,
            medal: place.and_then(Medal::from_place),
        });

        odd = !odd;
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standings(equals_below: &[usize]) -> Vec<Standing> {
        equals_below
            .iter()
            .zip(1..)
            .map(|(equals_below, team_id)| Standing {
                team_id,
                equals_below: *equals_below,
                ..Standing::default()
            })
            .collect()
    }

    fn places(rows: &[StandingRow]) -> Vec<(Option<usize>, Option<usize>)> {
        rows.iter().map(|row| (row.place, row.place_to)).collect()
    }

    #[test]
    fn tie_grouping() {
        let standings = standings(&[0, 2, 0, 0, 0]);
        let rows = rank(&standings);

        assert_eq!(
            places(&rows),
            vec![
                (Some(1), None),
                (Some(2), Some(4)),
                (None, None),
                (None, None),
                (Some(5), None)
            ]
        );
        assert_eq!(rows[1].row_span(), 3);
        assert_eq!(rows[4].row_span(), 1);
    }

    #[test]
    fn decreasing_counts_inside_a_block() {
        let standings = standings(&[3, 2, 1, 0, 0]);
        let rows = rank(&standings);

        assert_eq!(
            places(&rows),
            vec![
                (Some(1), Some(4)),
                (None, None),
                (None, None),
                (None, None),
                (Some(5), None)
            ]
        );
    }

    #[test]
    fn medals_and_striping() {
        let standings = standings(&[0, 1, 0, 0, 0]);
        let rows = rank(&standings);

        let medals: Vec<Option<Medal>> = rows.iter().map(|row| row.medal).collect();
        assert_eq!(
            medals,
            vec![Some(Medal::Gold), Some(Medal::Silver), None, None, None]
        );

        let odd: Vec<bool> = rows.iter().map(|row| row.odd).collect();
        assert_eq!(odd, vec![true, false, true, false, true]);
    }

    #[test]
    fn idempotent() {
        let standings = standings(&[1, 0, 0, 3, 0, 0, 0]);
        let rows = rank(&standings);

        let again: Vec<Standing> = rows.iter().map(|row| row.standing.clone()).collect();
        assert_eq!(places(&rank(&again)), places(&rows));
    }

    #[test]
    fn empty() {
        assert!(rank(&[]).is_empty());
    }
}
