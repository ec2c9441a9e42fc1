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

use std::{collections::BTreeMap, fs, path::Path};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    bracket::{Bracket, BracketRound},
    dimensions::Dimensions,
    error::MalformedInput,
    layout::{Layout, layout_with},
    matches::Match,
    standings::Standing,
    tiebreak,
    veto::{self, BracketMap, MapSelection, PlannedSelection, VetoState},
};

/// Everything the host knows about a set of brackets at one moment.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Snapshot {
    pub brackets: Vec<Bracket>,
    pub rounds: Vec<BracketRound>,
    pub matches: Vec<Match>,
    /// Standings the host already ranked, by bracket id. Brackets missing here
    /// are ranked from their matches.
    pub standings: BTreeMap<Id, Vec<Standing>>,
    pub bracket_maps: Vec<BracketMap>,
    pub selections: Vec<MapSelection>,
}

impl Snapshot {
    /// # Errors
    ///
    /// If the string isn't valid RON.
    pub fn from_ron(string: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(string)
    }

    /// # Errors
    ///
    /// If the file can't be read or isn't valid RON.
    pub fn from_ron_file(path: &Path) -> anyhow::Result<Self> {
        let string = fs::read_to_string(path)?;
        let snapshot = Self::from_ron(&string)?;

        debug!(
            "snapshot: {} brackets, {} rounds, {} matches from {}",
            snapshot.brackets.len(),
            snapshot.rounds.len(),
            snapshot.matches.len(),
            path.display()
        );

        Ok(snapshot)
    }

    /// # Errors
    ///
    /// If the snapshot can't be serialized.
    pub fn to_ron(&self) -> anyhow::Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    #[must_use]
    pub fn bracket(&self, bracket_id: Id) -> Option<&Bracket> {
        self.brackets.iter().find(|bracket| bracket.id == bracket_id)
    }

    #[must_use]
    pub fn game(&self, match_id: Id) -> Option<&Match> {
        self.matches.iter().find(|game| game.id == match_id)
    }

    /// The rounds of a bracket, by number.
    #[must_use]
    pub fn rounds_of(&self, bracket_id: Id) -> Vec<BracketRound> {
        let mut rounds: Vec<BracketRound> = self
            .rounds
            .iter()
            .filter(|round| round.bracket_id == bracket_id)
            .cloned()
            .collect();

        rounds.sort_by_key(|round| round.number);
        rounds
    }

    #[must_use]
    pub fn matches_of(&self, bracket_id: Id) -> Vec<Match> {
        self.matches
            .iter()
            .filter(|game| game.bracket_id == bracket_id)
            .cloned()
            .collect()
    }

    /// `Ok(None)` when the bracket is unknown or has nothing to lay out yet.
    ///
    /// # Errors
    ///
    /// If the bracket type is unknown or its matches don't form a valid
    /// bracket.
    pub fn layout(
        &self,
        dimensions: &Dimensions,
        bracket_id: Id,
    ) -> Result<Option<Layout>, MalformedInput> {
        let Some(bracket) = self.bracket(bracket_id) else {
            trace!("snapshot: bracket {bracket_id} isn't loaded");
            return Ok(None);
        };

        layout_with(
            dimensions,
            bracket.bracket_type()?,
            &self.rounds_of(bracket_id),
            &self.matches_of(bracket_id),
        )
    }

    /// The host's standings when present, else computed from the matches.
    /// `Ok(None)` when the bracket is unknown or not ready.
    ///
    /// # Errors
    ///
    /// If the bracket type is unknown.
    pub fn standings(&self, bracket_id: Id) -> Result<Option<Vec<Standing>>, MalformedInput> {
        let Some(bracket) = self.bracket(bracket_id) else {
            trace!("snapshot: bracket {bracket_id} isn't loaded");
            return Ok(None);
        };

        let bracket_type = bracket.bracket_type()?;
        if let Some(standings) = self.standings.get(&bracket_id) {
            return Ok(Some(standings.clone()));
        }

        Ok(tiebreak::standings(
            bracket_type,
            &self.rounds_of(bracket_id),
            &self.matches_of(bracket_id),
        ))
    }

    /// `Ok(None)` when the match, its bracket or its round isn't loaded, or
    /// when the maps aren't vetoed.
    ///
    /// # Errors
    ///
    /// If the veto procedure doesn't parse or doesn't fit the map pool or the
    /// selections.
    pub fn veto_state(&self, match_id: Id) -> Result<Option<VetoState>, MalformedInput> {
        let Some(game) = self.game(match_id) else {
            trace!("snapshot: match {match_id} isn't loaded");
            return Ok(None);
        };

        let Some(bracket) = self.bracket(game.bracket_id) else {
            return Ok(None);
        };

        let Some(round) = self.rounds.iter().find(|round| {
            round.bracket_id == bracket.id && round.number == game.bracket_round
        }) else {
            return Ok(None);
        };

        let Some(procedure) = round.veto_procedure(bracket) else {
            return Ok(None);
        };

        let maps: Vec<BracketMap> = self
            .bracket_maps
            .iter()
            .filter(|map| map.bracket_id == bracket.id)
            .cloned()
            .collect();

        let selections: Vec<MapSelection> = self
            .selections
            .iter()
            .filter(|selection| selection.match_id == match_id)
            .cloned()
            .collect();

        veto::veto_state(procedure, &maps, &selections)
    }

    /// Appends the planned selections of a match in order, after every
    /// existing selection.
    ///
    /// # Errors
    ///
    /// If the match isn't in the snapshot; nothing is appended then.
    pub fn commit(
        &mut self,
        match_id: Id,
        planned: Vec<PlannedSelection>,
    ) -> Result<(), MalformedInput> {
        let Some(game) = self.game(match_id).cloned() else {
            return Err(MalformedInput::UnknownMatch(match_id));
        };

        let mut id = self
            .selections
            .iter()
            .map(|selection| selection.id)
            .max()
            .unwrap_or_default();

        for plan in planned {
            id += 1;
            debug!("snapshot: match {match_id}, {plan}");
            self.selections.push(plan.into_selection(id, &game));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{generate, matches::Side};

    use super::*;

    fn snapshot() -> anyhow::Result<Snapshot> {
        let (rounds, matches) = generate::single_elimination(1, 10, &[21, 22, 23, 24])?;

        Ok(Snapshot {
            brackets: vec![Bracket {
                id: 1,
                name: "playoffs".to_string(),
                kind: "single-elimination".to_string(),
                map_veto_procedure: "x y X".to_string(),
                sort_number: 0,
            }],
            rounds,
            matches,
            bracket_maps: (1..=4)
                .map(|game_map_id| BracketMap {
                    bracket_id: 1,
                    game_map_id,
                    sub_pool: 0,
                    is_enabled: true,
                })
                .collect(),
            ..Snapshot::default()
        })
    }

    #[test]
    fn ron_round_trip() -> anyhow::Result<()> {
        let snapshot = snapshot()?;
        let string = snapshot.to_ron()?;

        assert_eq!(Snapshot::from_ron(&string)?, snapshot);

        Ok(())
    }

    #[test]
    fn missing_records_are_not_ready() -> anyhow::Result<()> {
        let snapshot = snapshot()?;

        assert_eq!(snapshot.layout(&Dimensions::default(), 9)?, None);
        assert_eq!(snapshot.standings(9)?, None);
        assert!(snapshot.veto_state(999)?.is_none());

        Ok(())
    }

    #[test]
    fn unknown_bracket_type() -> anyhow::Result<()> {
        let mut snapshot = snapshot()?;
        snapshot.brackets[0].kind = "double-elimination".to_string();

        assert_eq!(
            snapshot.layout(&Dimensions::default(), 1),
            Err(MalformedInput::BracketType(
                "double-elimination".to_string()
            ))
        );

        Ok(())
    }

    #[test]
    fn veto_through_the_snapshot() -> anyhow::Result<()> {
        let mut snapshot = snapshot()?;
        let match_id = snapshot.matches[0].id;

        let state = snapshot
            .veto_state(match_id)?
            .ok_or_else(|| anyhow::anyhow!("no veto"))?;
        let planned = state.select(Side::X, 2)?;
        snapshot.commit(match_id, vec![planned])?;

        let state = snapshot
            .veto_state(match_id)?
            .ok_or_else(|| anyhow::anyhow!("no veto"))?;
        assert_eq!(state.completed.len(), 1);
        assert_eq!(state.completed[0].team_id, Some(21));
        assert_eq!(state.eligible_for(Side::Y), &[1, 3, 4]);

        snapshot.rounds[0].map_veto_procedure = "X".to_string();
        let state = snapshot
            .veto_state(match_id)?
            .ok_or_else(|| anyhow::anyhow!("no veto"))?;
        assert!(state.is_ready());

        let count = snapshot.selections.len();
        assert_eq!(
            snapshot.commit(999, vec![planned]),
            Err(MalformedInput::UnknownMatch(999))
        );
        assert_eq!(snapshot.selections.len(), count);

        Ok(())
    }

    #[test]
    fn stored_standings_win() -> anyhow::Result<()> {
        let mut snapshot = snapshot()?;
        let computed = snapshot
            .standings(1)?
            .ok_or_else(|| anyhow::anyhow!("not ready"))?;
        assert_eq!(computed.len(), 4);

        let stored = vec![Standing {
            team_id: 24,
            ..Standing::default()
        }];
        snapshot.standings.insert(1, stored.clone());
        assert_eq!(snapshot.standings(1)?, Some(stored));

        Ok(())
    }
}
