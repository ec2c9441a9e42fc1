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

use log::debug;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::{
    Id,
    error::{IllegalVetoAction, MalformedInput},
    matches::{Match, Side},
    procedure::{Action, ActionKind, Actor, Procedure},
};

/// A map in a bracket's pool.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BracketMap {
    #[serde(default)]
    pub bracket_id: Id,
    pub game_map_id: Id,
    #[serde(default)]
    pub sub_pool: u8,
    #[serde(default = "enabled")]
    pub is_enabled: bool,
}

fn enabled() -> bool {
    true
}

/// A committed pick or ban. Selections are ordered by `id`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MapSelection {
    pub id: Id,
    pub match_id: Id,
    pub game_map_id: Id,
    /// `None` for automatic actions.
    #[serde(default)]
    pub team_id: Option<Id>,
    #[serde(default)]
    pub is_ban: bool,
    #[serde(default)]
    pub discarded: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompletedPick {
    pub game_map_id: Id,
    pub team_id: Option<Id>,
    pub actor: Actor,
    pub kind: ActionKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NextAction {
    /// The position of the action in the procedure.
    pub index: usize,
    pub action: Action,
}

/// A selection that passed validation but isn't committed yet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlannedSelection {
    pub game_map_id: Id,
    pub actor: Actor,
    pub kind: ActionKind,
}

impl PlannedSelection {
    #[must_use]
    pub fn into_selection(self, id: Id, game: &Match) -> MapSelection {
        MapSelection {
            id,
            match_id: game.id,
            game_map_id: self.game_map_id,
            team_id: self.actor.side().and_then(|side| game.team(side)),
            is_ban: self.kind.is_ban(),
            discarded: false,
        }
    }
}

impl fmt::Display for PlannedSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actor = match self.actor.side() {
            Some(side) => side.to_string(),
            None => "random".to_string(),
        };

        write!(f, "{actor} {} map {}", self.kind, self.game_map_id)
    }
}

/// The state of one match's veto, folded from its committed selections.
#[derive(Clone, Debug, PartialEq)]
pub struct VetoState {
    pub procedure: Procedure,
    pub completed: Vec<CompletedPick>,
    /// `None` once the maps are ready.
    pub next: Option<NextAction>,
    /// The maps a team may choose for the next action. Always empty for
    /// automatic actions.
    pub eligible: Vec<Id>,
    pool: Vec<BracketMap>,
}

impl VetoState {
    /// # Errors
    ///
    /// If the procedure has more actions than the bracket has maps, disabled
    /// ones included, or more selections were committed than the procedure
    /// has actions.
    pub fn new(
        procedure: Procedure,
        maps: &[BracketMap],
        selections: &[MapSelection],
    ) -> Result<Self, MalformedInput> {
        if procedure.len() > maps.len() {
            return Err(MalformedInput::ProcedureTooLong {
                actions: procedure.len(),
                maps: maps.len(),
            });
        }
        let pool: Vec<BracketMap> = maps
            .iter()
            .filter(|map| map.is_enabled)
            .cloned()
            .collect();

        let mut live: Vec<&MapSelection> = selections
            .iter()
            .filter(|selection| !selection.discarded)
            .collect();
        live.sort_by_key(|selection| selection.id);

        if live.len() > procedure.len() {
            return Err(MalformedInput::TooManySelections {
                selections: live.len(),
                actions: procedure.len(),
            });
        }

        let completed: Vec<CompletedPick> = live
            .iter()
            .zip(procedure.iter())
            .map(|(selection, action)| CompletedPick {
                game_map_id: selection.game_map_id,
                team_id: selection.team_id,
                actor: action.actor,
                kind: action.kind,
            })
            .collect();

        let next = procedure.get(completed.len()).map(|action| NextAction {
            index: completed.len(),
            action: *action,
        });

        let mut state = Self {
            procedure,
            completed,
            next,
            eligible: Vec::new(),
            pool,
        };

        if let Some(next) = state.next
            && !next.action.is_automatic()
        {
            state.eligible = state.viable(&next.action, &[]);
        }

        Ok(state)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.next.is_none()
    }

    /// The maps `side` may choose right now.
    #[must_use]
    pub fn eligible_for(&self, side: Side) -> &[Id] {
        match self.next {
            Some(next) if next.action.actor.side() == Some(side) => &self.eligible,
            _ => &[],
        }
    }

    /// Validates a team's action without changing anything.
    ///
    /// # Errors
    ///
    /// If the maps are ready, the next action is automatic, it's the other
    /// side's turn or the map isn't eligible.
    pub fn select(
        &self,
        side: Side,
        game_map_id: Id,
    ) -> Result<PlannedSelection, IllegalVetoAction> {
        let Some(next) = self.next else {
            return Err(IllegalVetoAction::Ready);
        };

        let Some(turn) = next.action.actor.side() else {
            return Err(IllegalVetoAction::Automatic);
        };

        if turn != side {
            return Err(IllegalVetoAction::Turn(turn));
        }

        if !self.eligible.contains(&game_map_id) {
            if self.eligible.is_empty() {
                return Err(IllegalVetoAction::NoViableMap);
            }

            return Err(IllegalVetoAction::Ineligible(game_map_id));
        }

        Ok(PlannedSelection {
            game_map_id,
            actor: next.action.actor,
            kind: next.action.kind,
        })
    }

    /// Plans every automatic action starting at the next one.
    ///
    /// # Errors
    ///
    /// If an automatic action has zero viable maps.
    pub fn resolve_automatic<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<PlannedSelection>, IllegalVetoAction> {
        let mut planned = Vec::new();
        if let Some(next) = self.next {
            self.resolve_from(next.index, &mut planned, rng)?;
        }

        Ok(planned)
    }

    /// A team's action followed by the automatic actions right after it, as
    /// one batch.
    ///
    /// # Errors
    ///
    /// See [`VetoState::select`] and [`VetoState::resolve_automatic`].
    pub fn commit<R: Rng + ?Sized>(
        &self,
        side: Side,
        game_map_id: Id,
        rng: &mut R,
    ) -> Result<Vec<PlannedSelection>, IllegalVetoAction> {
        let selection = self.select(side, game_map_id)?;
        let mut planned = vec![selection];

        if let Some(next) = self.next {
            self.resolve_from(next.index + 1, &mut planned, rng)?;
        }

        Ok(planned)
    }

    fn resolve_from<R: Rng + ?Sized>(
        &self,
        index: usize,
        planned: &mut Vec<PlannedSelection>,
        rng: &mut R,
    ) -> Result<(), IllegalVetoAction> {
        for action in self.procedure.iter().skip(index) {
            if !action.is_automatic() {
                break;
            }

            let viable = self.viable(action, planned);
            if viable.is_empty() {
                return Err(IllegalVetoAction::NoViableMap);
            }

            let game_map_id = viable[rng.random_range(0..viable.len())];
            debug!("veto: random {} of map {game_map_id}", action.kind);

            planned.push(PlannedSelection {
                game_map_id,
                actor: action.actor,
                kind: action.kind,
            });
        }

        Ok(())
    }

    /// Enabled maps in the action's sub-pool that nobody has used yet.
    fn viable(&self, action: &Action, planned: &[PlannedSelection]) -> Vec<Id> {
        let used: FxHashSet<Id> = self
            .completed
            .iter()
            .map(|pick| pick.game_map_id)
            .chain(planned.iter().map(|plan| plan.game_map_id))
            .collect();

        self.pool
            .iter()
            .filter(|map| action.accepts(map.sub_pool) && !used.contains(&map.game_map_id))
            .map(|map| map.game_map_id)
            .collect()
    }
}

impl fmt::Display for VetoState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "procedure: {}", self.procedure)?;

        for (i, pick) in self.completed.iter().enumerate() {
            let team = match pick.team_id {
                Some(team_id) => format!("team {team_id}"),
                None => "random".to_string(),
            };

            writeln!(f, "{:>4}. {team} {} map {}", i + 1, pick.kind, pick.game_map_id)?;
        }

        match self.next {
            None => writeln!(f, "ready"),
            Some(next) => {
                let actor = match next.action.actor.side() {
                    Some(side) => format!("side {side}"),
                    None => "random".to_string(),
                };
                write!(f, "next: {actor} {}", next.action.kind)?;
                if let Some(sub_pool) = next.action.sub_pool {
                    write!(f, " from sub-pool {sub_pool}")?;
                }

                let eligible: Vec<String> =
                    self.eligible.iter().map(ToString::to_string).collect();
                writeln!(f, ", eligible maps: [{}]", eligible.join(", "))
            }
        }
    }
}

/// Folds the committed selections of a match; `Ok(None)` when the procedure
/// is blank and there is no veto.
///
/// # Errors
///
/// If the procedure doesn't parse or doesn't fit the map pool or the
/// selections.
pub fn veto_state(
    procedure: &str,
    maps: &[BracketMap],
    selections: &[MapSelection],
) -> Result<Option<VetoState>, MalformedInput> {
    let procedure = Procedure::from_str(procedure)?;
    if procedure.is_empty() {
        return Ok(None);
    }

    VetoState::new(procedure, maps, selections).map(Some)
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    const A: Id = 101;
    const B: Id = 102;
    const C: Id = 103;
    const D: Id = 104;

    fn maps() -> Vec<BracketMap> {
        [(A, 0), (B, 1), (C, 1), (D, 0)]
            .into_iter()
            .map(|(game_map_id, sub_pool)| BracketMap {
                bracket_id: 1,
                game_map_id,
                sub_pool,
                is_enabled: true,
            })
            .collect()
    }

    fn game() -> Match {
        Match {
            id: 7,
            bracket_id: 1,
            team_x: Some(11),
            team_y: Some(12),
            ..Match::default()
        }
    }

    fn commit(selections: &mut Vec<MapSelection>, planned: Vec<PlannedSelection>) {
        let game = game();
        for plan in planned {
            let id = Id::try_from(selections.len()).unwrap_or_default() + 1;
            selections.push(plan.into_selection(id, &game));
        }
    }

    #[test]
    fn legality() -> anyhow::Result<()> {
        let maps = maps();
        let mut selections = Vec::new();
        let mut rng = StdRng::seed_from_u64(0);

        let state = VetoState::new(Procedure::from_str("X Y1 r")?, &maps, &selections)?;
        let next = state.next.ok_or_else(|| anyhow::anyhow!("no next action"))?;
        assert_eq!(next.action.actor, Actor::X);
        assert_eq!(next.action.sub_pool, None);
        assert_eq!(state.eligible_for(Side::X), &[A, B, C, D]);
        assert!(state.eligible_for(Side::Y).is_empty());

        commit(&mut selections, state.commit(Side::X, A, &mut rng)?);

        let state = VetoState::new(Procedure::from_str("X Y1 r")?, &maps, &selections)?;
        let next = state.next.ok_or_else(|| anyhow::anyhow!("no next action"))?;
        assert_eq!(next.action.actor, Actor::Y);
        assert_eq!(next.action.sub_pool, Some(1));
        assert_eq!(state.eligible_for(Side::Y), &[B, C]);
        assert_eq!(
            state.select(Side::Y, D),
            Err(IllegalVetoAction::Ineligible(D))
        );

        let selection = state.select(Side::Y, B)?;
        commit(&mut selections, vec![selection]);

        let state = VetoState::new(Procedure::from_str("X Y1 r")?, &maps, &selections)?;
        let next = state.next.ok_or_else(|| anyhow::anyhow!("no next action"))?;
        assert!(next.action.is_automatic());
        assert!(state.eligible.is_empty());
        assert!(state.eligible_for(Side::X).is_empty());
        assert!(state.eligible_for(Side::Y).is_empty());
        assert_eq!(state.select(Side::X, C), Err(IllegalVetoAction::Automatic));

        let planned = state.resolve_automatic(&mut rng)?;
        assert_eq!(planned.len(), 1);
        assert!([C, D].contains(&planned[0].game_map_id));
        assert_eq!(planned[0].kind, ActionKind::Ban);

        Ok(())
    }

    #[test]
    fn display() -> anyhow::Result<()> {
        let maps = maps();
        let state = VetoState::new(Procedure::from_str("x Y1")?, &maps, &[])?;
        assert_eq!(
            state.to_string(),
            "procedure: x Y1\nnext: side x ban, eligible maps: [101, 102, 103, 104]\n"
        );

        Ok(())
    }

    #[test]
    fn rejection() -> anyhow::Result<()> {
        let maps = maps();
        let state = VetoState::new(Procedure::from_str("x y")?, &maps, &[])?;
        let before = state.clone();

        assert_eq!(
            state.select(Side::Y, A),
            Err(IllegalVetoAction::Turn(Side::X))
        );
        assert_eq!(state, before);
        assert!(state.completed.is_empty());

        Ok(())
    }

    #[test]
    fn completion() -> anyhow::Result<()> {
        let maps = maps();
        let mut selections = Vec::new();
        let mut rng = StdRng::seed_from_u64(3);

        let state = VetoState::new(Procedure::from_str("x Y R")?, &maps, &selections)?;
        commit(&mut selections, state.commit(Side::X, D, &mut rng)?);

        let state = VetoState::new(Procedure::from_str("x Y R")?, &maps, &selections)?;
        let planned = state.commit(Side::Y, C, &mut rng)?;
        assert_eq!(planned.len(), 2);
        assert_eq!(planned[1].actor, Actor::Random);
        assert!([A, B].contains(&planned[1].game_map_id));
        commit(&mut selections, planned);

        let state = VetoState::new(Procedure::from_str("x Y R")?, &maps, &selections)?;
        assert!(state.is_ready());
        assert!(state.eligible.is_empty());
        assert_eq!(state.completed.len(), 3);
        assert_eq!(state.completed[0].team_id, Some(11));
        assert_eq!(state.completed[1].team_id, Some(12));
        assert_eq!(state.completed[2].team_id, None);
        assert_eq!(state.select(Side::X, A), Err(IllegalVetoAction::Ready));

        Ok(())
    }

    #[test]
    fn discarded_selections_are_ignored() -> anyhow::Result<()> {
        let maps = maps();
        let selections = vec![
            MapSelection {
                id: 2,
                match_id: 7,
                game_map_id: B,
                team_id: Some(11),
                is_ban: true,
                discarded: false,
            },
            MapSelection {
                id: 1,
                match_id: 7,
                game_map_id: A,
                team_id: Some(11),
                is_ban: true,
                discarded: true,
            },
        ];

        let state = VetoState::new(Procedure::from_str("x y")?, &maps, &selections)?;
        assert_eq!(state.completed.len(), 1);
        assert_eq!(state.completed[0].game_map_id, B);
        assert_eq!(state.eligible_for(Side::Y), &[A, C, D]);

        Ok(())
    }

    #[test]
    fn random_actions_never_repeat_a_map() -> anyhow::Result<()> {
        let maps = maps();
        let state = VetoState::new(Procedure::from_str("r r r R")?, &maps, &[])?;

        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut planned: Vec<Id> = state
                .resolve_automatic(&mut rng)?
                .into_iter()
                .map(|plan| plan.game_map_id)
                .collect();

            planned.sort_unstable();
            assert_eq!(planned, vec![A, B, C, D]);
        }

        Ok(())
    }

    #[test]
    fn sub_pool_without_maps() -> anyhow::Result<()> {
        let maps = maps();
        let state = VetoState::new(Procedure::from_str("X5")?, &maps, &[])?;
        assert_eq!(
            state.select(Side::X, A),
            Err(IllegalVetoAction::NoViableMap)
        );

        let state = VetoState::new(Procedure::from_str("R5")?, &maps, &[])?;
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            state.resolve_automatic(&mut rng),
            Err(IllegalVetoAction::NoViableMap)
        );

        Ok(())
    }

    #[test]
    fn malformed() -> anyhow::Result<()> {
        let mut maps = maps();
        maps[3].is_enabled = false;

        assert_eq!(
            VetoState::new(Procedure::from_str("x y x y x")?, &maps, &[]),
            Err(MalformedInput::ProcedureTooLong { actions: 5, maps: 4 })
        );
        // Disabled maps still count towards the procedure's length.
        assert!(VetoState::new(Procedure::from_str("x y x y")?, &maps, &[]).is_ok());

        let selections: Vec<MapSelection> = (1..=3)
            .map(|id| MapSelection {
                id,
                match_id: 7,
                game_map_id: 100 + id,
                team_id: None,
                is_ban: false,
                discarded: false,
            })
            .collect();

        assert_eq!(
            VetoState::new(Procedure::from_str("x y")?, &maps, &selections),
            Err(MalformedInput::TooManySelections {
                selections: 3,
                actions: 2
            })
        );

        assert_eq!(veto_state("  ", &maps, &[]), Ok(None));
        assert!(veto_state("x q", &maps, &[]).is_err());

        Ok(())
    }
}
