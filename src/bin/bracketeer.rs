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

use std::{fmt::Write as _, fs, io::Write, path::PathBuf};

use bracketeer::{
    COPYRIGHT, Id, LONG_VERSION,
    bracket::Bracket,
    dimensions::Dimensions,
    matches::Side,
    snapshot::Snapshot,
    standings::rank,
    utils,
};
use clap::{CommandFactory, Parser};
use log::{error, info, warn};
use rayon::prelude::*;

/// Tournament brackets
///
/// Lays out the brackets of a snapshot, ranks their standings and runs map
/// vetoes.
#[derive(Parser, Debug)]
#[command(long_version = LONG_VERSION, about = "Tournament brackets")]
struct Args {
    /// The RON snapshot of brackets, rounds, matches and maps
    #[arg(default_value = "snapshot.ron", long)]
    snapshot: PathBuf,

    /// A RON file overriding the layout dimensions
    #[arg(long)]
    dimensions: Option<PathBuf>,

    /// Only show the bracket with id
    #[arg(long)]
    bracket: Option<Id>,

    /// Show the map veto of the match with id
    #[arg(long)]
    veto: Option<Id>,

    /// Pick or ban the map with id in the veto, then save the snapshot
    #[arg(long, requires = "veto", requires = "as_team")]
    pick: Option<Id>,

    /// The side (x or y) making the pick
    #[arg(long)]
    as_team: Option<Side>,

    /// Run the automatic actions that are next in the veto, then save the
    /// snapshot
    #[arg(long, requires = "veto", conflicts_with = "pick")]
    resolve: bool,

    /// Log on the debug level
    #[arg(long)]
    debug: bool,

    /// Build the manpage
    #[arg(long)]
    man: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    utils::init_logger(args.debug);

    if args.man {
        let mut buffer: Vec<u8> = Vec::default();
        let cmd = Args::command().name("bracketeer").long_version(None);
        let man = clap_mangen::Man::new(cmd).date("2026-10-18");

        man.render(&mut buffer)?;
        write!(buffer, "{COPYRIGHT}")?;

        fs::write("bracketeer.1", buffer)?;
        return Ok(());
    }

    let dimensions = match &args.dimensions {
        Some(path) => Dimensions::from_ron_file(path)?,
        None => Dimensions::default(),
    };

    let mut snapshot = Snapshot::from_ron_file(&args.snapshot)?;

    if let Some(match_id) = args.veto {
        return veto(&args, &mut snapshot, match_id);
    }

    let brackets: Vec<&Bracket> = snapshot
        .brackets
        .iter()
        .filter(|bracket| args.bracket.is_none_or(|id| id == bracket.id))
        .collect();

    if brackets.is_empty() {
        warn!("no brackets in {}", args.snapshot.display());
    }

    let reports: Vec<String> = brackets
        .par_iter()
        .map(|bracket| report(&snapshot, &dimensions, bracket))
        .collect();

    for report in reports {
        print!("{report}");
    }

    Ok(())
}

fn report(snapshot: &Snapshot, dimensions: &Dimensions, bracket: &Bracket) -> String {
    let mut string = format!("== {} '{}' ({})\n", bracket.id, bracket.name, bracket.kind);

    match snapshot.layout(dimensions, bracket.id) {
        Ok(Some(layout)) => string.push_str(&layout.to_string()),
        Ok(None) => string.push_str("layout: not ready\n"),
        Err(err) => {
            error!("bracket {}: {err}", bracket.id);
            let _ = writeln!(string, "layout: not renderable, {err}");
        }
    }

    match snapshot.standings(bracket.id) {
        Ok(Some(standings)) => {
            string.push_str("standings:\n");
            for row in rank(&standings) {
                let _ = writeln!(string, "{row}");
            }
        }
        Ok(None) => string.push_str("standings: not ready\n"),
        Err(err) => {
            error!("bracket {}: {err}", bracket.id);
            let _ = writeln!(string, "standings: not renderable, {err}");
        }
    }

    string
}

fn veto(args: &Args, snapshot: &mut Snapshot, match_id: Id) -> anyhow::Result<()> {
    let Some(state) = snapshot.veto_state(match_id)? else {
        println!("match {match_id}: the maps aren't vetoed");
        return Ok(());
    };

    let planned = if let (Some(game_map_id), Some(side)) = (args.pick, args.as_team) {
        state.commit(side, game_map_id, &mut rand::rng())?
    } else if args.resolve {
        state.resolve_automatic(&mut rand::rng())?
    } else {
        print!("{state}");
        return Ok(());
    };

    for plan in &planned {
        info!("match {match_id}: {plan}");
    }

    snapshot.commit(match_id, planned)?;
    fs::write(&args.snapshot, snapshot.to_ron()?)?;

    if let Some(state) = snapshot.veto_state(match_id)? {
        print!("{state}");
    }

    Ok(())
}
