#[cfg(feature = "bench")]
use std::time::Duration;

#[cfg(feature = "bench")]
use criterion::{Criterion, criterion_group, criterion_main};

#[cfg(feature = "bench")]
use bracketeer::{Id, bracket::BracketType, generate, layout::layout, tiebreak};

#[cfg(feature = "bench")]
fn elimination_layout(c: &mut Criterion) {
    let teams: Vec<Id> = (1..=128).collect();
    let (rounds, matches) = generate::single_elimination(1, 1, &teams).unwrap();

    c.bench_function("elimination_layout_128", move |b| {
        b.iter(|| layout(BracketType::SingleElimination, &rounds, &matches).unwrap());
    });
}

#[cfg(feature = "bench")]
fn group_standings(c: &mut Criterion) {
    let teams: Vec<Id> = (1..=16).collect();
    let (rounds, mut matches) = generate::round_robin(1, 1, &teams).unwrap();
    for (i, game) in matches.iter_mut().enumerate() {
        game.score_x = Some(f64::from(u32::try_from(i % 3).unwrap()));
        game.score_y = Some(1.0);
        game.report = Some(bracketeer::matches::MatchReport::default());
    }

    c.bench_function("group_standings_16", move |b| {
        b.iter(|| tiebreak::standings(BracketType::RoundRobinGroup, &rounds, &matches));
    });
}

#[cfg(feature = "bench")]
criterion_group! {
    name = benches;
    config = Criterion::default().measurement_time(Duration::from_secs(10));
    targets = elimination_layout, group_standings
}

#[cfg(feature = "bench")]
criterion_main!(benches);

#[cfg(not(feature = "bench"))]
fn main() {
    eprintln!("You must enable pass `--features=bench`");
}
