//! Derived views.
//!
//! Everything here is a pure function of the stored games (and the registry,
//! for names). Views are rebuilt from scratch on every run:
//! - Season aggregates per split
//! - Single-game record leaderboards and career highs
//! - Games index and season metadata

mod aggregate;
mod index;
mod records;

pub use aggregate::aggregate_season;
pub use index::{build_index, build_seasons_meta};
pub use records::{compute_career_highs, compute_records};

use std::collections::BTreeSet;

use crate::models::{CareerHighs, GameRecord, GamesIndex, RecordBook, SeasonAggregates, SeasonsMeta};
use crate::registry::PlayerRegistry;

/// Every derived view for one team.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedViews {
    pub seasons: Vec<SeasonAggregates>,
    pub records: RecordBook,
    pub career_highs: CareerHighs,
    pub index: GamesIndex,
    pub seasons_meta: SeasonsMeta,
}

/// Which seasons to re-aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeasonScope {
    All,
    Only(BTreeSet<String>),
}

impl SeasonScope {
    pub fn one(season: &str) -> Self {
        SeasonScope::Only(BTreeSet::from([season.to_string()]))
    }
}

/// Compute every derived view from the full game list.
///
/// Records, career highs, the index and season metadata are always global;
/// `scope` only limits which season files are rebuilt. Seasons in scope that
/// no longer have any games produce no aggregate.
pub fn compute_views(
    games: &[GameRecord],
    registry: &PlayerRegistry,
    previous_meta: &SeasonsMeta,
    scope: &SeasonScope,
    depth: usize,
) -> DerivedViews {
    let with_games: BTreeSet<&str> = games.iter().map(|g| g.season.as_str()).collect();
    let season_keys: BTreeSet<&str> = match scope {
        SeasonScope::All => with_games,
        SeasonScope::Only(keys) => keys
            .iter()
            .map(String::as_str)
            .filter(|key| with_games.contains(key))
            .collect(),
    };

    DerivedViews {
        seasons: season_keys
            .into_iter()
            .map(|key| aggregate_season(key, games, registry))
            .collect(),
        records: compute_records(games, registry, depth),
        career_highs: compute_career_highs(games),
        index: build_index(games),
        seasons_meta: build_seasons_meta(games, previous_meta),
    }
}
