//! Games index and season metadata.

use std::collections::BTreeSet;

use crate::models::{GameIndexEntry, GameRecord, GamesIndex, SeasonMeta, SeasonsMeta};

/// Rebuild the game → entry lookup from scratch.
pub fn build_index(games: &[GameRecord]) -> GamesIndex {
    games
        .iter()
        .map(|game| {
            (
                game.id.clone(),
                GameIndexEntry {
                    filename: format!("{}.json", game.id),
                    date: game.date,
                    season: game.season.clone(),
                    opponent: game.opponent.clone(),
                    score: game.score,
                    result: game.result,
                    is_playoff: game.is_playoff,
                },
            )
        })
        .collect()
}

/// One entry per season that has games.
///
/// Display names already recorded in `previous` are kept; seasons seen for
/// the first time get a name derived from their key.
pub fn build_seasons_meta(games: &[GameRecord], previous: &SeasonsMeta) -> SeasonsMeta {
    let keys: BTreeSet<&str> = games.iter().map(|g| g.season.as_str()).collect();
    keys.into_iter()
        .filter_map(|key| {
            let meta = previous.get(key).cloned().or_else(|| {
                SeasonMeta::from_label(&key.replace('-', " ")).map(|m| SeasonMeta {
                    key: key.to_string(),
                    display_name: m.display_name,
                })
            })?;
            Some((key.to_string(), meta))
        })
        .collect()
}
