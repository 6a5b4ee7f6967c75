//! Single-game leaderboards and career highs.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::debug;

use crate::models::{
    CareerHigh, CareerHighs, GameRecord, Leaderboard, RecordBook, RecordEntry, Split,
    StatCategory,
};
use crate::registry::PlayerRegistry;

/// Leaderboard order: higher value, then earlier date, then game id, then player id.
fn rank(a: &RecordEntry, b: &RecordEntry) -> Ordering {
    b.value
        .cmp(&a.value)
        .then_with(|| a.date.cmp(&b.date))
        .then_with(|| a.game_id.cmp(&b.game_id))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

fn empty_leaderboard() -> Leaderboard {
    StatCategory::ALL
        .iter()
        .map(|category| (*category, Vec::new()))
        .collect()
}

/// Top `depth` single-game performances per category, for every split.
///
/// Zero values never qualify. Every category is present in the output even
/// when its list is empty.
pub fn compute_records(
    games: &[GameRecord],
    registry: &PlayerRegistry,
    depth: usize,
) -> RecordBook {
    let mut book = RecordBook {
        regular: empty_leaderboard(),
        playoff: empty_leaderboard(),
        all: empty_leaderboard(),
    };

    for game in games {
        for (number, line) in game.played_lines() {
            let player = registry
                .get(&line.player_id)
                .map(|p| p.label().to_string())
                .unwrap_or_else(|| line.name.clone());

            for category in StatCategory::ALL {
                let value = category.value(&line.stats);
                if value == 0 {
                    continue;
                }
                let entry = RecordEntry {
                    category,
                    player_id: line.player_id.clone(),
                    player: player.clone(),
                    number: number.clone(),
                    value,
                    game_id: game.id.clone(),
                    date: game.date,
                    opponent: game.opponent.clone(),
                };
                for split in Split::for_game(game.is_playoff) {
                    book.get_mut(split)
                        .entry(category)
                        .or_default()
                        .push(entry.clone());
                }
            }
        }
    }

    for split in [Split::Regular, Split::Playoff, Split::All] {
        for entries in book.get_mut(split).values_mut() {
            entries.sort_by(rank);
            entries.truncate(depth);
        }
    }

    debug!("Records computed over {} games (depth {})", games.len(), depth);
    book
}

/// Each player's best single game per category.
///
/// Ties keep the earliest game. Categories where the player never recorded
/// a non-zero value are absent.
pub fn compute_career_highs(games: &[GameRecord]) -> CareerHighs {
    let mut highs: CareerHighs = BTreeMap::new();

    for game in games {
        for (_, line) in game.played_lines() {
            let player = highs.entry(line.player_id.clone()).or_default();
            for category in StatCategory::ALL {
                let value = category.value(&line.stats);
                if value == 0 {
                    continue;
                }
                let candidate = CareerHigh {
                    value,
                    game_id: game.id.clone(),
                    date: game.date,
                    opponent: game.opponent.clone(),
                };
                let better = match player.get(&category) {
                    None => true,
                    Some(current) => {
                        value > current.value
                            || (value == current.value
                                && (game.date, &game.id) < (current.date, &current.game_id))
                    }
                };
                if better {
                    player.insert(category, candidate);
                }
            }
        }
    }

    highs.retain(|_, categories| !categories.is_empty());
    highs
}
