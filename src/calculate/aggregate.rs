//! Season aggregation.

use tracing::debug;

use crate::models::{GameRecord, PlayerSeasonLine, SeasonAggregates, Split};
use crate::registry::PlayerRegistry;

/// Recompute one season from scratch.
///
/// Games from other seasons are ignored. DNP lines never count toward games
/// played. Player names come from the registry (curated display name first).
pub fn aggregate_season(
    season: &str,
    games: &[GameRecord],
    registry: &PlayerRegistry,
) -> SeasonAggregates {
    let mut aggregates = SeasonAggregates {
        season: season.to_string(),
        ..Default::default()
    };

    for game in games.iter().filter(|g| g.season == season) {
        aggregates.games += 1;
        for (number, line) in game.played_lines() {
            let name = registry
                .get(&line.player_id)
                .map(|p| p.label().to_string())
                .unwrap_or_else(|| line.name.clone());

            for split in Split::for_game(game.is_playoff) {
                aggregates
                    .splits
                    .get_mut(split)
                    .entry(line.player_id.clone())
                    .or_insert_with(|| PlayerSeasonLine {
                        name: name.clone(),
                        ..Default::default()
                    })
                    .accumulate(number, &line.stats);
            }
        }
    }

    for split in [Split::Regular, Split::Playoff, Split::All] {
        let lines = aggregates.splits.get_mut(split);
        let finished = std::mem::take(lines)
            .into_iter()
            .map(|(id, line)| (id, line.finish()))
            .collect();
        *lines = finished;
    }

    debug!(
        "Season {}: {} games, {} players",
        season,
        aggregates.games,
        aggregates.splits.all.len()
    );
    aggregates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityId, GameLine, HomeAway, PlayerGameStats, Score, ShotLine};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn game(day: u32, season: &str, playoff: bool, lines: &[(&str, &str, u32)]) -> GameRecord {
        let stats: BTreeMap<String, GameLine> = lines
            .iter()
            .map(|(number, name, pts)| {
                (
                    number.to_string(),
                    GameLine {
                        player_id: EntityId::for_player(name),
                        name: name.to_string(),
                        stats: PlayerGameStats {
                            pts: *pts,
                            reb: 4,
                            fg: ShotLine::new(*pts / 2, *pts),
                            ..Default::default()
                        }
                        .with_derived(),
                    },
                )
            })
            .collect();
        GameRecord::new(
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            season.to_string(),
            format!("Opponent {}", day),
            HomeAway::Home,
            Score { us: 70, them: 60 },
        )
        .unwrap()
        .with_playoff(playoff)
        .with_stats(stats)
    }

    #[test]
    fn test_two_games_ppg() {
        let games = vec![
            game(1, "2025-spring", false, &[("4", "A. Guard", 30)]),
            game(8, "2025-spring", false, &[("4", "A. Guard", 22)]),
        ];
        let agg = aggregate_season("2025-spring", &games, &PlayerRegistry::new());

        let line = &agg.splits.regular[&EntityId::from("a-guard")];
        assert_eq!(line.gp, 2);
        assert_eq!(line.pts, 52);
        assert_eq!(line.ppg, 26.0);
        assert_eq!(line.rpg, 4.0);
        assert_eq!(line.name, "A. Guard");
        assert_eq!(agg.games, 2);
        assert_eq!(agg.splits.all[&EntityId::from("a-guard")].ppg, 26.0);
        assert!(agg.splits.playoff.is_empty());
    }

    #[test]
    fn test_playoff_split() {
        let games = vec![
            game(1, "2025", false, &[("4", "A. Guard", 10)]),
            game(2, "2025", true, &[("4", "A. Guard", 20)]),
        ];
        let agg = aggregate_season("2025", &games, &PlayerRegistry::new());
        let id = EntityId::from("a-guard");

        assert_eq!(agg.splits.regular[&id].gp, 1);
        assert_eq!(agg.splits.playoff[&id].gp, 1);
        assert_eq!(agg.splits.playoff[&id].pts, 20);
        assert_eq!(agg.splits.all[&id].gp, 2);
        assert_eq!(agg.splits.all[&id].ppg, 15.0);
    }

    #[test]
    fn test_dnp_not_counted() {
        let mut g = game(1, "2025", false, &[("4", "A. Guard", 10)]);
        g.stats.insert(
            "9".to_string(),
            GameLine {
                player_id: EntityId::from("b-bench"),
                name: "B. Bench".to_string(),
                stats: PlayerGameStats::default(),
            },
        );
        let agg = aggregate_season("2025", &[g], &PlayerRegistry::new());
        assert!(!agg.splits.all.contains_key(&EntityId::from("b-bench")));
    }

    #[test]
    fn test_other_seasons_ignored_and_numbers_tracked() {
        let games = vec![
            game(1, "2025", false, &[("4", "A. Guard", 10)]),
            game(2, "2025", false, &[("14", "A. Guard", 12)]),
            game(3, "2024", false, &[("4", "A. Guard", 40)]),
        ];
        let agg = aggregate_season("2025", &games, &PlayerRegistry::new());
        let line = &agg.splits.all[&EntityId::from("a-guard")];
        assert_eq!(line.gp, 2);
        assert_eq!(line.pts, 22);
        assert_eq!(line.numbers.len(), 2);
    }

    #[test]
    fn test_registry_display_name_used() {
        let mut registry = PlayerRegistry::new();
        registry.observe("4", "A. Guard", "Pretty Good").unwrap();
        registry
            .merge_seed(&crate::registry::SeedPlayer {
                name: Some("A. Guard".to_string()),
                display_name: Some("Alex Guard".to_string()),
                ..Default::default()
            })
            .unwrap();

        let games = vec![game(1, "2025", false, &[("4", "A. Guard", 10)])];
        let agg = aggregate_season("2025", &games, &registry);
        assert_eq!(agg.splits.all[&EntityId::from("a-guard")].name, "Alex Guard");
    }
}
