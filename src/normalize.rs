//! Raw rows → canonical per-game stats.

use tracing::debug;

use crate::extract::{RawRoster, RawRow};
use crate::models::PlayerGameStats;

/// One rostered player's line.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub number: String,
    pub name: String,
    pub stats: PlayerGameStats,
    /// False for DNP rows: rostered, but nothing recorded
    pub played: bool,
}

/// Convert one row. Total rebounds come from an explicit REB column when the
/// export has one, otherwise OREB + DREB.
pub fn normalize_row(row: &RawRow) -> PlayerGameStats {
    let raw = &row.cells;
    PlayerGameStats {
        pts: raw.pts,
        reb: raw.reb.unwrap_or(raw.oreb.saturating_add(raw.dreb)),
        oreb: raw.oreb,
        dreb: raw.dreb,
        asst: raw.asst,
        stl: raw.stl,
        blk: raw.blk,
        to: raw.to,
        foul: raw.foul,
        fg: raw.fg,
        three_pt: raw.three_pt,
        ft: raw.ft,
        ..Default::default()
    }
    .with_derived()
}

/// Convert every row of a roster. DNP rows are kept and flagged so the
/// player can still be registered; they never reach the stat map.
pub fn normalize_roster(roster: &RawRoster) -> Vec<NormalizedLine> {
    roster
        .rows
        .iter()
        .map(|row| {
            let stats = normalize_row(row);
            let played = stats.did_play();
            if !played {
                debug!("#{} {} did not play", row.number, row.name);
            }
            NormalizedLine {
                number: row.number.clone(),
                name: row.name.clone(),
                stats,
                played,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::RawCounts;
    use crate::models::ShotLine;

    fn row(number: &str, name: &str, cells: RawCounts) -> RawRow {
        RawRow {
            number: number.to_string(),
            name: name.to_string(),
            cells,
        }
    }

    #[test]
    fn test_normalize_row_derives_percentages() {
        let stats = normalize_row(&row(
            "7",
            "J. Smith",
            RawCounts {
                fg: ShotLine::new(9, 15),
                three_pt: ShotLine::new(2, 5),
                ft: ShotLine::new(0, 0),
                oreb: 2,
                dreb: 4,
                pts: 20,
                ..Default::default()
            },
        ));

        assert_eq!(stats.fg_pct, 60.0);
        assert_eq!(stats.three_pt_pct, 40.0);
        assert_eq!(stats.ft_pct, 0.0);
        assert_eq!(stats.two_pt, ShotLine::new(7, 10));
        assert_eq!(stats.reb, 6);
    }

    #[test]
    fn test_explicit_rebound_column_wins() {
        let stats = normalize_row(&row(
            "7",
            "J. Smith",
            RawCounts {
                oreb: 2,
                dreb: 4,
                reb: Some(7),
                ..Default::default()
            },
        ));
        assert_eq!(stats.reb, 7);
    }

    #[test]
    fn test_rebound_sum_saturates() {
        let stats = normalize_row(&row(
            "7",
            "J. Smith",
            RawCounts {
                oreb: u32::MAX,
                dreb: 4,
                ..Default::default()
            },
        ));
        assert_eq!(stats.reb, u32::MAX);
    }

    #[test]
    fn test_normalize_roster_flags_dnp() {
        let roster = RawRoster {
            label: None,
            position: 0,
            rows: vec![
                row(
                    "7",
                    "J. Smith",
                    RawCounts {
                        pts: 2,
                        fg: ShotLine::new(1, 1),
                        ..Default::default()
                    },
                ),
                row("3", "R. Ogle", RawCounts::default()),
                row(
                    "9",
                    "K. Park",
                    RawCounts {
                        fg: ShotLine::new(0, 3),
                        ..Default::default()
                    },
                ),
            ],
        };

        let lines = normalize_roster(&roster);
        let names: Vec<(&str, bool)> = lines.iter().map(|l| (l.name.as_str(), l.played)).collect();
        assert_eq!(
            names,
            vec![("J. Smith", true), ("R. Ogle", false), ("K. Park", true)]
        );
        assert_eq!(lines[2].stats.fg_pct, 0.0);
    }
}
