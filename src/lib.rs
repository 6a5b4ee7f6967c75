//! # Hoop Ledger
//!
//! Box-score ingestion and season statistics for a recreational basketball
//! team.
//!
//! ## Architecture
//!
//! - **extract**: Parses raw EasyStats HTML exports
//! - **teams**: Works out which side of an export is ours
//! - **normalize**: Turns raw rows into per-game stat lines
//! - **registry**: Stable player identities
//! - **storage**: Flat-file game store, locking and batched writes
//! - **calculate**: Season aggregates, records, career highs and the games index
//! - **pipeline**: The ingest / recompute / import / remap operations
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod storage;
pub mod teams;

pub use models::*;

use chrono::NaiveDate;

/// Parse a date given on the command line.
///
/// Accepts `YYYY-MM-DD` as well as the forms EasyStats prints
/// (`16 Dec 2025`, `Dec 16, 2025`).
pub fn parse_game_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| extract::parse_date(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_game_date_iso() {
        assert_eq!(
            parse_game_date("2025-12-16"),
            NaiveDate::from_ymd_opt(2025, 12, 16)
        );
    }

    #[test]
    fn test_parse_game_date_export_format() {
        assert_eq!(
            parse_game_date("16 Dec 2025"),
            NaiveDate::from_ymd_opt(2025, 12, 16)
        );
    }

    #[test]
    fn test_parse_game_date_invalid() {
        assert_eq!(parse_game_date("yesterday"), None);
        assert_eq!(parse_game_date("2025-13-40"), None);
    }

    #[test]
    fn test_parse_game_date_empty() {
        assert_eq!(parse_game_date("  "), None);
    }
}
