//! Single-game record leaderboards.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{GameId, PlayerGameStats, PlayerId, Splits};

/// Stat categories tracked on the leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatCategory {
    #[serde(rename = "pts")]
    Points,
    #[serde(rename = "reb")]
    Rebounds,
    #[serde(rename = "asst")]
    Assists,
    #[serde(rename = "stl")]
    Steals,
    #[serde(rename = "blk")]
    Blocks,
    #[serde(rename = "to")]
    Turnovers,
    #[serde(rename = "fg")]
    FieldGoals,
    #[serde(rename = "3pt")]
    ThreePointers,
    #[serde(rename = "ft")]
    FreeThrows,
    #[serde(rename = "oreb")]
    OffensiveRebounds,
    #[serde(rename = "dreb")]
    DefensiveRebounds,
    #[serde(rename = "foul")]
    Fouls,
}

impl StatCategory {
    pub const ALL: [StatCategory; 12] = [
        StatCategory::Points,
        StatCategory::Rebounds,
        StatCategory::Assists,
        StatCategory::Steals,
        StatCategory::Blocks,
        StatCategory::Turnovers,
        StatCategory::FieldGoals,
        StatCategory::ThreePointers,
        StatCategory::FreeThrows,
        StatCategory::OffensiveRebounds,
        StatCategory::DefensiveRebounds,
        StatCategory::Fouls,
    ];

    /// Single-game value for this category. Shot lines count makes.
    pub fn value(&self, stats: &PlayerGameStats) -> u32 {
        match self {
            StatCategory::Points => stats.pts,
            StatCategory::Rebounds => stats.reb,
            StatCategory::Assists => stats.asst,
            StatCategory::Steals => stats.stl,
            StatCategory::Blocks => stats.blk,
            StatCategory::Turnovers => stats.to,
            StatCategory::FieldGoals => stats.fg.made(),
            StatCategory::ThreePointers => stats.three_pt.made(),
            StatCategory::FreeThrows => stats.ft.made(),
            StatCategory::OffensiveRebounds => stats.oreb,
            StatCategory::DefensiveRebounds => stats.dreb,
            StatCategory::Fouls => stats.foul,
        }
    }
}

impl std::fmt::Display for StatCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatCategory::Points => "pts",
            StatCategory::Rebounds => "reb",
            StatCategory::Assists => "asst",
            StatCategory::Steals => "stl",
            StatCategory::Blocks => "blk",
            StatCategory::Turnovers => "to",
            StatCategory::FieldGoals => "fg",
            StatCategory::ThreePointers => "3pt",
            StatCategory::FreeThrows => "ft",
            StatCategory::OffensiveRebounds => "oreb",
            StatCategory::DefensiveRebounds => "dreb",
            StatCategory::Fouls => "foul",
        };
        write!(f, "{}", s)
    }
}

/// One leaderboard slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub category: StatCategory,
    pub player_id: PlayerId,
    pub player: String,
    pub number: String,
    pub value: u32,
    pub game_id: GameId,
    pub date: NaiveDate,
    pub opponent: String,
}

/// Category → ranked entries (best first).
pub type Leaderboard = BTreeMap<StatCategory, Vec<RecordEntry>>;

/// Leaderboards for every split.
pub type RecordBook = Splits<Leaderboard>;

/// A player's best single game in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerHigh {
    pub value: u32,
    pub game_id: GameId,
    pub date: NaiveDate,
    pub opponent: String,
}

/// Player → category → best game. Written as `career_highs.json`.
pub type CareerHighs = BTreeMap<PlayerId, BTreeMap<StatCategory, CareerHigh>>;
