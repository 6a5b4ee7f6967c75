//! Canonical game record.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{EntityId, GameId, PlayerGameStats, PlayerId};

/// Score errors detected while building or reloading a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("Tied score {us}-{them} cannot be stored; basketball games do not end tied")]
    Tied { us: u32, them: u32 },
}

/// Whether our team played at home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeAway {
    Home,
    Away,
}

impl std::fmt::Display for HomeAway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HomeAway::Home => write!(f, "home"),
            HomeAway::Away => write!(f, "away"),
        }
    }
}

/// Game outcome from our team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    W,
    L,
}

impl GameResult {
    /// Derive the result from the final score. A tie is rejected.
    pub fn from_score(score: Score) -> Result<Self, ScoreError> {
        match score.us.cmp(&score.them) {
            std::cmp::Ordering::Greater => Ok(GameResult::W),
            std::cmp::Ordering::Less => Ok(GameResult::L),
            std::cmp::Ordering::Equal => Err(ScoreError::Tied {
                us: score.us,
                them: score.them,
            }),
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::W => write!(f, "W"),
            GameResult::L => write!(f, "L"),
        }
    }
}

/// Final score from our team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub us: u32,
    pub them: u32,
}

/// One player's entry in a game's stat map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLine {
    /// Stable identity of the player
    pub player_id: PlayerId,

    /// Name as printed in the export
    pub name: String,

    #[serde(flatten)]
    pub stats: PlayerGameStats,
}

/// A single stored game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Derived from date + opponent
    pub id: GameId,

    pub date: NaiveDate,

    /// Season key (e.g. "2025-spring")
    pub season: String,

    pub opponent: String,

    pub home_away: HomeAway,

    pub score: Score,

    /// Always derived from `score`
    pub result: GameResult,

    /// Defaults to false; may be hand-edited and is protected on re-ingest
    #[serde(default)]
    pub is_playoff: bool,

    /// SHA256 of the export this record was parsed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_digest: Option<String>,

    /// Per-player lines keyed by the jersey number worn in this game
    #[serde(default)]
    pub stats: BTreeMap<String, GameLine>,
}

impl GameRecord {
    /// Build a new record, deriving the ID and the result.
    pub fn new(
        date: NaiveDate,
        season: String,
        opponent: String,
        home_away: HomeAway,
        score: Score,
    ) -> Result<Self, ScoreError> {
        let result = GameResult::from_score(score)?;
        Ok(Self {
            id: EntityId::for_game(date, &opponent),
            date,
            season,
            opponent,
            home_away,
            score,
            result,
            is_playoff: false,
            source_digest: None,
            stats: BTreeMap::new(),
        })
    }

    /// Builder method to set the playoff flag.
    pub fn with_playoff(mut self, is_playoff: bool) -> Self {
        self.is_playoff = is_playoff;
        self
    }

    /// Builder method to set the source fingerprint.
    pub fn with_source_digest(mut self, digest: String) -> Self {
        self.source_digest = Some(digest);
        self
    }

    /// Builder method to set the stat map.
    pub fn with_stats(mut self, stats: BTreeMap<String, GameLine>) -> Self {
        self.stats = stats;
        self
    }

    /// Re-derive `result` from `score`.
    ///
    /// Returns `Ok(true)` when the stored result disagreed and was corrected.
    pub fn reconcile_result(&mut self) -> Result<bool, ScoreError> {
        let derived = GameResult::from_score(self.score)?;
        let changed = derived != self.result;
        self.result = derived;
        Ok(changed)
    }

    /// Lines for players that actually played.
    pub fn played_lines(&self) -> impl Iterator<Item = (&String, &GameLine)> {
        self.stats.iter().filter(|(_, line)| line.stats.did_play())
    }
}

/// Games index entry consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameIndexEntry {
    pub filename: String,
    pub date: NaiveDate,
    pub season: String,
    pub opponent: String,
    pub score: Score,
    pub result: GameResult,
    pub is_playoff: bool,
}

/// Game ID → index entry.
pub type GamesIndex = BTreeMap<GameId, GameIndexEntry>;
