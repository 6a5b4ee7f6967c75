//! Flat-file store.
//!
//! One directory per tracked team:
//! - `games/<game-id>.json`: canonical game records (source of truth)
//! - `players.json`: player identities
//! - `seasons/<key>.json`, `records.json`, `career_highs.json`,
//!   `games_index.json`, `seasons_meta.json`: derived views, rebuilt on
//!   every run

pub mod games;
pub mod json;
pub mod lock;

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::GameId;

pub use games::{GameStore, PlayoffMark, RemapReport, UpsertOutcome, Upserted};
pub use json::{json_files, read_json, write_json_atomic, StagedBatch};
pub use lock::StoreLock;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Data directory is locked by another run ({0}); remove it if no run is active")]
    Locked(PathBuf),

    #[error(
        "Game {id} already stored as {stored_date} vs {stored_opponent}; \
         incoming export says {incoming_date} vs {incoming_opponent}"
    )]
    DuplicateConflict {
        id: GameId,
        stored_date: NaiveDate,
        stored_opponent: String,
        incoming_date: NaiveDate,
        incoming_opponent: String,
    },

    #[error("Invalid game record {path}: {reason}")]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Remapping game {game} would put two players on #{number}")]
    RemapConflict { game: GameId, number: String },
}

/// Paths of one team's file set.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub team_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(team_dir: PathBuf) -> Self {
        Self { team_dir }
    }

    pub fn games_dir(&self) -> PathBuf {
        self.team_dir.join("games")
    }

    pub fn seasons_dir(&self) -> PathBuf {
        self.team_dir.join("seasons")
    }

    pub fn game_path(&self, id: &GameId) -> PathBuf {
        self.games_dir().join(format!("{}.json", id))
    }

    pub fn season_path(&self, season_key: &str) -> PathBuf {
        self.seasons_dir().join(format!("{}.json", season_key))
    }

    pub fn players_path(&self) -> PathBuf {
        self.team_dir.join("players.json")
    }

    pub fn records_path(&self) -> PathBuf {
        self.team_dir.join("records.json")
    }

    pub fn career_highs_path(&self) -> PathBuf {
        self.team_dir.join("career_highs.json")
    }

    pub fn games_index_path(&self) -> PathBuf {
        self.team_dir.join("games_index.json")
    }

    pub fn seasons_meta_path(&self) -> PathBuf {
        self.team_dir.join("seasons_meta.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.team_dir.join(".ledger.lock")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data/pretty-good"))
    }
}
