//! Game record persistence.
//!
//! One pretty-printed JSON file per game under `games/`. This is the only
//! writer of game files; everything else reads them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::json::{json_files, read_json, write_json_atomic};
use super::{StorageConfig, StorageError};
use crate::models::{GameId, GameLine, GameRecord};
use crate::registry::NumberRemap;

/// The operator's playoff instruction for one ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayoffMark {
    /// No flag given: keep a stored `true`
    #[default]
    Unspecified,
    /// `--playoff` or `--playoff=false`: wins over stored state
    Explicit(bool),
}

impl From<Option<bool>> for PlayoffMark {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(value) => PlayoffMark::Explicit(value),
            None => PlayoffMark::Unspecified,
        }
    }
}

/// What an upsert did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "created"),
            UpsertOutcome::Updated => write!(f, "updated"),
            UpsertOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// What an upsert did, and the season the game was stored under before.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub outcome: UpsertOutcome,
    pub record: GameRecord,
    /// `None` for a new game
    pub previous_season: Option<String>,
}

/// Result of a jersey-number remap across stored games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    pub games_scanned: usize,
    pub games_changed: usize,
    pub backups: Vec<PathBuf>,
}

/// Reads and writes `games/<id>.json`.
#[derive(Debug, Clone)]
pub struct GameStore {
    config: StorageConfig,
}

impl GameStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Load a stored game by id.
    pub fn load(&self, id: &GameId) -> Result<Option<GameRecord>, StorageError> {
        let path = self.config.game_path(id);
        match read_json::<GameRecord>(&path) {
            Ok(record) => Ok(record),
            Err(StorageError::Json(e)) => Err(StorageError::InvalidRecord {
                path,
                reason: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Insert or replace a game.
    ///
    /// Returns the outcome, the record as stored and the season it was
    /// previously filed under. The stored record is only rewritten when
    /// something changed.
    pub fn upsert(
        &self,
        mut record: GameRecord,
        mark: PlayoffMark,
    ) -> Result<Upserted, StorageError> {
        let existing = self.load(&record.id)?;

        if let Some(stored) = &existing {
            if stored.date != record.date || stored.opponent != record.opponent {
                return Err(StorageError::DuplicateConflict {
                    id: record.id.clone(),
                    stored_date: stored.date,
                    stored_opponent: stored.opponent.clone(),
                    incoming_date: record.date,
                    incoming_opponent: record.opponent.clone(),
                });
            }
        }

        record.is_playoff = match mark {
            PlayoffMark::Explicit(value) => value,
            PlayoffMark::Unspecified => {
                let stored_playoff = existing.as_ref().is_some_and(|s| s.is_playoff);
                if stored_playoff && !record.is_playoff {
                    info!("Keeping stored playoff flag for {}", record.id);
                }
                stored_playoff || record.is_playoff
            }
        };

        let outcome = match &existing {
            None => UpsertOutcome::Created,
            Some(stored) if *stored == record => UpsertOutcome::Unchanged,
            Some(_) => UpsertOutcome::Updated,
        };

        if outcome != UpsertOutcome::Unchanged {
            write_json_atomic(&self.config.game_path(&record.id), &record)?;
        }
        debug!("Game {} {}", record.id, outcome);

        Ok(Upserted {
            outcome,
            record,
            previous_season: existing.map(|stored| stored.season),
        })
    }

    fn game_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        json_files(&self.config.games_dir())
    }

    fn read_game_file(path: &Path) -> Result<GameRecord, StorageError> {
        let invalid = |reason: String| StorageError::InvalidRecord {
            path: path.to_path_buf(),
            reason,
        };
        let contents = fs::read_to_string(path)?;
        let mut record: GameRecord =
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

        // Results are never trusted from disk.
        match record.reconcile_result() {
            Ok(true) => warn!(
                "{:?}: stored result disagrees with score {}-{}, using {}",
                path, record.score.us, record.score.them, record.result
            ),
            Ok(false) => {}
            Err(e) => return Err(invalid(e.to_string())),
        }
        Ok(record)
    }

    /// Every stored game, ordered by date then id.
    pub fn list_all(&self) -> Result<Vec<GameRecord>, StorageError> {
        let mut games = Vec::new();
        for path in self.game_files()? {
            games.push(Self::read_game_file(&path)?);
        }
        games.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        debug!("Loaded {} games", games.len());
        Ok(games)
    }

    /// Stored games for one season key.
    pub fn list_season(&self, season: &str) -> Result<Vec<GameRecord>, StorageError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|g| g.season == season)
            .collect())
    }

    /// Rewrite stat-map keys in every stored game.
    ///
    /// All games are checked before any is written, so a conflict anywhere
    /// leaves every file untouched. Each changed file is first copied to
    /// `<id>.json.bak`.
    pub fn remap_numbers(&self, remap: &NumberRemap) -> Result<RemapReport, StorageError> {
        let mut report = RemapReport::default();
        let mut pending: Vec<(PathBuf, GameRecord)> = Vec::new();

        for path in self.game_files()? {
            report.games_scanned += 1;
            let mut record = Self::read_game_file(&path)?;

            let mut changed = false;
            let mut remapped: BTreeMap<String, GameLine> = BTreeMap::new();
            for (number, line) in std::mem::take(&mut record.stats) {
                let target = match remap.get(&number) {
                    Some(new) if *new != number => {
                        changed = true;
                        new.clone()
                    }
                    _ => number,
                };
                if remapped.contains_key(&target) {
                    return Err(StorageError::RemapConflict {
                        game: record.id.clone(),
                        number: target,
                    });
                }
                remapped.insert(target, line);
            }

            if changed {
                record.stats = remapped;
                pending.push((path, record));
            }
        }

        for (path, record) in pending {
            let mut backup_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
            backup_name.push(".bak");
            let backup = path.with_file_name(backup_name);
            fs::copy(&path, &backup)?;
            write_json_atomic(&path, &record)?;

            info!("Remapped numbers in {}", record.id);
            report.games_changed += 1;
            report.backups.push(backup);
        }

        Ok(report)
    }
}
