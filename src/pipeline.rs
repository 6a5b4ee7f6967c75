//! Ingestion pipeline.
//!
//! Extractor → team resolver → normalizer → registry → game store →
//! derived views. Every mutating operation holds the team directory lock
//! for its whole run and replaces derived files as one batch.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::calculate::{compute_views, DerivedViews, SeasonScope};
use crate::config::{AppConfig, ConfigError};
use crate::extract::{extract_box_score, CellParseWarning, ExtractionError, RawBoxScore};
use crate::models::{
    fingerprint, GameId, GameLine, GameRecord, GameResult, HomeAway, PlayerId, ScoreError, Score,
    SeasonMeta, SeasonsMeta,
};
use crate::normalize::normalize_roster;
use crate::registry::{NumberRemap, Observation, PlayerRegistry, RegistryError, SeedFile, SeedSummary};
use crate::storage::{
    json_files, read_json, GameStore, RemapReport, StagedBatch, StorageConfig, StorageError,
    StoreLock, UpsertOutcome,
};
use crate::teams::{resolve_teams, UnresolvedTeamError};

/// Pipeline errors. Every variant is fatal; nothing is written.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractionError,
    },

    #[error("{path}: {source}")]
    UnresolvedTeam {
        path: PathBuf,
        #[source]
        source: UnresolvedTeamError,
    },

    #[error("{path}: {source}")]
    TiedScore {
        path: PathBuf,
        #[source]
        source: ScoreError,
    },

    #[error("{path}: jersey #{number} appears on more than one row")]
    DuplicateNumber { path: PathBuf, number: String },

    #[error("Invalid season label {0:?}")]
    InvalidSeason(String),

    #[error("{path}: invalid number mapping: {reason}")]
    InvalidRemap { path: PathBuf, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One `ingest` invocation.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub path: PathBuf,
    pub season_label: String,
    /// `None` keeps a stored playoff flag
    pub playoff: Option<bool>,
    pub opp_score: Option<u32>,
    pub date: Option<NaiveDate>,
}

impl IngestRequest {
    pub fn new(path: impl Into<PathBuf>, season_label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            season_label: season_label.into(),
            playoff: None,
            opp_score: None,
            date: None,
        }
    }

    pub fn with_playoff(mut self, playoff: Option<bool>) -> Self {
        self.playoff = playoff;
        self
    }

    pub fn with_opp_score(mut self, score: Option<u32>) -> Self {
        self.opp_score = score;
        self
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }
}

/// What one ingest did.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub game_id: GameId,
    pub outcome: UpsertOutcome,
    pub opponent: String,
    pub home_away: HomeAway,
    pub score: Score,
    pub result: GameResult,
    pub is_playoff: bool,
    pub players_in_game: usize,
    pub players_created: Vec<PlayerId>,
    pub players_updated: Vec<PlayerId>,
    pub warnings: Vec<CellParseWarning>,
    pub files_written: usize,
}

/// What a recompute did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub games: usize,
    pub seasons: Vec<String>,
    pub files_written: usize,
}

/// What a remap did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapSummary {
    pub games: RemapReport,
    pub players_changed: usize,
    pub recompute: RecomputeSummary,
}

/// What a seed import did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub seed: SeedSummary,
    pub total_players: usize,
    pub recompute: RecomputeSummary,
}

fn read_source(path: &Path) -> Result<Vec<u8>, IngestError> {
    fs::read(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_registry(storage: &StorageConfig) -> Result<PlayerRegistry, StorageError> {
    Ok(read_json(&storage.players_path())?.unwrap_or_default())
}

fn load_seasons_meta(storage: &StorageConfig) -> Result<SeasonsMeta, StorageError> {
    Ok(read_json(&storage.seasons_meta_path())?.unwrap_or_default())
}

/// Stage the registry and every derived view, then swap them in together.
///
/// Season files for seasons that no longer have any games are removed in
/// the same batch.
fn write_views(
    storage: &StorageConfig,
    registry: &PlayerRegistry,
    views: &DerivedViews,
) -> Result<usize, StorageError> {
    let mut batch = StagedBatch::new();
    batch.add(storage.players_path(), registry)?;
    for season in &views.seasons {
        batch.add(storage.season_path(&season.season), season)?;
    }
    for path in json_files(&storage.seasons_dir())? {
        let live = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|key| views.seasons_meta.contains_key(key));
        if !live {
            debug!("Season file {:?} has no games left", path);
            batch.remove(path);
        }
    }
    batch.add(storage.records_path(), &views.records)?;
    batch.add(storage.career_highs_path(), &views.career_highs)?;
    batch.add(storage.games_index_path(), &views.index)?;
    batch.add(storage.seasons_meta_path(), &views.seasons_meta)?;
    batch.commit()
}

fn recompute_locked(
    config: &AppConfig,
    storage: &StorageConfig,
    registry: &PlayerRegistry,
    meta: &SeasonsMeta,
    scope: &SeasonScope,
) -> Result<RecomputeSummary, StorageError> {
    let games = GameStore::new(storage.clone()).list_all()?;
    let views = compute_views(&games, registry, meta, scope, config.records.depth);
    let files_written = write_views(storage, registry, &views)?;

    Ok(RecomputeSummary {
        games: games.len(),
        seasons: views.seasons.iter().map(|s| s.season.clone()).collect(),
        files_written,
    })
}

/// Parse an export without touching the store.
pub fn inspect(path: &Path, date: Option<NaiveDate>) -> Result<RawBoxScore, IngestError> {
    let bytes = read_source(path)?;
    let html = String::from_utf8_lossy(&bytes);
    extract_box_score(&html, date).map_err(|source| IngestError::Extraction {
        path: path.to_path_buf(),
        source,
    })
}

/// Ingest one export and rebuild the derived views.
pub fn ingest_export(
    config: &AppConfig,
    request: &IngestRequest,
) -> Result<IngestSummary, IngestError> {
    let path = request.path.as_path();
    let season = SeasonMeta::from_label(&request.season_label)
        .ok_or_else(|| IngestError::InvalidSeason(request.season_label.clone()))?;

    let storage = StorageConfig::new(config.team_dir());
    let _lock = StoreLock::acquire(&storage.lock_path())?;
    info!("Ingesting {:?} into season {}", path, season.key);

    let bytes = read_source(path)?;
    let digest = fingerprint(&bytes);
    let html = String::from_utf8_lossy(&bytes);

    let box_score =
        extract_box_score(&html, request.date).map_err(|source| IngestError::Extraction {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Extracted {:?}", box_score.title);

    let resolved = resolve_teams(&box_score, &config.team.variants, request.opp_score).map_err(
        |source| IngestError::UnresolvedTeam {
            path: path.to_path_buf(),
            source,
        },
    )?;
    info!(
        "{} ({}) vs {}: {}-{}",
        resolved.team_name, resolved.home_away, resolved.opponent, resolved.score.us,
        resolved.score.them
    );

    let lines = normalize_roster(&resolved.our_roster);

    let mut registry = load_registry(&storage)?;
    let mut created = Vec::new();
    let mut updated = Vec::new();
    let mut numbers = BTreeSet::new();
    let mut stats: BTreeMap<String, GameLine> = BTreeMap::new();
    for line in lines {
        if !numbers.insert(line.number.clone()) {
            return Err(IngestError::DuplicateNumber {
                path: path.to_path_buf(),
                number: line.number,
            });
        }
        // Rostered DNP players are registered but kept out of the stat map.
        let (player_id, observation) =
            registry.observe(&line.number, &line.name, &config.team.name)?;
        match observation {
            Observation::Created => created.push(player_id.clone()),
            Observation::Updated => updated.push(player_id.clone()),
            Observation::Unchanged => {}
        }
        if !line.played {
            continue;
        }
        stats.insert(
            line.number,
            GameLine {
                player_id,
                name: line.name,
                stats: line.stats,
            },
        );
    }

    let record = GameRecord::new(
        box_score.date,
        season.key.clone(),
        resolved.opponent.clone(),
        resolved.home_away,
        resolved.score,
    )
    .map_err(|source| IngestError::TiedScore {
        path: path.to_path_buf(),
        source,
    })?
    .with_source_digest(digest)
    .with_stats(stats);

    let store = GameStore::new(storage.clone());
    let upserted = store.upsert(record, request.playoff.into())?;
    let (outcome, stored) = (upserted.outcome, upserted.record);
    info!("Game {} {}", stored.id, outcome);

    let mut scope = BTreeSet::from([season.key.clone()]);
    if let Some(previous) = upserted.previous_season {
        if previous != season.key {
            info!("Game {} moved from season {} to {}", stored.id, previous, season.key);
            scope.insert(previous);
        }
    }

    let mut meta = load_seasons_meta(&storage)?;
    meta.insert(season.key.clone(), season.clone());
    let recompute = recompute_locked(
        config,
        &storage,
        &registry,
        &meta,
        &SeasonScope::Only(scope),
    )?;

    for warning in &box_score.warnings {
        warn!("{:?}: {}", path, warning);
    }

    Ok(IngestSummary {
        game_id: stored.id.clone(),
        outcome,
        opponent: stored.opponent.clone(),
        home_away: stored.home_away,
        score: stored.score,
        result: stored.result,
        is_playoff: stored.is_playoff,
        players_in_game: stored.stats.len(),
        players_created: created,
        players_updated: updated,
        warnings: box_score.warnings,
        files_written: recompute.files_written,
    })
}

/// Rebuild derived views from the stored games.
pub fn recompute(config: &AppConfig, scope: &SeasonScope) -> Result<RecomputeSummary, IngestError> {
    let storage = StorageConfig::new(config.team_dir());
    let _lock = StoreLock::acquire(&storage.lock_path())?;

    let registry = load_registry(&storage)?;
    let meta = load_seasons_meta(&storage)?;
    let summary = recompute_locked(config, &storage, &registry, &meta, scope)?;
    info!(
        "Recomputed {} seasons from {} games",
        summary.seasons.len(),
        summary.games
    );
    Ok(summary)
}

/// Merge a curated player seed file into the registry.
pub fn import_players(config: &AppConfig, seed_path: &Path) -> Result<ImportSummary, IngestError> {
    let storage = StorageConfig::new(config.team_dir());
    let _lock = StoreLock::acquire(&storage.lock_path())?;

    let bytes = read_source(seed_path)?;
    let seed = SeedFile::from_json(&String::from_utf8_lossy(&bytes))?;

    let mut registry = load_registry(&storage)?;
    let seed_summary = registry.merge_seed_file(seed)?;

    // Curated names show up in aggregates and records.
    let meta = load_seasons_meta(&storage)?;
    let recompute = recompute_locked(config, &storage, &registry, &meta, &SeasonScope::All)?;

    Ok(ImportSummary {
        seed: seed_summary,
        total_players: registry.len(),
        recompute,
    })
}

/// Parse a `{"old": "new"}` jersey mapping.
pub fn parse_number_remap(path: &Path, json: &str) -> Result<NumberRemap, IngestError> {
    let invalid = |reason: String| IngestError::InvalidRemap {
        path: path.to_path_buf(),
        reason,
    };
    let raw: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;

    let mut remap = NumberRemap::new();
    for (old, new) in raw {
        let new = match new {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            other => return Err(invalid(format!("#{} maps to {}", old, other))),
        };
        let old = old.trim().to_string();
        if old.is_empty() || new.is_empty() {
            return Err(invalid("empty jersey number".to_string()));
        }
        remap.insert(old, new);
    }
    Ok(remap)
}

/// Rewrite jersey numbers in every stored game and in the registry, then
/// rebuild every season.
pub fn remap_numbers(config: &AppConfig, mapping_path: &Path) -> Result<RemapSummary, IngestError> {
    let storage = StorageConfig::new(config.team_dir());
    let _lock = StoreLock::acquire(&storage.lock_path())?;

    let bytes = read_source(mapping_path)?;
    let remap = parse_number_remap(mapping_path, &String::from_utf8_lossy(&bytes))?;
    for (old, new) in &remap {
        info!("Remap #{} -> #{}", old, new);
    }

    let games = GameStore::new(storage.clone()).remap_numbers(&remap)?;
    let mut registry = load_registry(&storage)?;
    let players_changed = registry.remap_numbers(&remap);

    let meta = load_seasons_meta(&storage)?;
    let recompute = recompute_locked(config, &storage, &registry, &meta, &SeasonScope::All)?;

    Ok(RemapSummary {
        games,
        players_changed,
        recompute,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(temp_dir: &TempDir) -> AppConfig {
        AppConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        }
    }

    const EXPORT: &str = "<html><head><title>Opponent 60 at Pretty Good 75</title></head>\
        <body><span class=\"detail\">16 Dec 2025</span><table id=\"stats\">\
        <tr><th>Player</th><th>FG</th><th>FG%</th><th>3PT</th><th>3PT%</th><th>FT</th>\
        <th>FT%</th><th>OREB</th><th>DREB</th><th>FOUL</th><th>STL</th><th>TO</th>\
        <th>BLK</th><th>ASST</th><th>PTS</th></tr>\
        <tr><td>#7 J. Smith</td><td>9-15</td><td></td><td>0-0</td><td></td><td>0-0</td>\
        <td></td><td>1</td><td>3</td><td>2</td><td>1</td><td>0</td><td>0</td><td>2</td>\
        <td>18</td></tr></table></body></html>";

    fn write_export(temp_dir: &TempDir, html: &str) -> PathBuf {
        let path = temp_dir.path().join("export.html");
        fs::write(&path, html).unwrap();
        path
    }

    #[test]
    fn test_ingest_minimal_export() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        let path = write_export(&temp_dir, EXPORT);

        let summary = ingest_export(&config, &IngestRequest::new(&path, "2025")).unwrap();
        assert_eq!(summary.outcome, UpsertOutcome::Created);
        assert_eq!(summary.game_id.as_str(), "2025-12-16-opponent");
        assert_eq!(summary.result, GameResult::W);
        assert_eq!(summary.score, Score { us: 75, them: 60 });
        assert_eq!(summary.players_created.len(), 1);
        assert!(summary.warnings.is_empty());

        let storage = StorageConfig::new(config.team_dir());
        assert!(storage.players_path().exists());
        assert!(storage.season_path("2025").exists());
        assert!(storage.records_path().exists());
        assert!(storage.career_highs_path().exists());
        assert!(storage.games_index_path().exists());
        assert!(storage.seasons_meta_path().exists());
        assert!(!storage.lock_path().exists());
    }

    #[test]
    fn test_ingest_rejects_bad_season() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_export(&temp_dir, EXPORT);
        let err = ingest_export(&config(&temp_dir), &IngestRequest::new(&path, "  ")).unwrap_err();
        assert!(matches!(err, IngestError::InvalidSeason(_)));
    }

    #[test]
    fn test_ingest_missing_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.html");
        let err = ingest_export(&config(&temp_dir), &IngestRequest::new(&missing, "2025"))
            .unwrap_err();
        assert!(err.to_string().contains("nope.html"));
    }

    #[test]
    fn test_ingest_tie_is_fatal_and_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        let path = write_export(&temp_dir, EXPORT);

        let err = ingest_export(
            &config,
            &IngestRequest::new(&path, "2025").with_opp_score(Some(75)),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::TiedScore { .. }));
        assert!(!StorageConfig::new(config.team_dir()).players_path().exists());
    }

    #[test]
    fn test_ingest_fails_when_locked() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        let path = write_export(&temp_dir, EXPORT);
        let storage = StorageConfig::new(config.team_dir());
        let _held = StoreLock::acquire(&storage.lock_path()).unwrap();

        let err = ingest_export(&config, &IngestRequest::new(&path, "2025")).unwrap_err();
        assert!(matches!(err, IngestError::Storage(StorageError::Locked(_))));
    }

    #[test]
    fn test_parse_number_remap() {
        let path = Path::new("mapping.json");
        let remap = parse_number_remap(path, r#"{"1": "14", "11": 24}"#).unwrap();
        assert_eq!(remap["1"], "14");
        assert_eq!(remap["11"], "24");

        assert!(parse_number_remap(path, r#"{"1": null}"#).is_err());
        assert!(parse_number_remap(path, r#"{"1": ""}"#).is_err());
        assert!(parse_number_remap(path, "[1, 2]").is_err());
    }

    #[test]
    fn test_inspect_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_export(&temp_dir, EXPORT);
        let box_score = inspect(&path, None).unwrap();
        assert_eq!(box_score.home_team, "Pretty Good");
        assert_eq!(box_score.rosters[0].rows.len(), 1);
        assert!(!temp_dir.path().join("pretty-good").exists());
    }
}
