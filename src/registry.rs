//! Player identity registry.
//!
//! Identity is the normalized printed name. Jersey numbers are attributes:
//! one player may wear several numbers across teams and seasons, and a number
//! says nothing about who wore it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{fill_if_empty, EntityId, PlayerId, PlayerIdentity};

/// Old jersey number → new jersey number.
pub type NumberRemap = BTreeMap<String, String>;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Player name {0:?} has no letters or digits")]
    EmptyName(String),

    #[error("Seed entry {0} has neither a name nor an id")]
    NamelessSeed(String),

    #[error("Invalid seed file: {0}")]
    InvalidSeed(#[from] serde_json::Error),
}

/// What an observation or merge did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Created,
    Updated,
    Unchanged,
}

/// Jersey number as it appears in seed files: `"14"` or `14`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum JerseyNumber {
    Text(String),
    Int(u64),
}

impl JerseyNumber {
    fn as_string(&self) -> String {
        match self {
            JerseyNumber::Text(s) => s.trim().to_string(),
            JerseyNumber::Int(n) => n.to_string(),
        }
    }
}

/// One curated player from a metadata seed file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedPlayer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub number: Option<JerseyNumber>,
    #[serde(default)]
    pub numbers: Vec<JerseyNumber>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub photo: Option<String>,
    /// Legacy image map; the first entry stands in for `photo`
    #[serde(default)]
    pub images: BTreeMap<String, String>,
}

impl SeedPlayer {
    fn all_numbers(&self) -> BTreeSet<String> {
        self.number
            .iter()
            .chain(self.numbers.iter())
            .map(JerseyNumber::as_string)
            .filter(|n| !n.is_empty())
            .collect()
    }

    fn photo(&self) -> Option<&str> {
        self.photo
            .as_deref()
            .or_else(|| self.images.values().next().map(String::as_str))
    }
}

/// A seed file: either a list of players or a map keyed by number or id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SeedFile {
    List(Vec<SeedPlayer>),
    Map(BTreeMap<String, SeedPlayer>),
}

impl SeedFile {
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flatten into players.
    ///
    /// Map keys that look like jersey numbers are used as the number when the
    /// entry has none; any other key is the player id unless the entry names
    /// one itself.
    pub fn into_players(self) -> Vec<SeedPlayer> {
        match self {
            SeedFile::List(players) => players,
            SeedFile::Map(map) => map
                .into_iter()
                .map(|(key, mut player)| {
                    let key = key.trim().to_string();
                    let numeric = !key.is_empty() && key.chars().all(|c| c.is_ascii_digit());
                    if numeric {
                        if player.number.is_none() && player.numbers.is_empty() {
                            player.number = Some(JerseyNumber::Text(key));
                        }
                    } else if !key.is_empty() && player.id.is_none() {
                        player.id = Some(key);
                    }
                    player
                })
                .collect(),
        }
    }
}

/// Summary of a seed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// All known players, keyed by id. Serialized as `players.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRegistry {
    players: BTreeMap<PlayerId, PlayerIdentity>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PlayerId) -> Option<&PlayerIdentity> {
        self.players.get(id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerIdentity> {
        self.players.values()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Record that `printed_name` wore `number` for `team` in some game.
    ///
    /// Creates the identity on first sight. Later sightings only add numbers
    /// and teams; curated fields are never touched.
    pub fn observe(
        &mut self,
        number: &str,
        printed_name: &str,
        team: &str,
    ) -> Result<(PlayerId, Observation), RegistryError> {
        let id = EntityId::for_player(printed_name);
        if id.as_str().is_empty() {
            return Err(RegistryError::EmptyName(printed_name.to_string()));
        }

        match self.players.get_mut(&id) {
            None => {
                debug!("New player {} (#{})", id, number);
                self.players
                    .insert(id.clone(), PlayerIdentity::new(printed_name, number, team));
                Ok((id, Observation::Created))
            }
            Some(player) => {
                let added_number = player.numbers.insert(number.to_string());
                let added_team = player.teams.insert(team.to_string());
                let observation = if added_number || added_team {
                    debug!("Player {} gained number #{} / team {}", id, number, team);
                    Observation::Updated
                } else {
                    Observation::Unchanged
                };
                Ok((id, observation))
            }
        }
    }

    /// Merge one curated seed entry.
    ///
    /// An explicit seed id is used as-is; otherwise the id is derived from
    /// the printed name exactly as `observe` derives it. Curated fields are
    /// adopted only while empty; teams and numbers are unioned. Seed players
    /// not yet seen in any export are created.
    pub fn merge_seed(&mut self, seed: &SeedPlayer) -> Result<Observation, RegistryError> {
        let id = Self::seed_id(seed)?;

        let mut observation = if self.players.contains_key(&id) {
            Observation::Unchanged
        } else {
            debug!("Seed introduces player {}", id);
            Observation::Created
        };
        let player = self.players.entry(id.clone()).or_insert_with(|| {
            let printed = seed
                .name
                .as_deref()
                .or(seed.display_name.as_deref())
                .unwrap_or(id.as_str())
                .trim()
                .to_string();
            PlayerIdentity {
                id: id.clone(),
                name: printed,
                display_name: None,
                numbers: BTreeSet::new(),
                position: None,
                teams: BTreeSet::new(),
                photo: None,
            }
        });

        let mut changed = false;
        changed |= fill_if_empty(&mut player.display_name, seed.display_name.as_deref());
        changed |= fill_if_empty(&mut player.position, seed.position.as_deref());
        changed |= fill_if_empty(&mut player.photo, seed.photo());
        for number in seed.all_numbers() {
            changed |= player.numbers.insert(number);
        }
        for team in seed.teams.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            changed |= player.teams.insert(team.to_string());
        }

        if observation == Observation::Unchanged && changed {
            observation = Observation::Updated;
        }
        Ok(observation)
    }

    fn seed_id(seed: &SeedPlayer) -> Result<PlayerId, RegistryError> {
        if let Some(id) = seed.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(EntityId::from(id));
        }

        let name = seed
            .name
            .as_deref()
            .or(seed.display_name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| RegistryError::NamelessSeed(seed.id.clone().unwrap_or_default()))?;
        let id = EntityId::for_player(name);
        if id.as_str().is_empty() {
            return Err(RegistryError::EmptyName(name.to_string()));
        }
        Ok(id)
    }

    /// Merge a whole seed file.
    pub fn merge_seed_file(&mut self, seed: SeedFile) -> Result<SeedSummary, RegistryError> {
        let mut summary = SeedSummary::default();
        for player in seed.into_players() {
            match self.merge_seed(&player)? {
                Observation::Created => summary.created += 1,
                Observation::Updated => summary.updated += 1,
                Observation::Unchanged => summary.unchanged += 1,
            }
        }
        info!(
            "Seed merged: {} created, {} updated, {} unchanged",
            summary.created, summary.updated, summary.unchanged
        );
        Ok(summary)
    }

    /// Rewrite seen-number sets. Returns the number of players changed.
    pub fn remap_numbers(&mut self, remap: &NumberRemap) -> usize {
        let mut changed = 0;
        for player in self.players.values_mut() {
            let remapped: BTreeSet<String> = player
                .numbers
                .iter()
                .map(|n| remap.get(n).cloned().unwrap_or_else(|| n.clone()))
                .collect();
            if remapped != player.numbers {
                player.numbers = remapped;
                changed += 1;
            }
        }
        changed
    }
}
