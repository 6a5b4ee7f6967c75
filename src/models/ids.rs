//! Deterministic identifiers for games, players and source exports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A deterministic entity ID derived from entity content.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new EntityId from an already-derived string.
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Game identifier: `YYYY-MM-DD-<opponent-slug>`.
    ///
    /// Re-processing the same export yields the same ID, which is what makes
    /// ingestion idempotent.
    pub fn for_game(date: NaiveDate, opponent: &str) -> Self {
        Self(format!("{}-{}", date.format("%Y-%m-%d"), slugify(opponent)))
    }

    /// Player identifier: the normalized name with spaces turned into hyphens.
    pub fn for_player(printed_name: &str) -> Self {
        Self(normalize_name(printed_name).replace(' ', "-"))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Type alias for game IDs
pub type GameId = EntityId;

/// Type alias for player IDs
pub type PlayerId = EntityId;

/// SHA256 fingerprint of a raw export, hex encoded.
pub fn fingerprint(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// Lowercase, collapse every run of non-alphanumerics into a single hyphen.
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_hyphen = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Identity key for a printed player name.
///
/// Lowercased, punctuation removed, whitespace collapsed. `"J. Smith"` and
/// `"j smith"` map to the same key.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
