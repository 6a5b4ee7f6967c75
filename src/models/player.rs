//! Player identity model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId};

/// A stable, deduplicated player.
///
/// `display_name`, `position` and `photo` are curated fields. The engine
/// never writes them; a seed file may fill them only while they are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Slug of the normalized name
    pub id: PlayerId,

    /// Name as first printed in an export
    pub name: String,

    /// Curated display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Every jersey number this player has been seen wearing
    #[serde(default)]
    pub numbers: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default)]
    pub teams: BTreeSet<String>,

    /// Photo reference, owned by the asset pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl PlayerIdentity {
    /// Create an identity on first sight.
    pub fn new(printed_name: &str, number: &str, team: &str) -> Self {
        Self {
            id: EntityId::for_player(printed_name),
            name: printed_name.trim().to_string(),
            display_name: None,
            numbers: BTreeSet::from([number.to_string()]),
            position: None,
            teams: BTreeSet::from([team.to_string()]),
            photo: None,
        }
    }

    /// Curated display name if set, otherwise the printed name.
    pub fn label(&self) -> &str {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.name,
        }
    }
}

/// Adopt `incoming` only if `slot` is empty. Returns true when adopted.
pub fn fill_if_empty(slot: &mut Option<String>, incoming: Option<&str>) -> bool {
    let slot_empty = slot.as_deref().map_or(true, |s| s.trim().is_empty());
    match incoming.map(str::trim) {
        Some(value) if slot_empty && !value.is_empty() => {
            *slot = Some(value.to_string());
            true
        }
        _ => false,
    }
}
