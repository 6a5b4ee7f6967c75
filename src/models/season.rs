//! Seasons: label parsing and aggregate output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{slugify, PlayerId, PlayerSeasonLine, Splits};

/// Key and display name for a season, derived from the operator's label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonMeta {
    pub key: String,
    pub display_name: String,
}

impl SeasonMeta {
    /// Parse a season label.
    ///
    /// `"2025 Spring"` → key `2025-spring`, display `2025 Spring`.
    /// `"2025"` → key `2025`, display `2025 Season`.
    /// Labels without a leading year are slugged and title-cased.
    /// Returns `None` for a label with no alphanumeric content.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        let key = slugify(label);
        if key.is_empty() {
            return None;
        }

        let year_len = label.chars().take_while(|c| c.is_ascii_digit()).count();
        let display_name = if year_len == 4 {
            let (year, rest) = label.split_at(4);
            let rest = rest.trim();
            if rest.is_empty() {
                format!("{} Season", year)
            } else {
                format!("{} {}", year, title_case(rest))
            }
        } else {
            title_case(label)
        };

        Some(Self { key, display_name })
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Season key → metadata.
pub type SeasonsMeta = BTreeMap<String, SeasonMeta>;

/// Per-player season lines for one split.
pub type SplitLines = BTreeMap<PlayerId, PlayerSeasonLine>;

/// Contents of `seasons/<key>.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonAggregates {
    pub season: String,
    pub games: u32,
    #[serde(flatten)]
    pub splits: Splits<SplitLines>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_label_with_suffix() {
        let meta = SeasonMeta::from_label("2025 spring").unwrap();
        assert_eq!(meta.key, "2025-spring");
        assert_eq!(meta.display_name, "2025 Spring");
    }

    #[test]
    fn test_season_label_year_only() {
        let meta = SeasonMeta::from_label(" 2024 ").unwrap();
        assert_eq!(meta.key, "2024");
        assert_eq!(meta.display_name, "2024 Season");
    }

    #[test]
    fn test_season_label_free_form() {
        let meta = SeasonMeta::from_label("winter LEAGUE").unwrap();
        assert_eq!(meta.key, "winter-league");
        assert_eq!(meta.display_name, "Winter League");
    }

    #[test]
    fn test_season_label_empty() {
        assert!(SeasonMeta::from_label("  ").is_none());
        assert!(SeasonMeta::from_label("--").is_none());
    }

    #[test]
    fn test_season_aggregates_json_is_flat() {
        let agg = SeasonAggregates {
            season: "2025".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&agg).unwrap();
        assert!(value.get("regular").is_some());
        assert!(value.get("playoff").is_some());
        assert!(value.get("all").is_some());
        assert!(value.get("splits").is_none());
    }
}
