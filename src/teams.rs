//! Team resolution.
//!
//! Decides which side of an export is ours: the title tells us home or
//! away, the roster labels (or table order) tell us which stat table.

use thiserror::Error;
use tracing::{debug, info};

use crate::extract::{RawBoxScore, RawRoster};
use crate::models::{HomeAway, Score};

/// Fatal resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnresolvedTeamError {
    #[error("Neither '{away}' nor '{home}' matches a configured team name variant")]
    NoMatch { away: String, home: String },

    #[error("Both '{away}' and '{home}' match a configured team name variant")]
    BothMatch { away: String, home: String },

    #[error("Cannot pick our stat table: {0}")]
    NoRoster(String),
}

/// Our side of one game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGame {
    pub home_away: HomeAway,
    /// Our team's name as printed in the title
    pub team_name: String,
    pub opponent: String,
    pub score: Score,
    pub our_roster: RawRoster,
    pub opponent_roster: Option<RawRoster>,
}

/// Case, space and punctuation insensitive comparison key.
pub fn team_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when `name` contains any of the variants.
pub fn matches_team(name: &str, variants: &[String]) -> bool {
    let key = team_key(name);
    !key.is_empty()
        && variants
            .iter()
            .map(|v| team_key(v))
            .any(|v| !v.is_empty() && key.contains(&v))
}

/// Resolve our side, our roster and the final score.
///
/// `opp_score` replaces the opponent's title score when the export is known
/// to be wrong.
pub fn resolve_teams(
    box_score: &RawBoxScore,
    variants: &[String],
    opp_score: Option<u32>,
) -> Result<ResolvedGame, UnresolvedTeamError> {
    let away_ours = matches_team(&box_score.away_team, variants);
    let home_ours = matches_team(&box_score.home_team, variants);

    let (home_away, team_name, opponent, us, them) = match (away_ours, home_ours) {
        (true, false) => (
            HomeAway::Away,
            &box_score.away_team,
            &box_score.home_team,
            box_score.away_score,
            box_score.home_score,
        ),
        (false, true) => (
            HomeAway::Home,
            &box_score.home_team,
            &box_score.away_team,
            box_score.home_score,
            box_score.away_score,
        ),
        (true, true) => {
            return Err(UnresolvedTeamError::BothMatch {
                away: box_score.away_team.clone(),
                home: box_score.home_team.clone(),
            })
        }
        (false, false) => {
            return Err(UnresolvedTeamError::NoMatch {
                away: box_score.away_team.clone(),
                home: box_score.home_team.clone(),
            })
        }
    };

    let ours = pick_roster(&box_score.rosters, variants, opponent, home_away)?;
    let our_roster = box_score.rosters[ours].clone();
    let opponent_roster = box_score
        .rosters
        .iter()
        .enumerate()
        .find(|(idx, _)| *idx != ours)
        .map(|(_, roster)| roster.clone());

    let them = match opp_score {
        Some(score) if score != them => {
            info!(
                "Opponent score override: {} replaces {} from the title",
                score, them
            );
            score
        }
        _ => them,
    };

    Ok(ResolvedGame {
        home_away,
        team_name: team_name.clone(),
        opponent: opponent.clone(),
        score: Score { us, them },
        our_roster,
        opponent_roster,
    })
}

fn pick_roster(
    rosters: &[RawRoster],
    variants: &[String],
    opponent: &str,
    home_away: HomeAway,
) -> Result<usize, UnresolvedTeamError> {
    let labelled_ours: Vec<usize> = rosters
        .iter()
        .filter(|r| r.label.as_deref().is_some_and(|l| matches_team(l, variants)))
        .map(|r| r.position)
        .collect();

    match labelled_ours.as_slice() {
        [idx] => {
            debug!("Our roster is table {} by label", idx + 1);
            return Ok(*idx);
        }
        [] => {}
        _ => {
            return Err(UnresolvedTeamError::NoRoster(format!(
                "{} tables are labelled with our team name",
                labelled_ours.len()
            )))
        }
    }

    let opponent_key = team_key(opponent);
    let is_opponent = |r: &RawRoster| {
        r.label
            .as_deref()
            .is_some_and(|l| !opponent_key.is_empty() && team_key(l) == opponent_key)
    };

    match rosters {
        [] => Err(UnresolvedTeamError::NoRoster("no stat tables".to_string())),
        [only] => {
            if is_opponent(only) {
                Err(UnresolvedTeamError::NoRoster(format!(
                    "the only stat table belongs to {}",
                    opponent
                )))
            } else {
                Ok(0)
            }
        }
        [first, second, ..] => {
            if is_opponent(first) && !is_opponent(second) {
                return Ok(1);
            }
            if is_opponent(second) && !is_opponent(first) {
                return Ok(0);
            }
            let idx = match home_away {
                HomeAway::Away => 0,
                HomeAway::Home => 1,
            };
            debug!("Our roster is table {} by position", idx + 1);
            Ok(idx)
        }
    }
}
