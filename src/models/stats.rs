//! Per-game and per-season statistics models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Shooting percentage, 0.0 when nothing was attempted.
pub fn percentage(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        0.0
    } else {
        round1(made as f64 / attempted as f64 * 100.0)
    }
}

/// Per-game average, 0.0 when no games were played.
pub fn per_game(total: u32, games: u32) -> f64 {
    if games == 0 {
        0.0
    } else {
        round1(total as f64 / games as f64)
    }
}

/// A made/attempted pair. Serialized as `[made, attempted]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotLine(pub u32, pub u32);

impl ShotLine {
    pub fn new(made: u32, attempted: u32) -> Self {
        Self(made, attempted)
    }

    pub fn made(&self) -> u32 {
        self.0
    }

    pub fn attempted(&self) -> u32 {
        self.1
    }

    pub fn pct(&self) -> f64 {
        percentage(self.0, self.1)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0 && self.1 == 0
    }

    /// Component-wise subtraction, clamped at zero.
    pub fn saturating_sub(self, other: ShotLine) -> ShotLine {
        ShotLine(self.0.saturating_sub(other.0), self.1.saturating_sub(other.1))
    }
}

impl std::ops::AddAssign for ShotLine {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
        self.1 = self.1.saturating_add(rhs.1);
    }
}

/// One player's line for one game.
///
/// Counting stats are the source of truth; the percentage fields and the
/// two-point line are derived by [`PlayerGameStats::with_derived`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameStats {
    #[serde(default)]
    pub pts: u32,
    #[serde(default)]
    pub reb: u32,
    #[serde(default)]
    pub oreb: u32,
    #[serde(default)]
    pub dreb: u32,
    #[serde(default)]
    pub asst: u32,
    #[serde(default)]
    pub stl: u32,
    #[serde(default)]
    pub blk: u32,
    #[serde(default)]
    pub to: u32,
    #[serde(default)]
    pub foul: u32,

    #[serde(default)]
    pub fg: ShotLine,
    #[serde(rename = "3pt", default)]
    pub three_pt: ShotLine,
    #[serde(default)]
    pub ft: ShotLine,
    #[serde(rename = "2pt", default)]
    pub two_pt: ShotLine,

    #[serde(default)]
    pub fg_pct: f64,
    #[serde(rename = "3pt_pct", default)]
    pub three_pt_pct: f64,
    #[serde(default)]
    pub ft_pct: f64,
    #[serde(rename = "2pt_pct", default)]
    pub two_pt_pct: f64,
}

impl PlayerGameStats {
    /// Fill in the two-point line and all shooting percentages.
    pub fn with_derived(mut self) -> Self {
        self.two_pt = self.fg.saturating_sub(self.three_pt);
        self.fg_pct = self.fg.pct();
        self.three_pt_pct = self.three_pt.pct();
        self.ft_pct = self.ft.pct();
        self.two_pt_pct = self.two_pt.pct();
        self
    }

    /// False when every counting stat and every shot line is zero (DNP).
    pub fn did_play(&self) -> bool {
        let counts = [
            self.pts, self.reb, self.oreb, self.dreb, self.asst, self.stl, self.blk, self.to,
            self.foul,
        ];
        counts.iter().any(|&v| v > 0)
            || !self.fg.is_zero()
            || !self.three_pt.is_zero()
            || !self.ft.is_zero()
    }
}

/// Partition of games used for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Regular,
    Playoff,
    All,
}

impl Split {
    /// The splits a game contributes to.
    pub fn for_game(is_playoff: bool) -> [Split; 2] {
        if is_playoff {
            [Split::Playoff, Split::All]
        } else {
            [Split::Regular, Split::All]
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Split::Regular => write!(f, "regular"),
            Split::Playoff => write!(f, "playoff"),
            Split::All => write!(f, "all"),
        }
    }
}

/// One value per split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Splits<T> {
    pub regular: T,
    pub playoff: T,
    pub all: T,
}

impl<T> Splits<T> {
    pub fn get(&self, split: Split) -> &T {
        match split {
            Split::Regular => &self.regular,
            Split::Playoff => &self.playoff,
            Split::All => &self.all,
        }
    }

    pub fn get_mut(&mut self, split: Split) -> &mut T {
        match split {
            Split::Regular => &mut self.regular,
            Split::Playoff => &mut self.playoff,
            Split::All => &mut self.all,
        }
    }
}

/// A player's totals and rates for one season split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonLine {
    pub name: String,
    pub numbers: BTreeSet<String>,
    pub gp: u32,

    pub pts: u32,
    pub reb: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub asst: u32,
    pub stl: u32,
    pub blk: u32,
    pub to: u32,
    pub foul: u32,

    pub fg: ShotLine,
    #[serde(rename = "2pt")]
    pub two_pt: ShotLine,
    #[serde(rename = "3pt")]
    pub three_pt: ShotLine,
    pub ft: ShotLine,

    pub ppg: f64,
    pub rpg: f64,
    pub apg: f64,
    pub spg: f64,
    pub bpg: f64,
    pub tpg: f64,
    pub fpg: f64,
    pub orebpg: f64,
    pub drebpg: f64,

    pub fgm_pg: f64,
    pub fga_pg: f64,
    #[serde(rename = "2pm_pg")]
    pub two_pm_pg: f64,
    #[serde(rename = "2pa_pg")]
    pub two_pa_pg: f64,
    #[serde(rename = "3pm_pg")]
    pub three_pm_pg: f64,
    #[serde(rename = "3pa_pg")]
    pub three_pa_pg: f64,
    pub ftm_pg: f64,
    pub fta_pg: f64,

    pub fg_pct: f64,
    #[serde(rename = "2pt_pct")]
    pub two_pt_pct: f64,
    #[serde(rename = "3pt_pct")]
    pub three_pt_pct: f64,
    pub ft_pct: f64,
}

impl PlayerSeasonLine {
    /// Add one game's line to the running totals.
    pub fn accumulate(&mut self, number: &str, game: &PlayerGameStats) {
        self.numbers.insert(number.to_string());
        self.gp = self.gp.saturating_add(1);
        self.pts = self.pts.saturating_add(game.pts);
        self.reb = self.reb.saturating_add(game.reb);
        self.oreb = self.oreb.saturating_add(game.oreb);
        self.dreb = self.dreb.saturating_add(game.dreb);
        self.asst = self.asst.saturating_add(game.asst);
        self.stl = self.stl.saturating_add(game.stl);
        self.blk = self.blk.saturating_add(game.blk);
        self.to = self.to.saturating_add(game.to);
        self.foul = self.foul.saturating_add(game.foul);
        self.fg += game.fg;
        self.three_pt += game.three_pt;
        self.ft += game.ft;
        self.two_pt += game.fg.saturating_sub(game.three_pt);
    }

    /// Compute rates from the accumulated totals.
    pub fn finish(mut self) -> Self {
        let gp = self.gp;
        self.ppg = per_game(self.pts, gp);
        self.rpg = per_game(self.reb, gp);
        self.apg = per_game(self.asst, gp);
        self.spg = per_game(self.stl, gp);
        self.bpg = per_game(self.blk, gp);
        self.tpg = per_game(self.to, gp);
        self.fpg = per_game(self.foul, gp);
        self.orebpg = per_game(self.oreb, gp);
        self.drebpg = per_game(self.dreb, gp);

        self.fgm_pg = per_game(self.fg.made(), gp);
        self.fga_pg = per_game(self.fg.attempted(), gp);
        self.two_pm_pg = per_game(self.two_pt.made(), gp);
        self.two_pa_pg = per_game(self.two_pt.attempted(), gp);
        self.three_pm_pg = per_game(self.three_pt.made(), gp);
        self.three_pa_pg = per_game(self.three_pt.attempted(), gp);
        self.ftm_pg = per_game(self.ft.made(), gp);
        self.fta_pg = per_game(self.ft.attempted(), gp);

        self.fg_pct = self.fg.pct();
        self.two_pt_pct = self.two_pt.pct();
        self.three_pt_pct = self.three_pt.pct();
        self.ft_pct = self.ft.pct();
        self
    }
}
