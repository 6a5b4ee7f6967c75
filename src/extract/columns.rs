//! Stat columns and cell parsing.

use crate::models::ShotLine;

/// A tracked raw stat column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    FieldGoals,
    ThreePointers,
    FreeThrows,
    OffensiveRebounds,
    DefensiveRebounds,
    Rebounds,
    Fouls,
    Steals,
    Turnovers,
    Blocks,
    Assists,
    Points,
}

impl Column {
    /// Map a header label to a column. Percentage headers are not columns.
    pub fn from_header(label: &str) -> Option<Self> {
        let key: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '%')
            .collect::<String>()
            .to_ascii_uppercase();

        let column = match key.as_str() {
            "FG" | "FGMA" => Column::FieldGoals,
            "3PT" | "3P" | "3PMA" | "3PTMA" => Column::ThreePointers,
            "FT" | "FTMA" => Column::FreeThrows,
            "OREB" | "OR" | "OFF" => Column::OffensiveRebounds,
            "DREB" | "DR" | "DEF" => Column::DefensiveRebounds,
            "REB" | "TREB" | "TOT" => Column::Rebounds,
            "FOUL" | "FOULS" | "PF" => Column::Fouls,
            "STL" | "ST" => Column::Steals,
            "TO" | "TOV" => Column::Turnovers,
            "BLK" | "BS" => Column::Blocks,
            "ASST" | "AST" => Column::Assists,
            "PTS" => Column::Points,
            _ => return None,
        };
        Some(column)
    }

    /// Whether cells in this column are `made-attempted` pairs.
    pub fn is_shot_line(&self) -> bool {
        matches!(
            self,
            Column::FieldGoals | Column::ThreePointers | Column::FreeThrows
        )
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Column::FieldGoals => "FG",
            Column::ThreePointers => "3PT",
            Column::FreeThrows => "FT",
            Column::OffensiveRebounds => "OREB",
            Column::DefensiveRebounds => "DREB",
            Column::Rebounds => "REB",
            Column::Fouls => "FOUL",
            Column::Steals => "STL",
            Column::Turnovers => "TO",
            Column::Blocks => "BLK",
            Column::Assists => "ASST",
            Column::Points => "PTS",
        };
        write!(f, "{}", s)
    }
}

/// Column positions of the stock EasyStats export:
/// name, FG, FG%, 3PT, 3PT%, FT, FT%, OREB, DREB, FOUL, STL, TO, BLK, ASST, PTS.
pub const EASYSTATS_LAYOUT: [(usize, Column); 11] = [
    (1, Column::FieldGoals),
    (3, Column::ThreePointers),
    (5, Column::FreeThrows),
    (7, Column::OffensiveRebounds),
    (8, Column::DefensiveRebounds),
    (9, Column::Fouls),
    (10, Column::Steals),
    (11, Column::Turnovers),
    (12, Column::Blocks),
    (13, Column::Assists),
    (14, Column::Points),
];

/// Build a column map from a header row. `None` if nothing was recognised.
pub fn layout_from_headers(headers: &[String]) -> Option<Vec<(usize, Column)>> {
    let mut layout: Vec<(usize, Column)> = Vec::new();
    for (idx, header) in headers.iter().enumerate() {
        if let Some(column) = Column::from_header(header) {
            if layout.iter().all(|(_, c)| *c != column) {
                layout.push((idx, column));
            }
        }
    }
    if layout.is_empty() {
        None
    } else {
        Some(layout)
    }
}

/// Raw counting stats for one row, exactly as printed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCounts {
    pub fg: ShotLine,
    pub three_pt: ShotLine,
    pub ft: ShotLine,
    pub oreb: u32,
    pub dreb: u32,
    /// Only present when the export has an explicit total-rebounds column
    pub reb: Option<u32>,
    pub foul: u32,
    pub stl: u32,
    pub to: u32,
    pub blk: u32,
    pub asst: u32,
    pub pts: u32,
}

/// Unparseable cell content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadCell;

impl RawCounts {
    /// Parse `raw` into `column`. On failure the stat is left at zero.
    pub fn set(&mut self, column: Column, raw: &str) -> Result<(), BadCell> {
        if column.is_shot_line() {
            let line = parse_shot_line(raw);
            let slot = match column {
                Column::FieldGoals => &mut self.fg,
                Column::ThreePointers => &mut self.three_pt,
                _ => &mut self.ft,
            };
            *slot = *line.as_ref().unwrap_or(&ShotLine::default());
            return line.map(|_| ());
        }

        let value = parse_count(raw);
        let v = *value.as_ref().unwrap_or(&0);
        match column {
            Column::OffensiveRebounds => self.oreb = v,
            Column::DefensiveRebounds => self.dreb = v,
            Column::Rebounds => self.reb = Some(v),
            Column::Fouls => self.foul = v,
            Column::Steals => self.stl = v,
            Column::Turnovers => self.to = v,
            Column::Blocks => self.blk = v,
            Column::Assists => self.asst = v,
            Column::Points => self.pts = v,
            Column::FieldGoals | Column::ThreePointers | Column::FreeThrows => {}
        }
        value.map(|_| ())
    }
}

fn is_blank(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || raw == "-" || raw == "\u{2013}" || raw == "\u{2014}"
}

/// `-` and empty cells are zero.
pub fn parse_count(raw: &str) -> Result<u32, BadCell> {
    if is_blank(raw) {
        return Ok(0);
    }
    raw.trim().parse::<u32>().map_err(|_| BadCell)
}

/// `9-15` (or `9/15`) → made 9, attempted 15. Made may not exceed attempted.
pub fn parse_shot_line(raw: &str) -> Result<ShotLine, BadCell> {
    if is_blank(raw) {
        return Ok(ShotLine::default());
    }
    let raw = raw.trim();
    let (made, attempted) = raw
        .split_once('-')
        .or_else(|| raw.split_once('/'))
        .ok_or(BadCell)?;
    let made: u32 = made.trim().parse().map_err(|_| BadCell)?;
    let attempted: u32 = attempted.trim().parse().map_err(|_| BadCell)?;
    if made > attempted {
        return Err(BadCell);
    }
    Ok(ShotLine::new(made, attempted))
}
