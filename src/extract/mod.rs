//! Box-score extraction.
//!
//! Parses one raw EasyStats export into a typed intermediate:
//! - Title: `<away> <score> at <home> <score>`
//! - Date: the first `span.detail` holding a recognisable date
//! - One [`RawRoster`] per stat table, rows in document order
//!
//! Nothing here knows which team is ours; see [`crate::teams`].

mod columns;

pub use columns::{Column, RawCounts};

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, warn};

use columns::{layout_from_headers, EASYSTATS_LAYOUT};

/// Fatal extraction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("No <title> element found")]
    MissingTitle,

    #[error("Title {0:?} does not match '<away> <score> at <home> <score>'")]
    UnrecognizedTitle(String),

    #[error("No game date found in span.detail (expected e.g. '16 Dec 2025'); supply one with --date")]
    MissingDate,

    #[error("No stats table found (expected table#stats)")]
    MissingStatsTable,

    #[error("Table {table}, row {row}: name cell {content:?} is not '#<number> <name>'")]
    MalformedRow {
        table: usize,
        row: usize,
        content: String,
    },
}

/// A cell that could not be read and was recorded as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellParseWarning {
    /// 1-based stat table index
    pub table: usize,
    /// 1-based row index within the table
    pub row: usize,
    pub player: String,
    pub column: Column,
    pub raw: String,
}

impl std::fmt::Display for CellParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "table {}, row {} ({}): {} cell {:?} recorded as 0",
            self.table, self.row, self.player, self.column, self.raw
        )
    }
}

/// One player row as printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub number: String,
    pub name: String,
    pub cells: RawCounts,
}

/// One stat table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoster {
    /// Team label from `<caption>` or `data-team`, if the export has one
    pub label: Option<String>,
    /// 0-based position among the stat tables
    pub position: usize,
    pub rows: Vec<RawRow>,
}

/// Everything read from one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBoxScore {
    pub title: String,
    pub date: NaiveDate,
    pub away_team: String,
    pub away_score: u32,
    pub home_team: String,
    pub home_score: u32,
    pub rosters: Vec<RawRoster>,
    pub warnings: Vec<CellParseWarning>,
}

static TITLE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)-box-scores.*$").expect("valid title suffix regex"));

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)\s+(\d+)\s+at\s+(.+?)\s+(\d+)\b").expect("valid title regex")
});

static NAME_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*(\d+)\s+(.+)$").expect("valid name cell regex"));

static DATE_IN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4}|\d{4}-\d{2}-\d{2}|[A-Za-z]{3,9}\s+\d{1,2},\s*\d{4}",
    )
    .expect("valid date regex")
});

static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static DETAIL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span.detail").expect("valid selector"));
static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table#stats, table.stats, table[id^=stats]").expect("valid selector")
});
static CAPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("valid selector"));
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static HEADER_CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));
static DATA_CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid selector"));

const DATE_FORMATS: [&str; 4] = ["%d %b %Y", "%d %B %Y", "%Y-%m-%d", "%b %d, %Y"];

/// Parse one export.
///
/// `date_override` replaces whatever date the export carries; without it a
/// missing date is an error.
pub fn extract_box_score(
    html: &str,
    date_override: Option<NaiveDate>,
) -> Result<RawBoxScore, ExtractionError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SEL)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .ok_or(ExtractionError::MissingTitle)?;
    let (away_team, away_score, home_team, home_score) = parse_title(&title)?;

    let date = match date_override {
        Some(date) => {
            debug!("Using date override {}", date);
            date
        }
        None => document
            .select(&DETAIL_SEL)
            .find_map(|span| parse_date(&element_text(span)))
            .ok_or(ExtractionError::MissingDate)?,
    };

    let mut rosters = Vec::new();
    let mut warnings = Vec::new();
    for (position, table) in document.select(&TABLE_SEL).enumerate() {
        let roster = extract_roster(table, position, &mut warnings)?;
        debug!(
            "Table {} ({:?}): {} player rows",
            position + 1,
            roster.label,
            roster.rows.len()
        );
        rosters.push(roster);
    }

    if rosters.is_empty() {
        return Err(ExtractionError::MissingStatsTable);
    }

    Ok(RawBoxScore {
        title,
        date,
        away_team,
        away_score,
        home_team,
        home_score,
        rosters,
        warnings,
    })
}

/// Split a title into (away, away score, home, home score).
pub fn parse_title(title: &str) -> Result<(String, u32, String, u32), ExtractionError> {
    let stripped = TITLE_SUFFIX_RE.replace(title.trim(), "");
    let unrecognized = || ExtractionError::UnrecognizedTitle(title.to_string());

    let caps = TITLE_RE.captures(stripped.trim()).ok_or_else(unrecognized)?;
    let away_score: u32 = caps[2].parse().map_err(|_| unrecognized())?;
    let home_score: u32 = caps[4].parse().map_err(|_| unrecognized())?;

    Ok((
        caps[1].trim().to_string(),
        away_score,
        caps[3].trim().to_string(),
        home_score,
    ))
}

/// Find a date in free text such as `"Final · 16 Dec 2025"`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if let Some(date) = parse_date_exact(text) {
        return Some(date);
    }
    DATE_IN_TEXT_RE
        .find_iter(text)
        .find_map(|m| parse_date_exact(m.as_str()))
}

fn parse_date_exact(text: &str) -> Option<NaiveDate> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_roster(
    table: ElementRef<'_>,
    position: usize,
    warnings: &mut Vec<CellParseWarning>,
) -> Result<RawRoster, ExtractionError> {
    let table_no = position + 1;
    let label = table
        .select(&CAPTION_SEL)
        .next()
        .map(element_text)
        .or_else(|| table.value().attr("data-team").map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty());

    let mut rows = table.select(&ROW_SEL);

    // The first row is always the header, recognised or not.
    let headers: Vec<String> = rows
        .next()
        .map(|tr| tr.select(&HEADER_CELL_SEL).map(element_text).collect())
        .unwrap_or_default();
    let layout = match layout_from_headers(&headers) {
        Some(layout) => layout,
        None => {
            debug!("Table {}: headers not recognised, using positional layout", table_no);
            EASYSTATS_LAYOUT.to_vec()
        }
    };

    let mut out = Vec::new();
    for (idx, tr) in rows.enumerate() {
        let row_no = idx + 2;
        let cells: Vec<String> = tr.select(&DATA_CELL_SEL).map(element_text).collect();
        if cells.len() < 2 {
            continue;
        }

        let name_cell = cells[0].as_str();
        let lowered = name_cell.to_lowercase();
        if lowered.starts_with("total") || lowered.starts_with("team") {
            debug!("Table {}, row {}: skipping totals row", table_no, row_no);
            continue;
        }

        let caps = NAME_CELL_RE
            .captures(name_cell)
            .ok_or_else(|| ExtractionError::MalformedRow {
                table: table_no,
                row: row_no,
                content: name_cell.to_string(),
            })?;
        let number = caps[1].to_string();
        let name = caps[2].trim().to_string();

        let mut counts = RawCounts::default();
        for &(col_idx, column) in &layout {
            let raw = cells.get(col_idx).map(String::as_str).unwrap_or("");
            if counts.set(column, raw).is_err() {
                let warning = CellParseWarning {
                    table: table_no,
                    row: row_no,
                    player: format!("#{} {}", number, name),
                    column,
                    raw: raw.to_string(),
                };
                warn!("{}", warning);
                warnings.push(warning);
            }
        }

        out.push(RawRow {
            number,
            name,
            cells: counts,
        });
    }

    Ok(RawRoster {
        label,
        position,
        rows: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShotLine;
    use pretty_assertions::assert_eq;

    const HEADER: &str = "<tr><th>Player</th><th>FG</th><th>FG%</th><th>3PT</th><th>3PT%</th>\
        <th>FT</th><th>FT%</th><th>OREB</th><th>DREB</th><th>FOUL</th><th>STL</th>\
        <th>TO</th><th>BLK</th><th>ASST</th><th>PTS</th></tr>";

    fn export(title: &str, detail: &str, tables: &str) -> String {
        format!(
            "<html><head><title>{}</title></head><body>\
             <span class=\"detail\">{}</span>{}</body></html>",
            title, detail, tables
        )
    }

    fn smith_row() -> &'static str {
        "<tr><td>#7 J. Smith</td><td>9-15</td><td>60%</td><td>2-5</td><td>40%</td>\
         <td>1-2</td><td>50%</td><td>2</td><td>4</td><td>3</td><td>1</td><td>2</td>\
         <td>0</td><td>5</td><td>21</td></tr>"
    }

    #[test]
    fn test_parse_title() {
        let parsed = parse_title("Opponent 60 at Pretty Good 75").unwrap();
        assert_eq!(
            parsed,
            (
                "Opponent".to_string(),
                60,
                "Pretty Good".to_string(),
                75
            )
        );
    }

    #[test]
    fn test_parse_title_strips_suffix() {
        let parsed = parse_title("Ball Hogs 61 at Pretty-Good 58-box-scores-easystats").unwrap();
        assert_eq!(parsed.0, "Ball Hogs");
        assert_eq!(parsed.2, "Pretty-Good");
        assert_eq!(parsed.3, 58);
    }

    #[test]
    fn test_parse_title_rejects_garbage() {
        let err = parse_title("Box Score").unwrap_err();
        assert_eq!(err, ExtractionError::UnrecognizedTitle("Box Score".to_string()));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 12, 16).unwrap();
        assert_eq!(parse_date("16 Dec 2025"), Some(expected));
        assert_eq!(parse_date("16 December 2025"), Some(expected));
        assert_eq!(parse_date("2025-12-16"), Some(expected));
        assert_eq!(parse_date("Dec 16, 2025"), Some(expected));
        assert_eq!(parse_date("Final  ·  16 Dec 2025 · Gym 2"), Some(expected));
        assert_eq!(parse_date("Final"), None);
    }

    #[test]
    fn test_extract_single_table() {
        let table = format!("<table id=\"stats\">{}{}</table>", HEADER, smith_row());
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", &table);

        let box_score = extract_box_score(&html, None).unwrap();
        assert_eq!(box_score.away_team, "Opponent");
        assert_eq!(box_score.home_score, 75);
        assert_eq!(box_score.date, NaiveDate::from_ymd_opt(2025, 12, 16).unwrap());
        assert_eq!(box_score.rosters.len(), 1);
        assert!(box_score.warnings.is_empty());

        let row = &box_score.rosters[0].rows[0];
        assert_eq!(row.number, "7");
        assert_eq!(row.name, "J. Smith");
        assert_eq!(row.cells.fg, ShotLine::new(9, 15));
        assert_eq!(row.cells.three_pt, ShotLine::new(2, 5));
        assert_eq!(row.cells.ft, ShotLine::new(1, 2));
        assert_eq!(row.cells.oreb, 2);
        assert_eq!(row.cells.dreb, 4);
        assert_eq!(row.cells.reb, None);
        assert_eq!(row.cells.foul, 3);
        assert_eq!(row.cells.asst, 5);
        assert_eq!(row.cells.pts, 21);
    }

    #[test]
    fn test_extract_positional_fallback() {
        let table = format!(
            "<table id=\"stats\"><tr><td></td><td></td></tr>{}</table>",
            smith_row()
        );
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", &table);
        let box_score = extract_box_score(&html, None).unwrap();
        let row = &box_score.rosters[0].rows[0];
        assert_eq!(row.cells.fg, ShotLine::new(9, 15));
        assert_eq!(row.cells.pts, 21);
    }

    #[test]
    fn test_extract_header_mapping_reordered() {
        let table = "<table class=\"stats\"><caption>Ball Hogs</caption>\
            <tr><th>Player</th><th>PTS</th><th>REB</th><th>FG</th></tr>\
            <tr><td>#12 A. Jones</td><td>14</td><td>9</td><td>6-11</td></tr></table>";
        let html = export("Ball Hogs 61 at Pretty Good 58", "3 Jan 2025", table);
        let box_score = extract_box_score(&html, None).unwrap();

        let roster = &box_score.rosters[0];
        assert_eq!(roster.label.as_deref(), Some("Ball Hogs"));
        assert_eq!(roster.rows[0].cells.pts, 14);
        assert_eq!(roster.rows[0].cells.reb, Some(9));
        assert_eq!(roster.rows[0].cells.fg, ShotLine::new(6, 11));
    }

    #[test]
    fn test_extract_dnp_and_totals_rows() {
        let table = format!(
            "<table id=\"stats\">{}{}\
             <tr><td>#3 R. Ogle</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td>\
             <td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td><td>-</td>\
             <td>-</td><td>-</td></tr>\
             <tr><td>Totals</td><td>9-15</td></tr>\
             <tr><td>spacer</td></tr></table>",
            HEADER,
            smith_row()
        );
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", &table);
        let box_score = extract_box_score(&html, None).unwrap();

        let rows = &box_score.rosters[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "R. Ogle");
        assert_eq!(rows[1].cells, RawCounts::default());
        assert!(box_score.warnings.is_empty());
    }

    #[test]
    fn test_extract_bad_cell_warns() {
        let table = format!(
            "<table id=\"stats\">{}<tr><td>#7 J. Smith</td><td>9-15</td><td></td>\
             <td>2-5</td><td></td><td>1-2</td><td></td><td>2</td><td>4</td><td>3</td>\
             <td>1</td><td>2</td><td>0</td><td>five</td><td>21</td></tr></table>",
            HEADER
        );
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", &table);
        let box_score = extract_box_score(&html, None).unwrap();

        assert_eq!(box_score.rosters[0].rows[0].cells.asst, 0);
        assert_eq!(
            box_score.warnings,
            vec![CellParseWarning {
                table: 1,
                row: 2,
                player: "#7 J. Smith".to_string(),
                column: Column::Assists,
                raw: "five".to_string(),
            }]
        );
    }

    #[test]
    fn test_extract_malformed_name_cell() {
        let table = format!(
            "<table id=\"stats\">{}<tr><td>J. Smith</td><td>9-15</td></tr></table>",
            HEADER
        );
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", &table);
        let err = extract_box_score(&html, None).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::MalformedRow {
                table: 1,
                row: 2,
                content: "J. Smith".to_string(),
            }
        );
    }

    #[test]
    fn test_extract_missing_date() {
        let table = format!("<table id=\"stats\">{}{}</table>", HEADER, smith_row());
        let html = export("Opponent 60 at Pretty Good 75", "Final", &table);
        assert_eq!(
            extract_box_score(&html, None).unwrap_err(),
            ExtractionError::MissingDate
        );

        let override_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let box_score = extract_box_score(&html, Some(override_date)).unwrap();
        assert_eq!(box_score.date, override_date);
    }

    #[test]
    fn test_extract_missing_table() {
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", "<p>no stats</p>");
        assert_eq!(
            extract_box_score(&html, None).unwrap_err(),
            ExtractionError::MissingStatsTable
        );
    }

    #[test]
    fn test_extract_missing_title() {
        let html = "<html><body></body></html>";
        assert_eq!(
            extract_box_score(html, None).unwrap_err(),
            ExtractionError::MissingTitle
        );
    }

    #[test]
    fn test_extract_two_tables_keep_order() {
        let tables = format!(
            "<table id=\"stats-away\" data-team=\"Opponent\">{}{}</table>\
             <table id=\"stats-home\">{}<tr><td>#4 B. Lee</td><td>1-3</td></tr></table>",
            HEADER,
            smith_row(),
            HEADER
        );
        let html = export("Opponent 60 at Pretty Good 75", "16 Dec 2025", &tables);
        let box_score = extract_box_score(&html, None).unwrap();

        assert_eq!(box_score.rosters.len(), 2);
        assert_eq!(box_score.rosters[0].label.as_deref(), Some("Opponent"));
        assert_eq!(box_score.rosters[0].position, 0);
        assert_eq!(box_score.rosters[1].label, None);
        assert_eq!(box_score.rosters[1].position, 1);
        assert_eq!(box_score.rosters[1].rows[0].name, "B. Lee");
    }
}
