//! Tabular import/export: player rosters and fixture lists as CSV with a header row.
//!
//! Header names are matched case-insensitively with spaces, dashes and underscores
//! ignored, so "Mobile Number", "mobile_number" and "mobilenumber" are the same column.

use crate::logic::fixtures::same_pair;
use crate::logic::{add_players_bulk, ImportReport, NewPlayer};
use crate::models::{FixturePairing, GameMatch, TournamentState};
use serde::Serialize;
use std::io::{Read, Write};

/// Errors that stop an import or export as a whole (individual bad rows only warn).
#[derive(Debug)]
pub enum CsvError {
    Csv(csv::Error),
    /// A required column is absent from the header row.
    MissingColumn(&'static str),
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvError::Csv(e) => write!(f, "CSV error: {}", e),
            CsvError::MissingColumn(column) => write!(f, "Missing column '{}'", column),
        }
    }
}

impl std::error::Error for CsvError {}

impl From<csv::Error> for CsvError {
    fn from(e: csv::Error) -> Self {
        CsvError::Csv(e)
    }
}

fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Column positions resolved from the header row.
struct Columns {
    headers: Vec<String>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        Self {
            headers: headers.iter().map(normalize_header).collect(),
        }
    }

    fn find(&self, aliases: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| aliases.contains(&h.as_str()))
    }

    fn require(&self, name: &'static str, aliases: &[&str]) -> Result<usize, CsvError> {
        self.find(aliases).ok_or(CsvError::MissingColumn(name))
    }
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
}

fn reader_for<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input)
}

/// Parse a roster. Columns: name, mobile number, rating (optional), category (optional).
///
/// Rows without a name or mobile number, or with an unreadable rating, are skipped
/// and reported in the returned report.
pub fn parse_roster<R: Read>(input: R) -> Result<(Vec<NewPlayer>, ImportReport), CsvError> {
    let mut rdr = reader_for(input);
    let columns = Columns::new(rdr.headers()?);
    let name_col = columns.require("name", &["name", "playername"])?;
    let mobile_col = columns.require("mobile number", &["mobilenumber", "mobile", "phone", "phonenumber"])?;
    let rating_col = columns.find(&["rating"]);
    let category_col = columns.find(&["category"]);

    let mut players = Vec::new();
    let mut report = ImportReport::default();
    for (i, record) in rdr.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                report.warn(format!("Row {}: unreadable ({})", line, e));
                continue;
            }
        };
        let name = field(&record, Some(name_col));
        let mobile = field(&record, Some(mobile_col));
        if name.is_empty() {
            report.warn(format!("Row {}: missing name", line));
            continue;
        }
        if mobile.is_empty() {
            report.warn(format!("Row {}: missing mobile number for '{}'", line, name));
            continue;
        }
        let rating = match field(&record, rating_col) {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(r) if r.is_finite() => Some(r),
                _ => {
                    report.warn(format!("Row {}: invalid rating '{}' for '{}'", line, raw, name));
                    continue;
                }
            },
        };
        players.push(NewPlayer {
            name: name.to_string(),
            mobile: mobile.to_string(),
            rating,
            category: field(&record, category_col).to_string(),
            image: None,
        });
    }
    Ok((players, report))
}

/// Parse a roster and register every valid row.
pub fn import_roster<R: Read>(state: &mut TournamentState, input: R) -> Result<ImportReport, CsvError> {
    let (players, mut report) = parse_roster(input)?;
    let added = add_players_bulk(state, players);
    report.added = added.added;
    report.warnings.extend(added.warnings);
    log::info!(
        "Roster import: {} added, {} warning(s)",
        report.added,
        report.warnings.len()
    );
    Ok(report)
}

/// Parse a fixture list. Columns: player1, player2, round, category (optional), group (optional).
///
/// Players are looked up by name in the registry; rows naming unknown players are
/// skipped with a warning.
pub fn parse_fixtures<R: Read>(
    state: &TournamentState,
    input: R,
) -> Result<(Vec<FixturePairing>, ImportReport), CsvError> {
    let mut rdr = reader_for(input);
    let columns = Columns::new(rdr.headers()?);
    let p1_col = columns.require("player1", &["player1"])?;
    let p2_col = columns.require("player2", &["player2"])?;
    let round_col = columns.require("round", &["round"])?;
    let category_col = columns.find(&["category"]);
    let group_col = columns.find(&["group"]);

    let mut pairings = Vec::new();
    let mut report = ImportReport::default();
    for (i, record) in rdr.records().enumerate() {
        let line = i + 2;
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                report.warn(format!("Row {}: unreadable ({})", line, e));
                continue;
            }
        };
        let name_1 = field(&record, Some(p1_col));
        let name_2 = field(&record, Some(p2_col));
        let (Some(p1), Some(p2)) = (state.find_player_by_name(name_1), state.find_player_by_name(name_2)) else {
            report.warn(format!(
                "Row {}: unknown player in '{}' vs '{}'",
                line, name_1, name_2
            ));
            continue;
        };
        if p1.id == p2.id {
            report.warn(format!("Row {}: '{}' cannot play themselves", line, name_1));
            continue;
        }
        let slot = match field(&record, Some(round_col)).parse::<u32>() {
            Ok(r) if r > 0 => r,
            _ => {
                report.warn(format!("Row {}: invalid round", line));
                continue;
            }
        };
        let optional = |idx| Some(field(&record, idx).to_string()).filter(|s| !s.is_empty());
        let pairing = FixturePairing {
            player_1: p1.id,
            player_2: p2.id,
            slot,
            category: optional(category_col),
            group: optional(group_col),
        };
        if pairings
            .iter()
            .any(|f: &FixturePairing| f.category == pairing.category && same_pair(f, &pairing))
        {
            report.warn(format!(
                "Row {}: '{}' vs '{}' is already scheduled",
                line, name_1, name_2
            ));
            continue;
        }
        pairings.push(pairing);
        report.added += 1;
    }
    Ok((pairings, report))
}

/// CSV row shape shared by import and export.
#[derive(Serialize)]
struct FixtureRecord<'a> {
    player1: &'a str,
    player2: &'a str,
    round: u32,
    category: &'a str,
    group: &'a str,
}

const FIXTURE_HEADER: [&str; 5] = ["player1", "player2", "round", "category", "group"];

/// Writer with the header row already written, so an empty export still has it.
fn fixture_writer<W: Write>(output: W) -> Result<csv::Writer<W>, CsvError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);
    wtr.write_record(FIXTURE_HEADER)?;
    Ok(wtr)
}

/// Write matches in the fixture import shape.
pub fn export_matches<'a, W: Write>(
    state: &TournamentState,
    matches: impl IntoIterator<Item = &'a GameMatch>,
    output: W,
) -> Result<(), CsvError> {
    let mut wtr = fixture_writer(output)?;
    for m in matches {
        wtr.serialize(FixtureRecord {
            player1: state.player_name(m.player_1),
            player2: state.player_name(m.player_2),
            round: m.round,
            category: m.category.as_deref().unwrap_or(""),
            group: m.group.as_deref().unwrap_or(""),
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write cached pairings in the fixture import shape (slot as round).
pub fn export_pairings<'a, W: Write>(
    state: &TournamentState,
    pairings: impl IntoIterator<Item = &'a FixturePairing>,
    output: W,
) -> Result<(), CsvError> {
    let mut wtr = fixture_writer(output)?;
    for f in pairings {
        wtr.serialize(FixtureRecord {
            player1: state.player_name(f.player_1),
            player2: state.player_name(f.player_2),
            round: f.slot,
            category: f.category.as_deref().unwrap_or(""),
            group: f.group.as_deref().unwrap_or(""),
        })?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}
