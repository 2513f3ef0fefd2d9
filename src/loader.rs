use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::LoadError;
use crate::pipeline::SurvivalPipeline;
use crate::record::{Pclass, Port, Record, Sex};
use crate::saving;

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    passenger_id: Option<usize>,
    name: Option<usize>,
    survived: usize,
    pclass: usize,
    sex: usize,
    age: usize,
    embarked: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Result<Self, LoadError> {
        let find = |name: &str| header.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        let require = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));
        Ok(Columns {
            passenger_id: find("PassengerId"),
            name: find("Name"),
            survived: require("Survived")?,
            pclass: require("Pclass")?,
            sex: require("Sex")?,
            age: require("Age")?,
            embarked: require("Embarked")?,
        })
    }

    fn width(&self) -> usize {
        [self.survived, self.pclass, self.sex, self.age, self.embarked]
            .into_iter()
            .chain(self.passenger_id)
            .chain(self.name)
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// A row problem found while parsing, tied to its line in the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub line: usize,
    pub message: String,
    /// Whether the row was dropped, or kept with the field as unknown.
    pub skipped: bool,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Parses the Titanic CSV layout into records.
///
/// Empty cells are absent values. Rows whose survival flag, class or sex
/// cannot be read are skipped with a warning; an unreadable age or port is
/// kept as unknown. Category codes match the dataset spelling exactly
/// (`male`, `female`, `C`, `Q`, `S`), so `Male` skips the row and `s` is an
/// unknown port.
pub fn parse_records(text: &str) -> Result<Vec<Record>, LoadError> {
    let (records, issues) = parse_records_with_issues(text)?;
    for issue in &issues {
        warn!("{}", issue);
    }
    let skipped = issues.iter().filter(|issue| issue.skipped).count();
    if skipped > 0 {
        warn!("skipped {} malformed rows", skipped);
    }
    Ok(records)
}

/// Like [`parse_records`], but hands the row problems back instead of logging them.
pub fn parse_records_with_issues(text: &str) -> Result<(Vec<Record>, Vec<RowIssue>), LoadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next().ok_or(LoadError::Empty)?;
    let columns = Columns::from_header(&parse_csv_row(header_line.trim_start_matches('\u{feff}')))?;
    let width = columns.width();

    let mut records = Vec::new();
    let mut issues = Vec::new();
    for (index, line) in lines {
        let line_no = index + 1;
        let fields = parse_csv_row(line);
        if fields.len() < width {
            issues.push(RowIssue {
                line: line_no,
                message: format!("expected at least {} fields, found {}", width, fields.len()),
                skipped: true,
            });
            continue;
        }
        let row = RowContext {
            line: line_no,
            fallback_id: records.len() as u32 + 1,
        };
        if let Some(record) = parse_row(&columns, &fields, row, &mut issues) {
            records.push(record);
        }
    }
    Ok((records, issues))
}

#[derive(Debug, Clone, Copy)]
struct RowContext {
    line: usize,
    /// Passenger id used when the file has no readable `PassengerId`.
    fallback_id: u32,
}

fn parse_row(
    columns: &Columns,
    fields: &[String],
    row: RowContext,
    issues: &mut Vec<RowIssue>,
) -> Option<Record> {
    let field = |index: usize| fields[index].trim();
    let mut note = |message: String, skipped: bool| {
        issues.push(RowIssue {
            line: row.line,
            message,
            skipped,
        })
    };

    let survived = match field(columns.survived) {
        "1" | "1.0" | "true" | "True" => Some(true),
        "0" | "0.0" | "false" | "False" => Some(false),
        _ => None,
    };
    let pclass = Pclass::from_code(field(columns.pclass));
    let sex = Sex::from_code(field(columns.sex));
    let (Some(survived), Some(pclass), Some(sex)) = (survived, pclass, sex) else {
        note(String::from("unreadable survival flag, class or sex"), true);
        return None;
    };

    let age = match field(columns.age) {
        "" => None,
        raw => match raw.parse::<f64>() {
            Ok(age) if age.is_finite() && age >= 0.0 => Some(age),
            _ => {
                note(format!("ignoring age '{}'", raw), false);
                None
            }
        },
    };
    let embarked = match field(columns.embarked) {
        "" => None,
        raw => {
            let port = Port::from_code(raw);
            if port.is_none() {
                note(format!("ignoring port '{}'", raw), false);
            }
            port
        }
    };

    let passenger_id = columns
        .passenger_id
        .and_then(|index| field(index).parse().ok())
        .unwrap_or(row.fallback_id);
    let name = columns
        .name
        .map(|index| field(index).to_string())
        .unwrap_or_default();

    Some(Record {
        passenger_id,
        name,
        survived,
        pclass,
        sex,
        age,
        embarked,
    })
}

// Parse a CSV row into a vector of strings
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Doubled quote inside a quoted field
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                result.push(std::mem::take(&mut current_field));
            }
            '\r' if !in_quotes => {}
            _ => current_field.push(c),
        }
    }

    result.push(current_field);
    result
}

/// Load records from a CSV file
pub fn from_csv(filepath: impl AsRef<Path>) -> Result<Vec<Record>, LoadError> {
    let path = filepath.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&text)
}

/// Detect file type and load appropriate format
///
/// `.csv` files are parsed, `.gz` files are read as record snapshots written
/// by [`saving::save_records`].
pub fn read_dataset(filepath: impl AsRef<Path>) -> Result<Vec<Record>, LoadError> {
    let path = filepath.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(path),
        Some("gz") => saving::load_records(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        }),
        Some(ext) => Err(LoadError::UnsupportedFormat(ext.to_string())),
        None => Err(LoadError::UnsupportedFormat(String::new())),
    }
}

/// Reads the dataset off the async runtime and pushes it into the pipeline.
///
/// On success the record store receives exactly one write; on failure it
/// receives none and the error is handed back to the caller.
pub async fn load_dataset(
    pipeline: &SurvivalPipeline,
    filepath: impl AsRef<Path>,
) -> Result<usize, LoadError> {
    let path: PathBuf = filepath.as_ref().to_path_buf();
    let task_path = path.clone();
    let records = tokio::task::spawn_blocking(move || read_dataset(&task_path)).await??;
    let count = records.len();
    info!("loaded {} records from {}", count, path.display());
    pipeline.load(records);
    Ok(count)
}
