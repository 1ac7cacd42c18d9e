//! Owned cell values and lenient coercions.
//!
//! Source spreadsheets are hand-maintained, so a numeric column may hold
//! "$12,500", a date column may hold a serial number or "3/14/2025", and a
//! flag column may hold "x", "Yes" or `TRUE`. Coercions here return
//! `Ok(None)` for blank cells and `Err(raw)` for text that cannot be read.

use calamine::Data;
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Largest serial Excel accepts (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%d-%b-%Y", "%B %d, %Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

const TRUE_FLAGS: &[&str] = &["x", "1", "true", "yes", "y"];

/// A single cell as read from a worksheet.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => {
                if s.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(s.clone())
                }
            }
            Data::Float(n) => Cell::Number(*n),
            Data::Int(n) => Cell::Number(*n as f64),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                excel_serial_to_date(serial)
                    .map(Cell::Date)
                    .unwrap_or(Cell::Number(serial))
            }
            Data::DateTimeIso(s) => parse_date_text(s)
                .map(Cell::Date)
                .unwrap_or_else(|| Cell::Text(s.clone())),
            Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        }
    }
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Display text of the cell, trimmed. Whole numbers print without decimals.
    pub fn text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Read the cell as a number. Text may carry `$`, `,` and `%` decorations.
    pub fn number(&self) -> Result<Option<f64>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(n) => Ok(Some(*n)),
            Cell::Bool(_) | Cell::Date(_) => Err(self.text()),
            Cell::Text(s) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
                    .collect();
                if cleaned.is_empty() {
                    return Ok(None);
                }
                cleaned
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(Some)
                    .ok_or_else(|| s.trim().to_string())
            }
        }
    }

    /// Read the cell as a calendar date. Numbers are taken as Excel serials.
    pub fn date(&self) -> Result<Option<NaiveDate>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Date(d) => Ok(Some(*d)),
            Cell::Number(n) => excel_serial_to_date(*n)
                .map(Some)
                .ok_or_else(|| self.text()),
            Cell::Bool(_) => Err(self.text()),
            Cell::Text(s) => parse_date_text(s).map(Some).ok_or_else(|| s.trim().to_string()),
        }
    }

    /// Whether a stage-flag cell is set.
    pub fn is_flag(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Number(n) => *n != 0.0,
            Cell::Text(s) => TRUE_FLAGS.contains(&s.trim().to_lowercase().as_str()),
            Cell::Empty | Cell::Date(_) => false,
        }
    }
}

/// Convert an Excel 1900-system serial to a date, dropping the time of day.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}
