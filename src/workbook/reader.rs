//! Workbook reading via calamine.
//!
//! The whole workbook is read once into owned [`RawSheet`]s so that the
//! normalizers and aggregators never touch the file again.

use super::cell::Cell;
use crate::error::WorkbookError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

static EMPTY_CELL: Cell = Cell::Empty;

/// A data row with its 1-indexed spreadsheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: usize,
    pub cells: Vec<Cell>,
}

/// A worksheet read as a header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    /// Build a sheet from in-memory headers and rows, numbering rows from 2.
    pub fn new(name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, cells)| RawRow {
                    number: i + 2,
                    cells,
                })
                .collect(),
        }
    }

    fn from_range(name: &str, range: &Range<Data>) -> Self {
        // Range coordinates start at the first used cell, not at A1.
        let first_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(row) => row.iter().map(|c| Cell::from(c).text()).collect(),
            None => Vec::new(),
        };

        let rows = rows_iter
            .enumerate()
            .map(|(i, row)| RawRow {
                number: first_row + i + 1,
                cells: row.iter().map(Cell::from).collect(),
            })
            .filter(|row| row.cells.iter().any(|c| !c.is_blank()))
            .collect();

        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Index of the column with the given header.
    ///
    /// Matches exactly on trimmed text first, then case-insensitively.
    pub fn column(&self, header: &str) -> Option<usize> {
        let wanted = header.trim();
        self.headers
            .iter()
            .position(|h| h.trim() == wanted)
            .or_else(|| {
                let lower = wanted.to_lowercase();
                self.headers
                    .iter()
                    .position(|h| h.trim().to_lowercase() == lower)
            })
    }

    /// Cell at a column of a row; short rows read as empty.
    pub fn cell<'a>(&self, row: &'a RawRow, column: Option<usize>) -> &'a Cell {
        column
            .and_then(|c| row.cells.get(c))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// An opened workbook: every readable sheet, held in memory.
#[derive(Debug, Clone)]
pub struct Workbook {
    path: PathBuf,
    sheets: Vec<RawSheet>,
}

impl Workbook {
    /// Open a workbook and read all of its sheets.
    pub fn open(path: &Path) -> Result<Self, WorkbookError> {
        if !path.exists() {
            return Err(WorkbookError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        info!("Reading workbook: {}", path.display());

        let mut workbook = open_workbook_auto(path).map_err(|e| WorkbookError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            match workbook.worksheet_range(&name) {
                Ok(range) => {
                    let sheet = RawSheet::from_range(&name, &range);
                    debug!(
                        "Sheet '{}': {} columns, {} data rows",
                        name,
                        sheet.headers.len(),
                        sheet.rows.len()
                    );
                    sheets.push(sheet);
                }
                Err(e) => warn!("Skipping unreadable sheet '{}': {}", name, e),
            }
        }

        Ok(Self::from_sheets(path, sheets))
    }

    /// Assemble a workbook from sheets already in memory.
    pub fn from_sheets(path: &Path, sheets: Vec<RawSheet>) -> Self {
        Self {
            path: path.to_path_buf(),
            sheets,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a sheet by exact name.
    pub fn sheet(&self, name: &str) -> Result<&RawSheet, WorkbookError> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| WorkbookError::MissingSheet {
                sheet: name.to_string(),
            })
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}
