//! Error types for workbook loading and data-quality reporting.
//!
//! Fatal problems (the workbook or a required sheet is gone) are
//! [`WorkbookError`]s. Everything that only degrades a field or a row is a
//! [`DataIssue`]: it is logged, collected, and never stops a render.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors while opening the workbook or locating a sheet.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkbookError {
    /// The workbook path does not exist.
    #[error("Workbook not found: {}", path.display())]
    MissingFile { path: PathBuf },

    /// The file exists but could not be read as a workbook.
    #[error("Failed to read workbook {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    /// A required sheet is absent. Only views built on it are lost.
    #[error("Sheet '{sheet}' not found in workbook")]
    MissingSheet { sheet: String },
}

/// Non-fatal data-quality problems found while normalizing sheets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataIssue {
    /// An optional column is absent; the field defaults to empty/zero.
    #[error("Sheet '{sheet}': column '{column}' not found, using defaults")]
    MissingColumn { sheet: String, column: String },

    /// A column the views rely on is absent; the field is left empty/zero.
    #[error("Sheet '{sheet}': required column '{column}' not found, values will be empty")]
    MissingRequiredColumn { sheet: String, column: String },

    /// A date or numeric cell could not be parsed.
    #[error("Sheet '{sheet}' row {row}: could not parse '{value}' in column '{column}'")]
    UnparseableValue {
        sheet: String,
        /// 1-indexed spreadsheet row (the header is row 1).
        row: usize,
        column: String,
        value: String,
    },
}
