//! Workbook access.
//!
//! Reads the pipeline workbook into memory and exposes its sheets as
//! header-indexed tables of typed cells.

pub mod cell;
pub mod reader;

pub use cell::Cell;
pub use reader::{RawRow, RawSheet, Workbook};

/// Sheet holding corporate sponsorship prospects.
pub const SPONSORSHIP_SHEET: &str = "Sponsorships";
/// Sheet holding public investment prospects.
pub const PUBLIC_INVESTMENT_SHEET: &str = "Public Investment";
/// Sheet holding the contact-activity log.
pub const CONTACT_DETAIL_SHEET: &str = "Contact Detail";
/// Sheet holding field definitions.
pub const DATA_DICTIONARY_SHEET: &str = "Data_Dictionary";
