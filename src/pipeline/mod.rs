//! Normalization of workbook sheets into pipeline records.

pub mod normalizer;
pub mod stage;

pub use normalizer::{normalize_activities, normalize_prospects, read_data_dictionary};
pub use stage::stage_of;
