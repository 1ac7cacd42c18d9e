//! Dashboard queries over the normalized pipeline.

pub mod activity;
pub mod aggregator;

pub use activity::{heat_map, recent_activity};
pub use aggregator::*;
