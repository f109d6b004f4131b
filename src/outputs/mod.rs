//! Sinks for the two artifacts of a run.
//!
//! - [`json`]: the raw [`Snapshot`](crate::models::Snapshot), keyed by source
//! - [`csv`]: the final deduplicated table
//!
//! ```text
//! raw_data.json    # {"WHO": [...], "CDC": [...], "HealthMap": [...], "Wikipedia": {...}}
//! clean_data.csv   # source,title,description,link,pubDate,location
//! ```
//!
//! A write failure here is fatal for the run.

pub mod csv;
pub mod json;
