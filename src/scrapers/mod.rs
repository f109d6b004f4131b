//! Source adapters: one parser per upstream outbreak source.
//!
//! Every adapter turns a raw payload (already fetched by the transport) into
//! zero or more [`RawCandidate`]s in that source's native field shape. Adapters
//! never filter for relevance and never touch the network.
//!
//! # Supported Sources
//!
//! | Source | Module | Payload | Notes |
//! |--------|--------|---------|-------|
//! | WHO | [`who`] | RSS/Atom XML | One candidate per `item`/`entry` |
//! | CDC | [`cdc`] | JSON media API | Missing keys become `"N/A"` |
//! | HealthMap | [`healthmap`] | Rendered map HTML | Viewer's own location pin is excluded |
//! | Wikipedia | [`wikipedia`] | Current-events HTML | Aggregated into one capped record |
//!
//! A payload whose structural anchor is missing is a [`ParseError`]; the
//! collector logs it and degrades the source to an empty result.

use crate::error::ParseError;
use crate::models::RawCandidate;

pub mod cdc;
pub mod healthmap;
pub mod who;
pub mod wikipedia;

pub trait SourceAdapter {
    fn parse(&self, payload: &str) -> Result<Vec<RawCandidate>, ParseError>;
}

/// Join the non-empty parts with a single space.
pub(crate) fn searchable<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
