//! HealthMap rendered-map adapter.
//!
//! The HealthMap front page draws outbreak pins with JavaScript. Once rendered,
//! every pin is a `div[title]` inside `section#map_canvas`; its first `<p>`
//! holds the description. The pin marking the viewer's own position
//! ("Your Location") is not an outbreak and is dropped before filtering.
//!
//! Pins carry no date, so each candidate is stamped with the ingestion date.

use super::{SourceAdapter, searchable};
use crate::error::ParseError;
use crate::models::{NOT_AVAILABLE, RawCandidate, UNKNOWN};
use crate::transport::ReadyCondition;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};

static MAP_CANVAS: Lazy<Selector> = Lazy::new(|| Selector::parse("section#map_canvas").unwrap());
static MARKER: Lazy<Selector> = Lazy::new(|| Selector::parse("div[title]").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// The map counts as rendered once the canvas holds at least one pin.
pub static READY: Lazy<ReadyCondition> = Lazy::new(|| {
    ReadyCondition::all_present(["section#map_canvas", "section#map_canvas div[title]"]).unwrap()
});

const OWN_LOCATION: &str = "your location";

#[derive(Debug, Clone, Copy)]
pub struct MapPageAdapter {
    ingested_on: NaiveDate,
}

impl MapPageAdapter {
    pub fn new(ingested_on: NaiveDate) -> Self {
        Self { ingested_on }
    }
}

impl SourceAdapter for MapPageAdapter {
    #[instrument(level = "debug", skip_all, fields(bytes = payload.len()))]
    fn parse(&self, payload: &str) -> Result<Vec<RawCandidate>, ParseError> {
        let document = Html::parse_document(payload);
        let canvas = document
            .select(&MAP_CANVAS)
            .next()
            .ok_or(ParseError::MissingAnchor("section#map_canvas"))?;

        let pub_date = self.ingested_on.format("%Y-%m-%d").to_string();
        let mut candidates = Vec::new();
        let mut skipped = 0usize;

        for marker in canvas.select(&MARKER) {
            let title = marker.value().attr("title").unwrap_or(NOT_AVAILABLE).trim();
            if title.to_lowercase().contains(OWN_LOCATION) {
                skipped += 1;
                continue;
            }
            let description = marker
                .select(&PARAGRAPH)
                .next()
                .map(|p| p.text().collect::<String>().trim().to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string());

            candidates.push(RawCandidate::new(
                searchable([title, description.as_str()]),
                [
                    ("title", title.to_string()),
                    ("description", description),
                    ("location", UNKNOWN.to_string()),
                    ("pubDate", pub_date.clone()),
                ],
            ));
        }

        debug!(count = candidates.len(), skipped, "Parsed map markers");
        Ok(candidates)
    }
}
