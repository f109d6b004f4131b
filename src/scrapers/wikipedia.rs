//! Wikipedia current-events adapter.
//!
//! Every `<li>` under a `div.current-events-content.description` container is
//! a candidate, with no structural pre-filter. The source's snapshot entry is a
//! single [`WikiAggregate`] holding the first relevance-passing events in
//! document order; see [`aggregate`].

use super::SourceAdapter;
use crate::error::ParseError;
use crate::models::{NOT_AVAILABLE, RawCandidate, WikiAggregate, WikiEvent};
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.current-events-content.description").unwrap());
static EVENT: Lazy<Selector> = Lazy::new(|| Selector::parse("li").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

#[derive(Debug, Clone)]
pub struct CurrentEventsAdapter {
    page_url: Url,
}

impl CurrentEventsAdapter {
    /// `page_url` is the page the payload came from; relative links resolve against it.
    pub fn new(page_url: Url) -> Self {
        Self { page_url }
    }
}

impl SourceAdapter for CurrentEventsAdapter {
    #[instrument(level = "debug", skip_all, fields(bytes = payload.len()))]
    fn parse(&self, payload: &str) -> Result<Vec<RawCandidate>, ParseError> {
        let document = Html::parse_document(payload);
        let mut containers = document.select(&CONTAINER).peekable();
        if containers.peek().is_none() {
            return Err(ParseError::MissingAnchor("div.current-events-content.description"));
        }

        let mut candidates = Vec::new();
        for container in containers {
            for event in container.select(&EVENT) {
                let title = collapse_whitespace(&event.text().collect::<String>());
                let link = event
                    .select(&LINK)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| self.page_url.join(href).ok())
                    .map(String::from)
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string());

                candidates.push(RawCandidate::new(
                    title.clone(),
                    [("title", title), ("link", link)],
                ));
            }
        }

        debug!(count = candidates.len(), "Parsed current events");
        Ok(candidates)
    }
}

/// Fold relevance-passing candidates into the source's single aggregate record,
/// keeping at most `cap` events in document order.
pub fn aggregate(relevant: Vec<RawCandidate>, cap: usize) -> WikiAggregate {
    let events = relevant
        .into_iter()
        .take(cap)
        .map(|c| WikiEvent {
            title: c.field("title").unwrap_or(NOT_AVAILABLE).to_string(),
            link: c.field("link").unwrap_or(NOT_AVAILABLE).to_string(),
        })
        .collect();
    WikiAggregate::new(events)
}
