//! Per-source collection: fetch, parse, filter, tag.
//!
//! A [`SourceCollector`] owns the whole lifecycle of one source for one run.
//! Whatever goes wrong (transport failure, unexpected payload) is logged with
//! the source and stage and turned into an empty result, so the caller only
//! ever sees a possibly-degraded [`SourceOutput`].

use crate::config::PipelineConfig;
use crate::error::TransportError;
use crate::models::{RawCandidate, Source, SourceOutput};
use crate::relevance::KeywordSet;
use crate::scrapers::cdc::{self, MediaApiAdapter};
use crate::scrapers::healthmap::{self, MapPageAdapter};
use crate::scrapers::who::FeedAdapter;
use crate::scrapers::wikipedia::{self, CurrentEventsAdapter};
use crate::scrapers::SourceAdapter;
use crate::transport::Transport;
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Drives one source through acquire, parse, filter and tag.
///
/// Borrows everything it needs from the orchestrator, so one collector per
/// source per run is cheap to build.
pub struct SourceCollector<'a, T> {
    transport: &'a T,
    config: &'a PipelineConfig,
    keywords: &'a KeywordSet,
    /// Date stamped on sources that publish no date of their own.
    ingested_on: NaiveDate,
}

impl<'a, T: Transport> SourceCollector<'a, T> {
    /// Build a collector for one run.
    ///
    /// # Arguments
    ///
    /// * `transport` - How payloads are fetched or rendered
    /// * `config` - Source URLs, timeouts, delays and the wiki event cap
    /// * `keywords` - The relevance keywords shared by every source
    /// * `ingested_on` - Date stamped on records whose source publishes none
    pub fn new(
        transport: &'a T,
        config: &'a PipelineConfig,
        keywords: &'a KeywordSet,
        ingested_on: NaiveDate,
    ) -> Self {
        Self {
            transport,
            config,
            keywords,
            ingested_on,
        }
    }

    /// Collect one source end to end.
    ///
    /// The source's courtesy delay is applied before returning, whether or not
    /// the source answered.
    ///
    /// # Arguments
    ///
    /// * `source` - Which upstream to collect
    ///
    /// # Returns
    ///
    /// The relevant records (or the wiki aggregate). Never fails; a broken
    /// source yields [`SourceOutput::empty`].
    #[instrument(level = "info", skip_all, fields(%source))]
    pub async fn collect(&self, source: Source) -> SourceOutput {
        let settings = self.config.source(source);
        let output = match Url::parse(&settings.url) {
            Ok(url) => match self.acquire(source, &url).await {
                Ok(payload) => self.process(source, &url, &payload),
                Err(e) => {
                    let stage = if source == Source::HealthMap { "render" } else { "fetch" };
                    error!(%source, stage, url = %settings.url, error = %e, "Source unavailable; continuing without it");
                    SourceOutput::empty(source)
                }
            },
            Err(e) => {
                error!(%source, stage = "fetch", url = %settings.url, error = %e, "Source url is invalid");
                SourceOutput::empty(source)
            }
        };

        if !settings.delay.is_zero() {
            debug!(delay_ms = settings.delay.as_millis() as u64, "Rate-limit pause");
            sleep(settings.delay).await;
        }
        output
    }

    async fn acquire(&self, source: Source, url: &Url) -> Result<String, TransportError> {
        match source {
            Source::HealthMap => {
                self.transport
                    .render_and_wait(url.as_str(), &healthmap::READY, self.config.render_timeout())
                    .await
            }
            Source::Cdc => {
                let url = cdc::request_url(url.as_str()).map_err(|e| TransportError::InvalidUrl {
                    url: url.to_string(),
                    source: e,
                })?;
                self.transport
                    .fetch(url.as_str(), self.config.request_timeout())
                    .await
            }
            Source::Who | Source::Wikipedia => {
                self.transport
                    .fetch(url.as_str(), self.config.request_timeout())
                    .await
            }
        }
    }

    /// Parse `payload` with the source's adapter, keep relevant candidates, and
    /// shape them into the source's snapshot entry.
    ///
    /// # Arguments
    ///
    /// * `source` - Selects the adapter and the output shape
    /// * `page_url` - Base for resolving relative links (wiki only)
    /// * `payload` - Raw body as returned by the transport
    ///
    /// # Returns
    ///
    /// Records tagged with `source`, or the capped wiki aggregate. A payload
    /// that does not parse, or holds no relevant item, yields the empty shape.
    pub fn process(&self, source: Source, page_url: &Url, payload: &str) -> SourceOutput {
        let parsed = match source {
            Source::Who => FeedAdapter.parse(payload),
            Source::Cdc => MediaApiAdapter.parse(payload),
            Source::HealthMap => MapPageAdapter::new(self.ingested_on).parse(payload),
            Source::Wikipedia => CurrentEventsAdapter::new(page_url.clone()).parse(payload),
        };
        let candidates = match parsed {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(
                    %source,
                    stage = "parse",
                    error = %e,
                    payload_preview = %truncate_for_log(payload, 200),
                    "Payload not in the expected shape; source yields nothing"
                );
                return SourceOutput::empty(source);
            }
        };

        let parsed_count = candidates.len();
        let relevant: Vec<RawCandidate> = candidates
            .into_iter()
            .filter(|c| self.keywords.is_relevant(&c.searchable_text))
            .collect();
        info!(%source, parsed = parsed_count, relevant = relevant.len(), "Filtered candidates");

        match source {
            Source::Wikipedia => {
                SourceOutput::Aggregate(wikipedia::aggregate(relevant, self.config.wiki_event_cap))
            }
            _ => SourceOutput::Records(
                relevant
                    .into_iter()
                    .map(|c| {
                        let mut record = c.fields;
                        record.insert("source".to_string(), source.name().to_string());
                        record
                    })
                    .collect(),
            ),
        }
    }
}
