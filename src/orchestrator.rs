//! Ingestion orchestrator: runs every enabled source collector and assembles
//! the run's [`Snapshot`].
//!
//! Collectors are driven through a `futures` stream with at most
//! `max_concurrent_sources` in flight (one by default, i.e. strictly
//! sequential). Each collector hands back its own `(source, output)` pair and
//! only this module writes into the snapshot, one slot per source.

use crate::collector::SourceCollector;
use crate::config::PipelineConfig;
use crate::models::{Snapshot, Source, SourceOutput};
use crate::relevance::KeywordSet;
use crate::transport::Transport;
use chrono::{Local, NaiveDate};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Owns the transport and the shared, read-only configuration for a run.
pub struct IngestionOrchestrator<T> {
    transport: T,
    config: Arc<PipelineConfig>,
    keywords: KeywordSet,
}

impl<T: Transport> IngestionOrchestrator<T> {
    /// # Arguments
    ///
    /// * `transport` - Used by every collector of every run
    /// * `config` - Validated configuration; the keyword set is built from it once
    pub fn new(transport: T, config: Arc<PipelineConfig>) -> Self {
        let keywords = config.keyword_set();
        Self {
            transport,
            config,
            keywords,
        }
    }

    /// Collect every source in `enabled`, dated today.
    ///
    /// # Arguments
    ///
    /// * `enabled` - Sources to collect, usually [`PipelineConfig::enabled_sources`]
    ///
    /// # Returns
    ///
    /// A [`Snapshot`] with exactly one entry per enabled source. Failed sources
    /// are present with an empty output.
    pub async fn run(&self, enabled: &[Source]) -> Snapshot {
        self.run_on(enabled, Local::now().date_naive()).await
    }

    /// Collect every source in `enabled` with an explicit ingestion date.
    ///
    /// Sources not listed are absent from the snapshot. The result does not
    /// depend on `max_concurrent_sources`.
    #[instrument(level = "info", skip_all, fields(sources = enabled.len()))]
    pub async fn run_on(&self, enabled: &[Source], ingested_on: NaiveDate) -> Snapshot {
        let t0 = Instant::now();
        let collector = SourceCollector::new(&self.transport, &self.config, &self.keywords, ingested_on);
        let collector = &collector;

        let results: Vec<(Source, SourceOutput)> = stream::iter(enabled.iter().copied())
            .map(move |source| async move { (source, collector.collect(source).await) })
            .buffer_unordered(self.config.max_concurrent_sources.max(1))
            .collect()
            .await;

        let mut snapshot = Snapshot::default();
        for (source, output) in results {
            info!(%source, records = output.len(), "Source collected");
            snapshot.insert(source, output);
        }

        info!(
            sources = snapshot.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Ingestion run complete"
        );
        snapshot
    }
}
