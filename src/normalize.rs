//! Snapshot to unified schema.
//!
//! Records from WHO, CDC and HealthMap are already close to the unified shape;
//! they are mapped field by field with [`UNKNOWN`] standing in for anything
//! absent (including the adapters' `"N/A"` placeholder). The Wikipedia
//! aggregate is a list of bare event strings without description or date and
//! is left out of the unified table.

use crate::error::RecordError;
use crate::models::{NOT_AVAILABLE, OutbreakMention, RawRecord, Snapshot, Source, SourceOutput, UNKNOWN};
use tracing::{debug, info, instrument, warn};

/// Flatten a snapshot into unified mentions, in source order then record order.
///
/// Pure: the same snapshot always yields the same mentions.
#[instrument(level = "info", skip_all)]
pub fn normalize(snapshot: &Snapshot) -> Vec<OutbreakMention> {
    let mut mentions = Vec::new();

    for source in Source::UNIFIED {
        match snapshot.get(source) {
            Some(SourceOutput::Records(records)) => {
                for (index, record) in records.iter().enumerate() {
                    match to_mention(source, record) {
                        Ok(mention) => mentions.push(mention),
                        Err(e) => {
                            warn!(%source, stage = "normalize", index, error = %e, "Dropping record")
                        }
                    }
                }
            }
            Some(SourceOutput::Aggregate(_)) => {
                warn!(%source, stage = "normalize", "Unexpected aggregate entry; skipping source")
            }
            None => debug!(%source, "Source absent from snapshot"),
        }
    }

    if let Some(wiki) = snapshot.get(Source::Wikipedia) {
        debug!(events = wiki.len(), "Wikipedia events are not merged into the unified table");
    }

    info!(count = mentions.len(), "Normalized mentions");
    mentions
}

/// Map one raw record to the unified schema.
///
/// The record's own `source` tag wins over the snapshot slot it sits in.
///
/// # Arguments
///
/// * `slot` - The snapshot key the record was found under
/// * `record` - Source-native field name to raw value
///
/// # Errors
///
/// [`RecordError::UnknownSource`] for a tag outside the known sources,
/// [`RecordError::NotUnified`] for a tag naming a source that is kept out of
/// the unified table.
pub fn to_mention(slot: Source, record: &RawRecord) -> Result<OutbreakMention, RecordError> {
    let source = match record.get("source") {
        Some(name) => name.parse()?,
        None => slot,
    };
    if !Source::UNIFIED.contains(&source) {
        return Err(RecordError::NotUnified(source));
    }
    Ok(OutbreakMention {
        source,
        title: field(record, "title"),
        description: field(record, "description"),
        link: field(record, "link"),
        pub_date: field(record, "pubDate"),
        location: field(record, "location"),
    })
}

fn field(record: &RawRecord, key: &str) -> String {
    match record.get(key).map(String::as_str) {
        None | Some(NOT_AVAILABLE) => UNKNOWN.to_string(),
        Some(value) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WikiAggregate;
    use crate::models::WikiEvent;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.insert(
            Source::Who,
            SourceOutput::Records(vec![record(&[
                ("source", "WHO"),
                ("title", "New Ebola outbreak reported"),
                ("description", "Health officials confirm cases."),
                ("link", "https://www.who.int/ebola"),
                ("pubDate", "Mon, 06 Jan 2025 10:00:00 GMT"),
            ])]),
        );
        snapshot.insert(
            Source::Cdc,
            SourceOutput::Records(vec![record(&[
                ("source", "CDC"),
                ("title", "Measles outbreak"),
                ("link", "N/A"),
                ("pubDate", "2025-01-05T08:00:00Z"),
            ])]),
        );
        snapshot.insert(
            Source::Wikipedia,
            SourceOutput::Aggregate(WikiAggregate::new(vec![WikiEvent {
                title: "Mpox outbreak declared".into(),
                link: "N/A".into(),
            }])),
        );
        snapshot
    }

    #[test]
    fn test_unified_sources_in_order() {
        let mentions = normalize(&snapshot());
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].source, Source::Who);
        assert_eq!(mentions[0].title, "New Ebola outbreak reported");
        assert_eq!(mentions[0].location, "Unknown");
        assert_eq!(mentions[1].source, Source::Cdc);
    }

    #[test]
    fn test_missing_description_becomes_unknown() {
        let mentions = normalize(&snapshot());
        let cdc = &mentions[1];
        assert_eq!(cdc.description, "Unknown");
        assert_eq!(cdc.link, "Unknown");
        assert_eq!(cdc.pub_date, "2025-01-05T08:00:00Z");
    }

    #[test]
    fn test_empty_string_is_not_absent() {
        let mention = to_mention(Source::Who, &record(&[("title", "")])).unwrap();
        assert_eq!(mention.title, "");
        assert_eq!(mention.description, "Unknown");
        assert_eq!(mention.source, Source::Who);
    }

    #[test]
    fn test_wikipedia_is_not_merged() {
        let mentions = normalize(&snapshot());
        assert!(mentions.iter().all(|m| m.source != Source::Wikipedia));
    }

    #[test]
    fn test_unknown_source_fails_only_that_record() {
        let mut snapshot = Snapshot::default();
        snapshot.insert(
            Source::HealthMap,
            SourceOutput::Records(vec![
                record(&[("source", "Rumor Mill"), ("title", "Virus")]),
                record(&[("source", "HealthMap"), ("title", "Dengue - Brazil")]),
            ]),
        );
        let mentions = normalize(&snapshot);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].title, "Dengue - Brazil");
    }

    #[test]
    fn test_wikipedia_tag_in_unified_slot_is_dropped() {
        let mut snapshot = Snapshot::default();
        snapshot.insert(
            Source::Cdc,
            SourceOutput::Records(vec![
                record(&[("source", "Wikipedia"), ("title", "Mpox outbreak declared")]),
                record(&[("source", "CDC"), ("title", "Measles outbreak")]),
            ]),
        );
        let mentions = normalize(&snapshot);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].source, Source::Cdc);
        assert_eq!(
            to_mention(Source::Cdc, &record(&[("source", "Wikipedia")])),
            Err(RecordError::NotUnified(Source::Wikipedia))
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let snapshot = snapshot();
        assert_eq!(normalize(&snapshot), normalize(&snapshot));
    }
}
