//! Data models shared by every pipeline stage.
//!
//! - [`Source`]: the fixed set of upstream origins
//! - [`RawCandidate`]: one parsed item, before relevance filtering
//! - [`Snapshot`]: the per-source raw output of one ingestion run
//! - [`OutbreakMention`]: a record in the unified schema
//! - [`MentionRow`]: a finalized table row with a typed publication date
//!
//! Raw records keep the source-native camelCase field names (`pubDate`) so the
//! snapshot document mirrors what each upstream actually publishes.

use crate::error::RecordError;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Placeholder for a field the source did not report.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder adapters use for a missing key; mapped to [`UNKNOWN`] during normalization.
pub const NOT_AVAILABLE: &str = "N/A";

/// Table marker for a publication date that was present but unparsable.
pub const INVALID_DATE: &str = "Invalid";

/// One upstream origin of outbreak mentions.
///
/// The declaration order is the order sources appear in the snapshot and in
/// the final table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Source {
    #[serde(rename = "WHO")]
    #[value(name = "who")]
    Who,
    #[serde(rename = "CDC")]
    #[value(name = "cdc")]
    Cdc,
    #[serde(rename = "HealthMap")]
    #[value(name = "healthmap")]
    HealthMap,
    #[serde(rename = "Wikipedia")]
    #[value(name = "wikipedia")]
    Wikipedia,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Who, Source::Cdc, Source::HealthMap, Source::Wikipedia];

    /// Sources whose records are merged into the unified table.
    pub const UNIFIED: [Source; 3] = [Source::Who, Source::Cdc, Source::HealthMap];

    pub fn name(self) -> &'static str {
        match self {
            Source::Who => "WHO",
            Source::Cdc => "CDC",
            Source::HealthMap => "HealthMap",
            Source::Wikipedia => "Wikipedia",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Source {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.name() == s)
            .ok_or_else(|| RecordError::UnknownSource(s.to_string()))
    }
}

/// Source-native field name to raw value.
pub type RawRecord = BTreeMap<String, String>;

/// A parsed item from one source, prior to relevance filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    /// Every text field eligible for keyword matching, joined.
    pub searchable_text: String,
    pub fields: RawRecord,
}

impl RawCandidate {
    pub fn new<I, K, V>(searchable_text: String, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            searchable_text,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// One relevance-passing entry of the wiki current-events page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiEvent {
    pub title: String,
    pub link: String,
}

/// The single aggregate record the wiki source contributes to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiAggregate {
    pub source: Source,
    pub title: String,
    pub events: Vec<WikiEvent>,
}

impl WikiAggregate {
    pub const TITLE: &'static str = "Current Outbreak Events";

    pub fn new(events: Vec<WikiEvent>) -> Self {
        Self {
            source: Source::Wikipedia,
            title: Self::TITLE.to_string(),
            events,
        }
    }
}

/// What one source contributes to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceOutput {
    Records(Vec<RawRecord>),
    Aggregate(WikiAggregate),
}

impl SourceOutput {
    /// The degraded result for a source that failed or yielded nothing.
    pub fn empty(source: Source) -> Self {
        match source {
            Source::Wikipedia => SourceOutput::Aggregate(WikiAggregate::new(Vec::new())),
            _ => SourceOutput::Records(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceOutput::Records(records) => records.len(),
            SourceOutput::Aggregate(aggregate) => aggregate.events.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The complete per-source raw output of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<Source, SourceOutput>);

impl Snapshot {
    pub fn insert(&mut self, source: Source, output: SourceOutput) {
        self.0.insert(source, output);
    }

    pub fn get(&self, source: Source) -> Option<&SourceOutput> {
        self.0.get(&source)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A relevance-confirmed record in the unified schema.
///
/// Every text field holds either the reported value or [`UNKNOWN`]; never an
/// absent value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutbreakMention {
    pub source: Source,
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
    pub location: String,
}

/// A publication timestamp, keeping an offset only when the source gave one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubTimestamp {
    Naive(NaiveDateTime),
    Offset(DateTime<FixedOffset>),
}

/// The coerced publication date of a table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PubDate {
    /// The source never reported a date.
    Absent,
    Parsed(PubTimestamp),
    /// A date was reported but could not be parsed; the raw text is kept.
    Invalid(String),
}

impl fmt::Display for PubDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PubDate::Absent => f.write_str(UNKNOWN),
            PubDate::Parsed(PubTimestamp::Naive(ts)) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S")),
            PubDate::Parsed(PubTimestamp::Offset(ts)) => {
                write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%:z"))
            }
            PubDate::Invalid(_) => f.write_str(INVALID_DATE),
        }
    }
}

/// One row of the final table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionRow {
    pub source: Source,
    pub title: String,
    pub description: String,
    pub link: String,
    #[serde(rename = "pubDate", serialize_with = "serialize_display")]
    pub pub_date: PubDate,
    pub location: String,
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
