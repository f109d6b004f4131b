//! Deduplication and publication-date coercion.
//!
//! Exact duplicates are collapsed first (first occurrence wins, order kept),
//! then every row's `pubDate` is parsed on its own. A date that will not parse
//! becomes [`PubDate::Invalid`]; the row itself always survives.
//!
//! Coercion can make distinct raw rows render identically (two unparsable
//! dates both print `Invalid`, one instant written in two formats prints the
//! same timestamp), so rows are collapsed once more on their rendered cells.

use crate::models::{MentionRow, NOT_AVAILABLE, OutbreakMention, PubDate, PubTimestamp, Source, UNKNOWN};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use itertools::Itertools;
use tracing::{debug, info, instrument};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Turn unified mentions into the final table.
///
/// # Arguments
///
/// * `mentions` - Normalized mentions in snapshot order, duplicates included
///
/// # Returns
///
/// One [`MentionRow`] per distinct row, in first-occurrence order. No two
/// returned rows render to the same table line.
#[instrument(level = "info", skip_all, fields(input = mentions.len()))]
pub fn finalize(mentions: Vec<OutbreakMention>) -> Vec<MentionRow> {
    let input = mentions.len();

    let rows: Vec<MentionRow> = mentions
        .into_iter()
        .unique()
        .map(coerce)
        .unique_by(rendered_key)
        .collect();
    let invalid = rows
        .iter()
        .filter(|r| matches!(r.pub_date, PubDate::Invalid(_)))
        .count();

    info!(
        rows = rows.len(),
        duplicates = input - rows.len(),
        invalid_dates = invalid,
        "Finalized table"
    );
    rows
}

type RenderedRow = (Source, String, String, String, String, String);

fn rendered_key(row: &MentionRow) -> RenderedRow {
    (
        row.source,
        row.title.clone(),
        row.description.clone(),
        row.link.clone(),
        row.pub_date.to_string(),
        row.location.clone(),
    )
}

fn coerce(mention: OutbreakMention) -> MentionRow {
    let pub_date = parse_pub_date(&mention.pub_date);
    if let PubDate::Invalid(raw) = &pub_date {
        debug!(source = %mention.source, stage = "coerce", raw = %raw, "Unparsable pubDate");
    }
    MentionRow {
        source: mention.source,
        title: mention.title,
        description: mention.description,
        link: mention.link,
        pub_date,
        location: mention.location,
    }
}

/// Parse a raw publication date.
///
/// RFC 2822 and RFC 3339 keep their offset; `YYYY-MM-DD[ T]HH:MM:SS[.f]` and
/// bare `YYYY-MM-DD` carry none and stay naive.
///
/// # Arguments
///
/// * `raw` - The unified `pub_date` text, surrounding whitespace ignored
///
/// # Returns
///
/// [`PubDate::Absent`] for the `Unknown` / `N/A` sentinels, [`PubDate::Parsed`]
/// on success, otherwise [`PubDate::Invalid`] carrying the trimmed input.
pub fn parse_pub_date(raw: &str) -> PubDate {
    let raw = raw.trim();
    if raw == UNKNOWN || raw == NOT_AVAILABLE {
        return PubDate::Absent;
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return PubDate::Parsed(PubTimestamp::Offset(ts));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return PubDate::Parsed(PubTimestamp::Offset(ts));
    }
    if let Some(ts) = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return PubDate::Parsed(PubTimestamp::Naive(ts));
    }
    if let Some(ts) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return PubDate::Parsed(PubTimestamp::Naive(ts));
    }
    PubDate::Invalid(raw.to_string())
}
