//! WHO news feed adapter.
//!
//! The WHO publishes an RSS 2.0 feed. Each `<item>` becomes one candidate with
//! `title`, `description`, `link` and `pubDate`. Atom `<entry>` elements are
//! accepted too, mapped onto the same field names.

use super::{SourceAdapter, searchable};
use crate::error::ParseError;
use crate::models::RawCandidate;
use quick_xml::de::{Deserializer, EntityResolver};
use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::BytesText;
use serde::Deserialize;
use std::convert::Infallible;
use tracing::{debug, instrument};

/// Root of either an RSS (`<rss><channel>`) or Atom (`<feed>`) document.
#[derive(Debug, Deserialize)]
struct Feed {
    channel: Option<Channel>,
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FeedAdapter;

impl SourceAdapter for FeedAdapter {
    #[instrument(level = "debug", skip_all, fields(bytes = payload.len()))]
    fn parse(&self, payload: &str) -> Result<Vec<RawCandidate>, ParseError> {
        let mut de = Deserializer::from_str_with_resolver(payload, HtmlEntityResolver);
        let feed = Feed::deserialize(&mut de)?;

        let candidates: Vec<RawCandidate> = match feed.channel {
            Some(channel) => channel.item.into_iter().map(item_candidate).collect(),
            None if !feed.entry.is_empty() => feed.entry.into_iter().map(entry_candidate).collect(),
            None => return Err(ParseError::MissingAnchor("channel")),
        };

        debug!(count = candidates.len(), "Parsed feed items");
        Ok(candidates)
    }
}

fn item_candidate(item: Item) -> RawCandidate {
    candidate(item.title, item.description, item.link, item.pub_date)
}

fn entry_candidate(entry: Entry) -> RawCandidate {
    let link = entry.link.into_iter().find_map(|l| l.href);
    candidate(entry.title, entry.summary, link, entry.published.or(entry.updated))
}

/// Absent elements stay absent; the normalizer fills them in.
fn candidate(
    title: Option<String>,
    description: Option<String>,
    link: Option<String>,
    pub_date: Option<String>,
) -> RawCandidate {
    let text = searchable([
        title.as_deref().unwrap_or_default(),
        description.as_deref().unwrap_or_default(),
    ]);
    let fields = [
        ("title", title),
        ("description", description),
        ("link", link),
        ("pubDate", pub_date),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.map(|v| (k, v.trim().to_string())));
    RawCandidate::new(text, fields)
}

/// Feeds ship HTML named entities that XML does not define. Spacing and
/// typographic punctuation fold to ASCII; everything else resolves to its
/// HTML5 character.
struct HtmlEntityResolver;

impl EntityResolver for HtmlEntityResolver {
    type Error = Infallible;

    fn capture(&mut self, _doctype: BytesText) -> Result<(), Self::Error> {
        Ok(())
    }

    fn resolve(&self, entity: &str) -> Option<&str> {
        match entity {
            "nbsp" => Some(" "),
            "ndash" | "mdash" => Some("-"),
            "ldquo" | "rdquo" => Some("\""),
            "lsquo" | "rsquo" => Some("'"),
            _ => resolve_html5_entity(entity),
        }
    }
}
