//! CDC media API adapter.
//!
//! The media endpoint returns `{"results": [...]}`; each result carries
//! `name`, `description`, `url` and `datePublished`, mapped to the feed-style
//! field names. A key the API omits is recorded as `"N/A"`.

use super::{SourceAdapter, searchable};
use crate::error::ParseError;
use crate::models::{NOT_AVAILABLE, RawCandidate};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

/// Query sent with every request: newest first, enough results to find relevant items.
const QUERY: [(&str, &str); 4] = [
    ("sort", "datePublished"),
    ("order", "desc"),
    ("max", "50"),
    ("format", "json"),
];

/// `(api field, record field)`
const FIELD_MAP: [(&str, &str); 4] = [
    ("name", "title"),
    ("description", "description"),
    ("url", "link"),
    ("datePublished", "pubDate"),
];

/// Build the request URL for the media endpoint at `base`.
pub fn request_url(base: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().extend_pairs(QUERY);
    Ok(url)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MediaApiAdapter;

impl SourceAdapter for MediaApiAdapter {
    #[instrument(level = "debug", skip_all, fields(bytes = payload.len()))]
    fn parse(&self, payload: &str) -> Result<Vec<RawCandidate>, ParseError> {
        let body: Value = serde_json::from_str(payload)?;
        let results = body
            .get("results")
            .and_then(Value::as_array)
            .ok_or(ParseError::MissingAnchor("results"))?;

        let candidates: Vec<RawCandidate> = results
            .iter()
            .filter_map(Value::as_object)
            .map(|result| {
                let fields: Vec<(&str, String)> = FIELD_MAP
                    .iter()
                    .map(|(api, field)| (*field, value_text(result.get(*api))))
                    .collect();
                let text = searchable([fields[0].1.as_str(), fields[1].1.as_str()]);
                RawCandidate::new(text, fields)
            })
            .collect();

        debug!(count = candidates.len(), "Parsed media API results");
        Ok(candidates)
    }
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_carries_query() {
        let url = request_url("https://tools.cdc.gov/api/v2/resources/media").unwrap();
        assert_eq!(
            url.as_str(),
            "https://tools.cdc.gov/api/v2/resources/media?sort=datePublished&order=desc&max=50&format=json"
        );
    }

    #[test]
    fn test_maps_api_fields() {
        let payload = r#"{"results": [{
            "name": "Measles outbreak update",
            "description": "Cases reported in three states.",
            "url": "https://www.cdc.gov/measles",
            "datePublished": "2025-01-06T10:00:00Z",
            "id": 42
        }]}"#;
        let candidates = MediaApiAdapter.parse(payload).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.field("title"), Some("Measles outbreak update"));
        assert_eq!(c.field("link"), Some("https://www.cdc.gov/measles"));
        assert_eq!(c.field("pubDate"), Some("2025-01-06T10:00:00Z"));
        assert_eq!(
            c.searchable_text,
            "Measles outbreak update Cases reported in three states."
        );
        assert_eq!(c.field("id"), None);
    }

    #[test]
    fn test_missing_keys_become_not_available() {
        let payload = r#"{"results": [{"name": "Flu season", "description": null}]}"#;
        let c = &MediaApiAdapter.parse(payload).unwrap()[0];
        assert_eq!(c.field("description"), Some("N/A"));
        assert_eq!(c.field("link"), Some("N/A"));
        assert_eq!(c.field("pubDate"), Some("N/A"));
    }

    #[test]
    fn test_empty_results() {
        assert!(MediaApiAdapter.parse(r#"{"results": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_missing_results_is_parse_error() {
        let err = MediaApiAdapter.parse(r#"{"error": "rate limited"}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingAnchor("results")));
        assert!(matches!(MediaApiAdapter.parse("<html>"), Err(ParseError::Json(_))));
    }
}
