//! Pipeline configuration.
//!
//! Built once at startup, either from defaults or from a YAML file, then shared
//! read-only (behind an `Arc`) by the collectors. Any key left out of the file
//! keeps its default.
//!
//! ```yaml
//! keywords: [outbreak, cholera, measles]
//! request_timeout_secs: 20
//! max_concurrent_sources: 4
//! sources:
//!   HealthMap:
//!     enabled: false
//!   Wikipedia:
//!     delay_millis: 5000
//! ```

use crate::error::ConfigError;
use crate::models::Source;
use crate::relevance::KeywordSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

pub const DEFAULT_KEYWORDS: [&str; 8] = [
    "outbreak",
    "epidemic",
    "pandemic",
    "infection",
    "disease",
    "virus",
    "health emergency",
    "influenza",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub keywords: Vec<String>,
    pub request_timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub render_poll_millis: u64,
    /// Collectors allowed in flight at once; `1` runs sources one after another.
    pub max_concurrent_sources: usize,
    /// Relevance-passing wiki events kept, in document order.
    pub wiki_event_cap: usize,
    pub user_agent: String,
    /// Optional prerender service; the page URL is appended percent-encoded.
    pub render_endpoint: Option<String>,
    pub sources: BTreeMap<Source, SourceOverride>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            request_timeout_secs: 10,
            render_timeout_secs: 15,
            render_poll_millis: 500,
            max_concurrent_sources: 1,
            wiki_event_cap: 10,
            user_agent: concat!("outbreak_watch/", env!("CARGO_PKG_VERSION")).to_string(),
            render_endpoint: None,
            sources: BTreeMap::new(),
        }
    }
}

/// Per-source values from the config file; unset fields fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOverride {
    pub enabled: Option<bool>,
    pub url: Option<String>,
    pub delay_millis: Option<u64>,
}

/// Fully resolved settings for one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub enabled: bool,
    pub url: String,
    /// Courtesy pause after the source's work completes.
    pub delay: Duration,
}

impl SourceSettings {
    fn defaults(source: Source) -> Self {
        let (url, delay_millis) = match source {
            Source::Who => ("https://www.who.int/rss-feeds/news-english.xml", 1000),
            Source::Cdc => ("https://tools.cdc.gov/api/v2/resources/media", 1000),
            Source::HealthMap => ("https://www.healthmap.org/en/", 0),
            Source::Wikipedia => ("https://en.wikipedia.org/wiki/Portal:Current_events", 2000),
        };
        Self {
            enabled: true,
            url: url.to_string(),
            delay: Duration::from_millis(delay_millis),
        }
    }
}

impl PipelineConfig {
    /// Load from `path` when given, otherwise use defaults. The result is validated.
    ///
    /// # Arguments
    ///
    /// * `path` - Optional YAML file; keys it omits keep their default
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] if the file cannot be read, [`ConfigError::Yaml`]
    /// for malformed or unknown keys, [`ConfigError::Invalid`] when validation
    /// fails.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                let config = Self::from_yaml_str(&text)?;
                info!(path = %path.display(), "Loaded configuration file");
                config
            }
            None => {
                info!("No configuration file given; using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keyword_set().is_empty() {
            return Err(ConfigError::Invalid("at least one keyword is required".into()));
        }
        if self.request_timeout_secs == 0 || self.render_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        if self.render_poll_millis == 0 {
            return Err(ConfigError::Invalid("render_poll_millis must be non-zero".into()));
        }
        if self.max_concurrent_sources == 0 {
            return Err(ConfigError::Invalid("max_concurrent_sources must be at least 1".into()));
        }
        for source in Source::ALL {
            let url = self.source(source).url;
            Url::parse(&url)
                .map_err(|e| ConfigError::Invalid(format!("{source} url `{url}`: {e}")))?;
        }
        if let Some(endpoint) = &self.render_endpoint {
            Url::parse(endpoint)
                .map_err(|e| ConfigError::Invalid(format!("render_endpoint `{endpoint}`: {e}")))?;
        }
        Ok(())
    }

    pub fn source(&self, source: Source) -> SourceSettings {
        let mut settings = SourceSettings::defaults(source);
        if let Some(o) = self.sources.get(&source) {
            if let Some(enabled) = o.enabled {
                settings.enabled = enabled;
            }
            if let Some(url) = &o.url {
                settings.url = url.clone();
            }
            if let Some(millis) = o.delay_millis {
                settings.delay = Duration::from_millis(millis);
            }
        }
        settings
    }

    /// Enabled sources in canonical order, optionally narrowed to `only`.
    pub fn enabled_sources(&self, only: &[Source]) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|s| self.source(*s).enabled)
            .filter(|s| only.is_empty() || only.contains(s))
            .collect()
    }

    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::new(&self.keywords)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    pub fn render_poll_interval(&self) -> Duration {
        Duration::from_millis(self.render_poll_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.keywords.len(), 8);
        assert_eq!(config.enabled_sources(&[]), Source::ALL.to_vec());
        assert_eq!(config.source(Source::Wikipedia).delay, Duration::from_secs(2));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
request_timeout_secs: 30
sources:
  HealthMap:
    enabled: false
  CDC:
    url: "http://localhost:9000/media"
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.render_timeout(), Duration::from_secs(15));
        assert_eq!(config.source(Source::Cdc).url, "http://localhost:9000/media");
        assert_eq!(config.source(Source::Cdc).delay, Duration::from_secs(1));
        assert_eq!(
            config.enabled_sources(&[]),
            vec![Source::Who, Source::Cdc, Source::Wikipedia]
        );
    }

    #[test]
    fn test_only_narrows_enabled_sources() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.enabled_sources(&[Source::Wikipedia, Source::Who]),
            vec![Source::Who, Source::Wikipedia]
        );
    }

    #[test]
    fn test_unknown_source_key_is_rejected() {
        let yaml = "sources:\n  ProMED:\n    enabled: true\n";
        assert!(matches!(
            PipelineConfig::from_yaml_str(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = PipelineConfig::default();
        config.keywords = vec!["  ".into()];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = PipelineConfig::default();
        config.max_concurrent_sources = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = PipelineConfig::default();
        config.sources.insert(
            Source::Who,
            SourceOverride {
                url: Some("not a url".into()),
                ..Default::default()
            },
        );
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_render_poll_is_rejected() {
        let config = PipelineConfig::from_yaml_str("render_poll_millis: 0").unwrap();
        match config.validate() {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("render_poll_millis")),
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "keywords: [cholera]\nwiki_event_cap: 3").unwrap();
        let config = PipelineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.wiki_event_cap, 3);
        assert!(config.keyword_set().is_relevant("Cholera cases rise"));
        assert!(!config.keyword_set().is_relevant("Measles outbreak"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load(Some(Path::new("/nonexistent/outbreak.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
