//! Transport collaborator: how raw payloads are obtained.
//!
//! The pipeline only needs "fetch raw content for this URL, or fail" and, for
//! JavaScript-rendered pages, "give me the DOM once it is ready, or fail".
//! [`Transport`] captures exactly that, so collectors can be driven by
//! [`HttpTransport`] in production and by scripted payloads in tests.
//!
//! Rendered pages are waited on declaratively: a [`ReadyCondition`] names the
//! elements that must exist, and [`HttpTransport::render_and_wait`] re-checks
//! it until it holds or the timeout ceiling is reached. Re-checking only
//! happens through a configured render endpoint; a plain GET is checked once.
//! Nothing here retries a failed request.

use crate::config::PipelineConfig;
use crate::error::TransportError;
use scraper::{Html, Selector};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Raw-content access to upstream sources.
pub trait Transport {
    /// GET `url` and return its body as text.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, TransportError>;

    /// Obtain the rendered DOM of `url` once `ready` holds.
    async fn render_and_wait(
        &self,
        url: &str,
        ready: &ReadyCondition,
        timeout: Duration,
    ) -> Result<String, TransportError>;
}

/// A set of CSS selectors that must all match before a page counts as rendered.
#[derive(Debug, Clone)]
pub struct ReadyCondition {
    selectors: Vec<(String, Selector)>,
}

impl ReadyCondition {
    /// Build a condition from CSS selectors, rejecting any that do not parse.
    pub fn all_present<'a, I>(selectors: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let selectors = selectors
            .into_iter()
            .map(|css| {
                Selector::parse(css)
                    .map(|sel| (css.to_string(), sel))
                    .map_err(|e| format!("invalid selector `{css}`: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    pub fn is_satisfied(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        self.selectors
            .iter()
            .all(|(_, sel)| document.select(sel).next().is_some())
    }

    /// The selectors still missing from `html`, for diagnostics.
    pub fn missing(&self, html: &str) -> Vec<&str> {
        let document = Html::parse_document(html);
        self.selectors
            .iter()
            .filter(|(_, sel)| document.select(sel).next().is_none())
            .map(|(css, _)| css.as_str())
            .collect()
    }
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    render_endpoint: Option<String>,
    poll_interval: Duration,
}

impl HttpTransport {
    pub fn new(config: &PipelineConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            render_endpoint: config.render_endpoint.clone(),
            poll_interval: config.render_poll_interval(),
        })
    }

    /// The URL actually requested for a rendered page.
    fn render_url(&self, url: &str) -> String {
        match &self.render_endpoint {
            Some(endpoint) => format!("{}{}", endpoint, urlencoding::encode(url)),
            None => url.to_string(),
        }
    }
}

impl Transport for HttpTransport {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, e))?;
        debug!(bytes = body.len(), "Fetched payload");
        Ok(body)
    }

    #[instrument(level = "debug", skip(self, ready))]
    async fn render_and_wait(
        &self,
        url: &str,
        ready: &ReadyCondition,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let target = self.render_url(url);
        let started = Instant::now();

        loop {
            let remaining = timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return Err(TransportError::RenderTimeout {
                    url: url.to_string(),
                    waited: started.elapsed(),
                });
            }

            let html = self.fetch(&target, remaining).await?;
            if ready.is_satisfied(&html) {
                debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Page ready");
                return Ok(html);
            }

            let missing = ready.missing(&html);
            // A plain GET never runs scripts, so the body will not change on re-fetch.
            if self.render_endpoint.is_none() {
                warn!(?missing, "Ready condition not met and no render endpoint configured");
                return Err(TransportError::RenderTimeout {
                    url: url.to_string(),
                    waited: started.elapsed(),
                });
            }
            if started.elapsed() + self.poll_interval >= timeout {
                warn!(?missing, "Ready condition never held");
                return Err(TransportError::RenderTimeout {
                    url: url.to_string(),
                    waited: started.elapsed(),
                });
            }
            debug!(?missing, "Page not ready yet");
            sleep(self.poll_interval).await;
        }
    }
}

fn classify(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Test double answering from canned payloads, matched by URL prefix.
#[cfg(test)]
pub(crate) struct ScriptedTransport {
    routes: Vec<(String, Result<String, u16>)>,
}

#[cfg(test)]
impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self { routes: Vec::new() }
    }

    pub(crate) fn respond(mut self, prefix: &str, body: &str) -> Self {
        self.routes.push((prefix.to_string(), Ok(body.to_string())));
        self
    }

    pub(crate) fn fail(mut self, prefix: &str, status: u16) -> Self {
        self.routes.push((prefix.to_string(), Err(status)));
        self
    }

    fn answer(&self, url: &str) -> Result<String, TransportError> {
        match self.routes.iter().find(|(prefix, _)| url.starts_with(prefix.as_str())) {
            Some((_, Ok(body))) => Ok(body.clone()),
            Some((_, Err(status))) => Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
impl Transport for ScriptedTransport {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<String, TransportError> {
        self.answer(url)
    }

    async fn render_and_wait(
        &self,
        url: &str,
        ready: &ReadyCondition,
        timeout: Duration,
    ) -> Result<String, TransportError> {
        let html = self.answer(url)?;
        if ready.is_satisfied(&html) {
            Ok(html)
        } else {
            Err(TransportError::RenderTimeout {
                url: url.to_string(),
                waited: timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport() -> HttpTransport {
        let mut config = PipelineConfig::default();
        config.render_poll_millis = 50;
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_ready_condition_requires_every_selector() {
        let ready = ReadyCondition::all_present(["section#map_canvas", "div[title]"]).unwrap();
        assert!(ready.is_satisfied(r#"<section id="map_canvas"><div title="x"></div></section>"#));
        assert!(!ready.is_satisfied(r#"<section id="map_canvas"></section>"#));
        assert_eq!(ready.missing(r#"<section id="map_canvas"></section>"#), vec!["div[title]"]);
    }

    #[test]
    fn test_ready_condition_rejects_bad_selector() {
        assert!(ReadyCondition::all_present(["div[["]).is_err());
    }

    #[test]
    fn test_render_url_goes_through_endpoint() {
        let mut config = PipelineConfig::default();
        config.render_endpoint = Some("http://render.local/render?url=".into());
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(
            transport.render_url("https://www.healthmap.org/en/"),
            "http://render.local/render?url=https%3A%2F%2Fwww.healthmap.org%2Fen%2F"
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .mount(&server)
            .await;

        let body = transport()
            .fetch(&format!("{}/feed.xml", server.uri()), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(body, "<rss/>");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = transport()
            .fetch(&server.uri(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let err = transport()
            .fetch(&server.uri(), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_render_and_wait_returns_ready_dom() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<section id="map_canvas"><div title="Cholera"><p>x</p></div></section>"#,
            ))
            .mount(&server)
            .await;

        let ready = ReadyCondition::all_present(["section#map_canvas div[title]"]).unwrap();
        let html = transport()
            .render_and_wait(&server.uri(), &ready, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(html.contains("Cholera"));
    }

    #[tokio::test]
    async fn test_render_and_wait_without_endpoint_fetches_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div>loading</div>"))
            .expect(1)
            .mount(&server)
            .await;

        let ready = ReadyCondition::all_present(["section#map_canvas"]).unwrap();
        let started = Instant::now();
        let err = transport()
            .render_and_wait(&server.uri(), &ready, Duration::from_secs(3))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::RenderTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_render_and_wait_polls_endpoint_until_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/render"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<div>loading</div>"))
            .expect(2..)
            .mount(&server)
            .await;

        let mut config = PipelineConfig::default();
        config.render_poll_millis = 50;
        config.render_endpoint = Some(format!("{}/render?url=", server.uri()));
        let transport = HttpTransport::new(&config).unwrap();

        let ready = ReadyCondition::all_present(["section#map_canvas"]).unwrap();
        let err = transport
            .render_and_wait("https://www.healthmap.org/en/", &ready, Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::RenderTimeout { .. }));
    }
}
