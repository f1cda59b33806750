//! Page summary client for descriptions and thumbnails
//!
//! Endpoint: `<base_url>/api/rest_v1/page/summary/<title>`

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SummaryConfig;
use crate::error::{SkyError, SkyResult};

const SUMMARY_PATH: &str = "/api/rest_v1/page/summary/";
const DISAMBIGUATION: &str = "disambiguation";

/// Anything that can describe an object by name.
///
/// Returns `(description, image_url)`; failures of any kind are reported as
/// `(None, None)` and never raised.
#[async_trait]
pub trait DescriptionSource: Send + Sync {
    async fn describe(&self, name: &str) -> (Option<String>, Option<String>);
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(default)]
    source: Option<String>,
}

/// A usable summary: unescaped extract plus optional thumbnail
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub extract: String,
    pub image_url: Option<String>,
}

pub struct SummaryClient {
    client: reqwest::Client,
    base_url: String,
}

impl SummaryClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &SummaryConfig) -> anyhow::Result<Self> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )
    }

    fn summary_url(&self, name: &str) -> String {
        format!("{}{}{}", self.base_url, SUMMARY_PATH, urlencoding::encode(name))
    }

    /// Fetch and validate one summary
    pub async fn fetch_summary(&self, name: &str) -> SkyResult<PageSummary> {
        let url = self.summary_url(name);
        tracing::debug!("Fetching summary: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SkyError::NetworkUnavailable(format!("{}: {}", name, e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Summary for {} returned HTTP {}", name, status);
            return Err(SkyError::NotFound(name.to_string()));
        }

        let summary: SummaryResponse = response
            .json()
            .await
            .map_err(|e| SkyError::NetworkUnavailable(format!("{}: invalid body: {}", name, e)))?;

        if summary.kind.as_deref() == Some(DISAMBIGUATION) {
            return Err(SkyError::NotFound(name.to_string()));
        }

        let extract = summary
            .extract
            .map(|e| unescape_html(&e))
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| SkyError::NotFound(name.to_string()))?;

        Ok(PageSummary {
            extract,
            image_url: summary.thumbnail.and_then(|t| t.source),
        })
    }
}

#[async_trait]
impl DescriptionSource for SummaryClient {
    async fn describe(&self, name: &str) -> (Option<String>, Option<String>) {
        match self.fetch_summary(name).await {
            Ok(summary) => (Some(summary.extract), summary.image_url),
            Err(e) => {
                tracing::debug!("No description for {}: {}", name, e);
                (None, None)
            }
        }
    }
}

/// Resolve HTML character references (`&amp;`, `&#233;`, ...) to text
pub fn unescape_html(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    scraper::Html::parse_fragment(text)
        .root_element()
        .text()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Path, http::StatusCode, response::IntoResponse, routing::get};
    use serde_json::json;

    async fn summary_handler(Path(title): Path<String>) -> impl IntoResponse {
        match title.as_str() {
            "Vega" => (
                StatusCode::OK,
                Json(json!({
                    "type": "standard",
                    "extract": "Vega is the brightest star in Lyra &amp; the fifth-brightest in the sky.",
                    "thumbnail": { "source": "https://upload.example/vega.jpg" }
                })),
            ),
            "Mercury" => (
                StatusCode::OK,
                Json(json!({ "type": "disambiguation", "extract": "Mercury may refer to:" })),
            ),
            "Mercury (planet)" => (
                StatusCode::OK,
                Json(json!({ "type": "standard", "extract": "Mercury is the first planet from the Sun." })),
            ),
            "Blank" => (StatusCode::OK, Json(json!({ "type": "standard", "extract": "" }))),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "type": "not_found" }))),
        }
    }

    async fn spawn_summary_server() -> String {
        let app = Router::new().route("/api/rest_v1/page/summary/{title}", get(summary_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: &str, timeout: Duration) -> SummaryClient {
        SummaryClient::new(base_url, timeout, "merai-backend-test").unwrap()
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("Alpha &amp; Beta"), "Alpha & Beta");
        assert_eq!(unescape_html("Caf&#233; &lt;3"), "Café <3");
        assert_eq!(unescape_html("plain text"), "plain text");
    }

    #[test]
    fn test_summary_url_is_percent_encoded() {
        let c = client("https://en.wikipedia.org/", Duration::from_secs(5));
        assert_eq!(
            c.summary_url("Mercury (planet)"),
            "https://en.wikipedia.org/api/rest_v1/page/summary/Mercury%20%28planet%29"
        );
    }

    #[tokio::test]
    async fn test_describe_success() {
        let base = spawn_summary_server().await;
        let c = client(&base, Duration::from_secs(5));

        let (description, image) = c.describe("Vega").await;
        assert_eq!(
            description.as_deref(),
            Some("Vega is the brightest star in Lyra & the fifth-brightest in the sky.")
        );
        assert_eq!(image.as_deref(), Some("https://upload.example/vega.jpg"));
    }

    #[tokio::test]
    async fn test_describe_unusable_answers() {
        let base = spawn_summary_server().await;
        let c = client(&base, Duration::from_secs(5));

        assert_eq!(c.describe("Nonexistent").await, (None, None));
        assert_eq!(c.describe("Mercury").await, (None, None));
        assert_eq!(c.describe("Blank").await, (None, None));

        let (description, image) = c.describe("Mercury (planet)").await;
        assert!(description.unwrap().starts_with("Mercury is"));
        assert_eq!(image, None);
    }

    #[tokio::test]
    async fn test_describe_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let c = client(&format!("http://{}", addr), Duration::from_millis(300));
        assert!(matches!(
            c.fetch_summary("Vega").await,
            Err(SkyError::NetworkUnavailable(_))
        ));
        assert_eq!(c.describe("Vega").await, (None, None));
    }

    #[tokio::test]
    async fn test_describe_connection_refused() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let c = client(&format!("http://{}", addr), Duration::from_secs(1));
        assert_eq!(c.describe("Vega").await, (None, None));
    }
}
