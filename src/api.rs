use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{CatalogError, RenderUrlError};
use crate::models::{Catalog, RenderRequest, TemplateEntry};

/// Status and decoded JSON body of one GET. `body` is `None` when the
/// response carried nothing that parses as JSON.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The one HTTP operation the commands need.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issues a single GET. `Err` means no response was received at all.
    async fn get(&self, url: &str) -> Result<HttpResponse, String>;
}

/// Talks to the meme API over reqwest.
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&config.user_agent)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ApiClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        let body = serde_json::from_slice(&bytes).ok();
        debug!(url, status, has_body = body.is_some(), "GET complete");

        Ok(HttpResponse { status, body })
    }
}

/// Fetches the template catalog: a JSON object mapping display title to
/// template URL. Names are the URLs with `catalog_url` stripped off.
pub async fn fetch_catalog(http: &dyn HttpClient, catalog_url: &str) -> Result<Catalog, CatalogError> {
    let response = http
        .get(catalog_url)
        .await
        .map_err(CatalogError::Transport)?;

    if !response.is_success() {
        return Err(CatalogError::Status(response.status));
    }

    let Some(Value::Object(data)) = response.body else {
        return Err(CatalogError::EmptyPayload);
    };

    let prefix = with_trailing_slash(catalog_url);
    let mut catalog = Catalog::new();
    for (title, url) in data {
        let Value::String(url) = url else {
            debug!(%title, "Skipping template with non-string URL");
            continue;
        };
        let name = url.strip_prefix(prefix.as_str()).unwrap_or(&url).to_string();
        catalog.insert(name.clone(), TemplateEntry { title, url, name });
    }

    if catalog.is_empty() {
        return Err(CatalogError::EmptyPayload);
    }
    Ok(catalog)
}

/// Builds `<base>/<template>/<line1>/<line2>`, percent-encoding each segment.
/// Segments of exactly `.` or `..` are refused: URL normalization would drop
/// them (encoded or not) and shift the remaining captions out of position.
pub fn render_url(base: &str, request: &RenderRequest) -> Result<Url, RenderUrlError> {
    let segments = [&request.template, &request.line1, &request.line2];
    if let Some(dots) = segments.iter().find(|s| matches!(s.as_str(), "." | "..")) {
        return Err(RenderUrlError::DotSegment(dots.to_string()));
    }

    let mut url = Url::parse(base).map_err(|_| RenderUrlError::InvalidBase(base.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| RenderUrlError::InvalidBase(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeHttp;

    const CATALOG_URL: &str = "https://host/api/templates/";

    fn request(template: &str, line1: &str, line2: &str) -> RenderRequest {
        RenderRequest {
            template: template.to_string(),
            line1: line1.to_string(),
            line2: line2.to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_catalog_keys_entries_by_short_name() {
        let http = FakeHttp::new().respond(
            200,
            serde_json::json!({ "Drake": "https://host/api/templates/drake" }),
        );

        let catalog = fetch_catalog(&http, CATALOG_URL).await.expect("catalog");

        assert_eq!(
            catalog.get("drake"),
            Some(&TemplateEntry {
                title: "Drake".to_string(),
                name: "drake".to_string(),
                url: "https://host/api/templates/drake".to_string(),
            })
        );
        assert_eq!(http.requests(), vec![CATALOG_URL.to_string()]);
    }

    #[tokio::test]
    async fn fetch_catalog_strips_prefix_without_trailing_slash() {
        let http = FakeHttp::new().respond(
            200,
            serde_json::json!({ "Doge": "https://host/api/templates/doge" }),
        );

        let catalog = fetch_catalog(&http, "https://host/api/templates")
            .await
            .expect("catalog");

        assert!(catalog.contains_key("doge"));
    }

    #[tokio::test]
    async fn fetch_catalog_keeps_foreign_urls_whole() {
        let http = FakeHttp::new().respond(
            200,
            serde_json::json!({ "Elsewhere": "https://other/x", "Drake": "https://host/api/templates/drake" }),
        );

        let catalog = fetch_catalog(&http, CATALOG_URL).await.expect("catalog");

        assert_eq!(catalog["https://other/x"].title, "Elsewhere");
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn fetch_catalog_rejects_bad_status() {
        let http = FakeHttp::new().respond(503, serde_json::json!({}));
        let err = fetch_catalog(&http, CATALOG_URL).await.expect_err("503");
        assert_eq!(err, CatalogError::Status(503));
    }

    #[tokio::test]
    async fn fetch_catalog_rejects_empty_or_missing_payload() {
        let http = FakeHttp::new()
            .respond(200, serde_json::json!({}))
            .respond_without_body(200)
            .respond(200, serde_json::json!(["not", "an", "object"]));

        for _ in 0..3 {
            let err = fetch_catalog(&http, CATALOG_URL).await.expect_err("empty");
            assert_eq!(err, CatalogError::EmptyPayload);
        }
    }

    #[tokio::test]
    async fn fetch_catalog_reports_transport_failures() {
        let http = FakeHttp::new().fail("connection refused");
        let err = fetch_catalog(&http, CATALOG_URL).await.expect_err("offline");
        assert_eq!(err, CatalogError::Transport("connection refused".to_string()));
    }

    #[test]
    fn render_url_appends_segments() {
        let url = render_url(CATALOG_URL, &request("drake", "top", "bottom")).expect("url");
        assert_eq!(url.as_str(), "https://host/api/templates/drake/top/bottom");
    }

    #[test]
    fn render_url_keeps_trailing_slash_for_missing_second_line() {
        let url = render_url(CATALOG_URL, &request("drake", "top", "")).expect("url");
        assert_eq!(url.as_str(), "https://host/api/templates/drake/top/");
    }

    #[test]
    fn render_url_percent_encodes_reserved_characters() {
        let url = render_url(CATALOG_URL, &request("drake", "a/b?c", "50% #1")).expect("url");
        assert_eq!(
            url.as_str(),
            "https://host/api/templates/drake/a%2Fb%3Fc/50%25%20%231"
        );
    }

    #[test]
    fn render_url_refuses_dot_only_segments_instead_of_shifting_captions() {
        for (line1, line2) in [("..", "yes"), (".", "ok"), ("top", ".."), ("top", ".")] {
            let err = render_url(CATALOG_URL, &request("drake", line1, line2))
                .expect_err("dot segment");
            let dots = if matches!(line1, "." | "..") { line1 } else { line2 };
            assert_eq!(err, RenderUrlError::DotSegment(dots.to_string()));
        }
        let err = render_url(CATALOG_URL, &request("..", "a", "b")).expect_err("dot key");
        assert_eq!(err, RenderUrlError::DotSegment("..".to_string()));
    }

    #[test]
    fn render_url_keeps_dots_inside_longer_captions() {
        let url = render_url(CATALOG_URL, &request("drake", "...", "wait.")).expect("url");
        assert_eq!(url.as_str(), "https://host/api/templates/drake/.../wait.");
    }

    #[test]
    fn render_url_rejects_base_without_path() {
        let err = render_url("mailto:someone@host", &request("drake", "a", "b"))
            .expect_err("cannot-be-a-base");
        assert_eq!(err, RenderUrlError::InvalidBase("mailto:someone@host".to_string()));
    }

    #[test]
    fn render_url_accepts_base_without_trailing_slash() {
        let url = render_url("https://host/api/templates", &request("doge", "wow", "such")).expect("url");
        assert_eq!(url.as_str(), "https://host/api/templates/doge/wow/such");
    }

    #[test]
    fn http_response_success_covers_2xx_only() {
        let ok = HttpResponse { status: 204, body: None };
        let moved = HttpResponse { status: 301, body: None };
        assert!(ok.is_success());
        assert!(!moved.is_success());
    }
}
