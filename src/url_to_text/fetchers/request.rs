use crate::error::ClipError;
use crate::model::RawPage;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Downloads recipe pages while presenting as a desktop browser.
#[derive(Debug, Clone)]
pub struct RequestFetcher {
    client: Client,
}

impl RequestFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, ClipError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .map_err(|e| ClipError::Builder(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Fetch `url`. Any non-success status or transport failure is an upstream error.
    pub async fn fetch(&self, url: &str) -> Result<RawPage, ClipError> {
        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClipError::UpstreamFetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClipError::UpstreamFetch(format!("HTTP {status} from {url}")));
        }

        let html = response
            .text()
            .await
            .map_err(|e| ClipError::UpstreamFetch(e.to_string()))?;
        debug!("Fetched {} bytes from {}", html.len(), url);

        Ok(RawPage {
            url: url.to_string(),
            html,
        })
    }
}
