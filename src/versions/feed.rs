use std::time::Duration;

use serde::Deserialize;

use crate::error::{DocSamplesError, Result};

const USER_AGENT: &str = concat!("doc-samples/", env!("CARGO_PKG_VERSION"));

/// Latest release as reported by the feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<String>,
}

/// HTTP client for release-metadata endpoints (GitHub releases API shape)
pub struct ReleaseFeed {
    http: reqwest::Client,
    timeout: Duration,
}

impl ReleaseFeed {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                DocSamplesError::NetworkUnavailable(format!("failed to build http client: {}", e))
            })?;

        Ok(Self { http, timeout })
    }

    pub async fn latest(&self, url: &str) -> Result<Release> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocSamplesError::NetworkUnavailable(format!(
                        "request to {} timed out after {:?}",
                        url, self.timeout
                    ))
                } else {
                    DocSamplesError::NetworkUnavailable(format!("request to {} failed: {}", url, e))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            DocSamplesError::NetworkUnavailable(format!("failed to read response from {}: {}", url, e))
        })?;

        if !status.is_success() {
            return Err(DocSamplesError::NetworkUnavailable(format!(
                "{} returned HTTP {}",
                url, status
            )));
        }

        parse_release(&body)
    }
}

pub fn parse_release(body: &str) -> Result<Release> {
    let release: Release = serde_json::from_str(body)?;
    if release.tag_name.trim().is_empty() {
        return Err(DocSamplesError::InvalidVersion(
            "release has an empty tag_name".to_string(),
        ));
    }
    Ok(release)
}
