//! Fetch sources for defaults payloads.

use std::time::Duration;

use tcal_core::ScheduleError;

/// Single-shot payload fetch. No retries: the refresh loop's next tick is
/// the retry.
#[async_trait::async_trait]
pub trait DefaultsFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScheduleError>;
}

/// `http(s)://` via reqwest, `file:` via the filesystem.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    http: reqwest::Client,
}

impl UrlFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScheduleError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScheduleError::fetch("<client>", e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait::async_trait]
impl DefaultsFetcher for UrlFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScheduleError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| ScheduleError::fetch(url, e.to_string()))?;

        if parsed.scheme() == "file" {
            let path = parsed
                .to_file_path()
                .map_err(|_| ScheduleError::fetch(url, "not a local file path"))?;
            return tokio::fs::read(&path)
                .await
                .map_err(|e| ScheduleError::fetch(url, e.to_string()));
        }

        let resp = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(|e| ScheduleError::fetch(url, format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScheduleError::fetch(
                url,
                format!("http error status={}", status.as_u16()),
            ));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| ScheduleError::fetch(url, format!("body read failed: {e}")))?;
        Ok(body.to_vec())
    }
}
