//! Remote log API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::FetchError;
use crate::remote::reports::excerpt;
use crate::remote::{GuildRef, LogRequest, LogSource};

/// reqwest-backed [`LogSource`] for the v1 report API.
#[derive(Debug, Clone)]
pub struct WclClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    timeout: Duration,
}

impl WclClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Transport(err.to_string()))?;

        let base_url = base_url.into();
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|err| {
            FetchError::Transport(format!("Invalid base URL '{}': {}", base_url, err))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(FetchError::Transport(format!(
                "Base URL '{}' cannot carry a path",
                base_url
            )));
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            timeout,
        })
    }

    fn reports_url(&self, guild: &GuildRef) -> Url {
        self.url_with(&[
            "reports",
            "guild",
            &guild.guild,
            &guild.server,
            &guild.region,
        ])
    }

    fn log_url(&self, request: &LogRequest) -> Url {
        self.url_with(&["report", "tables", request.view.as_str(), &request.log_id])
    }

    /// Appends percent-encoded `segments` to the base URL path.
    fn url_with(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url, query: &[(&str, String)]) -> Result<String, FetchError> {
        debug!("Requesting {}", url);

        let response = self
            .http
            .get(url.clone())
            .query(query)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !status.is_success() {
            warn!("Got status code {} from {}", status, url);
            return Err(FetchError::Upstream {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        Ok(body)
    }

    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl LogSource for WclClient {
    async fn fetch_reports(&self, guild: &GuildRef) -> Result<String, FetchError> {
        self.get(self.reports_url(guild), &[]).await
    }

    async fn fetch_log(&self, request: &LogRequest) -> Result<String, FetchError> {
        let query = [
            ("end", request.end.to_string()),
            ("encounter", request.encounter.to_string()),
        ];
        self.get(self.log_url(request), &query).await
    }
}

/// Parses a raw log body into JSON.
///
/// The API sometimes answers 200 with an `{"error": .., "status": ..}`
/// body; that is reported as [`FetchError::Upstream`]. A body without an
/// `entries` array is [`FetchError::Malformed`], so it is never cached.
pub fn parse_log_response(raw: &str) -> Result<Value, FetchError> {
    let body: Value = serde_json::from_str(raw).map_err(|err| {
        error!("Couldn't parse response as json: '{}'", excerpt(raw));
        FetchError::Malformed(err.to_string())
    })?;

    if let Some(message) = body.get("error") {
        let status = body
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(200);
        let message = message
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_string());
        return Err(FetchError::Upstream { status, message });
    }

    if !body.get("entries").is_some_and(Value::is_array) {
        warn!("Log response has no entries: '{}'", excerpt(raw));
        return Err(FetchError::Malformed(
            "log response has no entries collection".to_string(),
        ));
    }

    Ok(body)
}
