//! Outbound HTTP to the three OpenStreetMap services.
//!
//! Every request goes through [`UpstreamClient`], which awaits the shared
//! [`ThrottleGate`] before sending. Adapters never see `reqwest` errors
//! directly; they get an [`UpstreamError`] and fold it into an envelope.
//!
//! No retries happen here. A failed call is terminal for that tool call.

pub mod nominatim;
pub mod osrm;
pub mod overpass;

use std::sync::Arc;
use std::time::Instant;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ServerConfig;
use crate::throttle::ThrottleGate;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status.
    #[error("{status} {reason}")]
    Status { status: u16, reason: String },
    /// Connection, TLS, timeout, or body read failure.
    #[error("{0}")]
    Transport(String),
    /// The body was not the JSON shape we expected.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("request timed out: {e}"))
        } else if e.is_connect() {
            Self::Transport(format!("connection failed: {e}"))
        } else {
            Self::Transport(format!("request failed: {e}"))
        }
    }
}

/// Base URLs for each upstream, trailing slashes stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub nominatim: String,
    pub overpass: String,
    pub osrm: String,
}

impl Endpoints {
    fn from_config(config: &ServerConfig) -> Self {
        Self {
            nominatim: config.nominatim_url.trim_end_matches('/').to_string(),
            overpass: config.overpass_url.trim_end_matches('/').to_string(),
            osrm: config.osrm_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Shared HTTP client, throttle gate and endpoint table.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    gate: Arc<ThrottleGate>,
    endpoints: Endpoints,
}

impl UpstreamClient {
    /// Build a client whose default `User-Agent` and timeout come from
    /// `config`. A `User-Agent` set on an individual request wins.
    pub fn from_config(config: &ServerConfig) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            gate: Arc::new(ThrottleGate::new(config.throttle)),
            endpoints: Endpoints::from_config(config),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn gate(&self) -> &Arc<ThrottleGate> {
        &self.gate
    }

    /// `GET url?query` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        self.send_json(self.http.get(url).query(query)).await
    }

    /// `POST url` with a form-encoded body and decode the JSON response.
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, String)],
    ) -> Result<T, UpstreamError> {
        self.send_json(self.http.post(url).form(form)).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, UpstreamError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let url = request.url().clone();

        self.gate.acquire().await;

        let started = Instant::now();
        let response = self.http.execute(request).await.map_err(|e| {
            warn!(%method, url = %url, error = %e, "upstream request failed");
            UpstreamError::from(e)
        })?;

        let status = response.status();
        debug!(
            %method,
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        if !status.is_success() {
            warn!(%method, url = %url, status = status.as_u16(), "upstream returned error status");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_drop_trailing_slashes() {
        let config = ServerConfig {
            nominatim_url: "http://localhost:8080/".into(),
            osrm_url: "http://localhost:5000//".into(),
            ..ServerConfig::default()
        };
        let endpoints = Endpoints::from_config(&config);
        assert_eq!(endpoints.nominatim, "http://localhost:8080");
        assert_eq!(endpoints.osrm, "http://localhost:5000");
        assert_eq!(endpoints.overpass, crate::config::DEFAULT_OVERPASS_URL);
    }

    #[test]
    fn status_error_renders_code_and_reason() {
        let err = UpstreamError::Status {
            status: 504,
            reason: "Gateway Timeout".into(),
        };
        assert_eq!(err.to_string(), "504 Gateway Timeout");
    }

    #[test]
    fn client_shares_one_gate_across_clones() {
        let client = UpstreamClient::from_config(&ServerConfig::default()).unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(client.gate(), clone.gate()));
        assert_eq!(client.gate().interval(), ServerConfig::default().throttle);
    }
}
