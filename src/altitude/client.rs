//! HTTP client for the Google Maps Elevation API.

use async_trait::async_trait;
use serde::Deserialize;

use super::{AltitudeError, ElevationSource};
use crate::types::AltitudeConfig;

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    #[serde(default)]
    results: Vec<ElevationResult>,
    status: String,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ElevationResult {
    elevation: f64,
}

/// Read the elevation out of an API response body.
pub fn parse_elevation(body: &str) -> Result<f64, AltitudeError> {
    let response: ElevationResponse = serde_json::from_str(body)
        .map_err(|e| AltitudeError::MalformedResponse(format!("invalid JSON: {e}")))?;

    match response.status.as_str() {
        "OK" => response
            .results
            .first()
            .map(|r| r.elevation)
            .ok_or_else(|| AltitudeError::MalformedResponse("OK status without results".into())),
        "REQUEST_DENIED" | "OVER_DAILY_LIMIT" | "OVER_QUERY_LIMIT" => Err(AltitudeError::Denied {
            status: match response.error_message {
                Some(msg) => format!("{}: {}", response.status, msg),
                None => response.status,
            },
        }),
        other => Err(AltitudeError::MalformedResponse(format!(
            "unexpected status {other}"
        ))),
    }
}

pub struct GmapsElevationClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl GmapsElevationClient {
    pub fn new(config: &AltitudeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.gmaps_key.clone(),
        }
    }
}

#[async_trait]
impl ElevationSource for GmapsElevationClient {
    async fn elevation(&self, lat: f64, lng: f64) -> Result<f64, AltitudeError> {
        let key = self.api_key.as_deref().ok_or_else(|| AltitudeError::Denied {
            status: "no gmapsKey configured".to_string(),
        })?;

        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("locations", format!("{lat},{lng}")), ("key", key.to_string())])
            .send()
            .await
            .map_err(|e| AltitudeError::Network(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(AltitudeError::Denied {
                status: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(AltitudeError::Network(format!("HTTP {}", status.as_u16())));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| AltitudeError::Network(e.to_string()))?;
        parse_elevation(&body)
    }
}
