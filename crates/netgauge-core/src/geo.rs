//! Geolocation lookup
//!
//! Best-effort resolution of the current public address into a coarse
//! location label via an ipinfo-style JSON endpoint. Failures are logged
//! and reported as `None`; they never affect a measurement.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://ipinfo.io/json";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Approximate location of the current public address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Public IP address
    pub ip: String,
    /// City name, when the service reports one
    pub city: Option<String>,
    /// Country code, when the service reports one
    pub country: Option<String>,
    /// Network organization string, when the service reports one
    pub org: Option<String>,
}

impl LocationInfo {
    /// Display label in the form `City, CC - Org`, degrading to whatever
    /// fields are present
    pub fn label(&self) -> String {
        match (&self.city, &self.country) {
            (Some(city), Some(country)) => match &self.org {
                Some(org) => format!("{city}, {country} - {org}"),
                None => format!("{city}, {country}"),
            },
            _ => self.ip.clone(),
        }
    }
}

/// Client for the public-address lookup service
pub struct GeoClient {
    /// HTTP client for lookup requests
    client: reqwest::Client,
    /// Endpoint returning ipinfo-style JSON
    endpoint: String,
}

impl GeoClient {
    /// Create a client against the default public endpoint
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Create a client against a custom endpoint (used by tests)
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("NetGauge/", env!("CARGO_PKG_VERSION")))
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Resolve the current public address, best-effort
    ///
    /// Returns `None` on any failure (network down, non-2xx status,
    /// malformed body) so callers always have an explicit "unavailable"
    /// state rather than stand-in values.
    pub async fn lookup_current_location(&self) -> Option<LocationInfo> {
        match self.fetch().await {
            Ok(info) => {
                tracing::debug!("location lookup: {}", info.label());
                Some(info)
            }
            Err(e) => {
                tracing::debug!("location lookup failed: {e}");
                None
            }
        }
    }

    async fn fetch(&self) -> Result<LocationInfo, reqwest::Error> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?;
        response.json::<LocationInfo>().await
    }
}

impl Default for GeoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_full() {
        let info = LocationInfo {
            ip: "203.0.113.7".into(),
            city: Some("Lahore".into()),
            country: Some("PK".into()),
            org: Some("AS9541 Example Telecom".into()),
        };
        assert_eq!(info.label(), "Lahore, PK - AS9541 Example Telecom");
    }

    #[test]
    fn test_label_without_org() {
        let info = LocationInfo {
            ip: "203.0.113.7".into(),
            city: Some("Lahore".into()),
            country: Some("PK".into()),
            org: None,
        };
        assert_eq!(info.label(), "Lahore, PK");
    }

    #[test]
    fn test_label_falls_back_to_ip() {
        let info = LocationInfo {
            ip: "203.0.113.7".into(),
            city: None,
            country: Some("PK".into()),
            org: None,
        };
        assert_eq!(info.label(), "203.0.113.7");
    }

    #[test]
    fn test_wire_format() {
        let info: LocationInfo = serde_json::from_str(
            r#"{"ip":"203.0.113.7","city":"Bahawalpur","country":"PK","org":"Example"}"#,
        )
        .unwrap();
        assert_eq!(info.ip, "203.0.113.7");
        assert_eq!(info.city.as_deref(), Some("Bahawalpur"));

        // Optional fields may be absent entirely
        let partial: LocationInfo = serde_json::from_str(r#"{"ip":"203.0.113.7"}"#).unwrap();
        assert!(partial.city.is_none());
        assert!(partial.org.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_none() {
        // Nothing listens on port 1; connection is refused immediately
        let client = GeoClient::with_endpoint("http://127.0.0.1:1/json");
        assert!(client.lookup_current_location().await.is_none());
    }
}
