use crate::common::constants::GOOGLE_PROVIDER;
use crate::common::error::{Result, ScraperError};
use crate::common::types::AddressRecord;
use crate::config::GeocodingConfig;
use crate::geocode::{GeocodeProvider, ProviderOutcome};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

/// Google's paid Geocoding API, used when Nominatim comes back empty.
pub struct GoogleGeocodingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Option<Geometry>,
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GoogleGeocodingProvider {
    /// Returns `None` when no credential is configured; the chain then runs
    /// with the primary provider only.
    pub fn from_config(client: reqwest::Client, config: &GeocodingConfig) -> Option<Self> {
        let api_key = config.google_api_key.clone()?;
        Some(Self {
            client,
            base_url: config.google_url.clone(),
            api_key,
        })
    }

    pub fn build_request(&self, query: &str) -> Result<reqwest::Request> {
        Ok(self
            .client
            .get(&self.base_url)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .build()?)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<u8>> {
        let request = self.build_request(query)?;
        let response = self.client.execute(request).await?;
        if !response.status().is_success() {
            return Err(ScraperError::Api {
                message: format!("Google Geocoding responded with status {}", response.status()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn borough_from_components(components: &[AddressComponent]) -> String {
    let with_type = |wanted: &[&str]| {
        components
            .iter()
            .find(|c| c.types.iter().any(|t| wanted.contains(&t.as_str())))
            .map(|c| c.long_name.clone())
    };
    with_type(&["sublocality", "sublocality_level_1"])
        .or_else(|| with_type(&["neighborhood"]))
        .unwrap_or_default()
}

/// Maps a Geocoding API body to an outcome based on its `status` field.
pub fn parse_response(body: &[u8]) -> ProviderOutcome {
    let response: GeocodeResponse = match serde_json::from_slice(body) {
        Ok(response) => response,
        Err(e) => return ProviderOutcome::TransientError(format!("bad Google payload: {e}")),
    };
    let detail = || {
        response
            .error_message
            .clone()
            .map(|m| format!("{}: {}", response.status, m))
            .unwrap_or_else(|| response.status.clone())
    };

    match response.status.as_str() {
        "OK" => {
            let Some(result) = response.results.first() else {
                return ProviderOutcome::NotFound;
            };
            let (latitude, longitude) = match &result.geometry {
                Some(geometry) => (Some(geometry.location.lat), Some(geometry.location.lng)),
                None => (None, None),
            };
            ProviderOutcome::found(AddressRecord {
                display_name: result.formatted_address.clone(),
                latitude,
                longitude,
                borough_hint: borough_from_components(&result.address_components),
            })
        }
        "ZERO_RESULTS" => ProviderOutcome::NotFound,
        "REQUEST_DENIED" | "OVER_DAILY_LIMIT" | "OVER_QUERY_LIMIT" => {
            ProviderOutcome::Denied(detail())
        }
        _ => ProviderOutcome::TransientError(detail()),
    }
}

#[async_trait::async_trait]
impl GeocodeProvider for GoogleGeocodingProvider {
    fn name(&self) -> &'static str {
        GOOGLE_PROVIDER
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> ProviderOutcome {
        info!("Querying Google with: {}", query);
        let body = match self.fetch(query).await {
            Ok(body) => body,
            Err(e) => return ProviderOutcome::TransientError(e.to_string()),
        };
        let outcome = parse_response(&body);
        if let ProviderOutcome::Denied(reason) = &outcome {
            warn!("Google Geocoding denied the request: {}", reason);
        }
        debug!("Google outcome: {:?}", outcome);
        outcome
    }
}
