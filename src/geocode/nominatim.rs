use crate::common::constants::NOMINATIM_PROVIDER;
use crate::common::error::{Result, ScraperError};
use crate::common::types::AddressRecord;
use crate::config::GeocodingConfig;
use crate::geocode::{GeocodeProvider, ProviderOutcome};
use serde::Deserialize;
use tracing::{debug, info, instrument};

/// OpenStreetMap's free search endpoint.
pub struct NominatimProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct Place {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    lat: String,
    #[serde(default)]
    lon: String,
    #[serde(default)]
    address: PlaceAddress,
}

#[derive(Debug, Default, Deserialize)]
struct PlaceAddress {
    borough: Option<String>,
    suburb: Option<String>,
    city_district: Option<String>,
}

impl NominatimProvider {
    /// The client must already carry the identifying User-Agent Nominatim requires.
    pub fn new(client: reqwest::Client, config: &GeocodingConfig) -> Self {
        Self {
            client,
            base_url: config.nominatim_url.clone(),
        }
    }

    pub fn build_request(&self, query: &str) -> Result<reqwest::Request> {
        Ok(self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .build()?)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<u8>> {
        let request = self.build_request(query)?;
        let response = self.client.execute(request).await?;
        if !response.status().is_success() {
            return Err(ScraperError::Api {
                message: format!("Nominatim responded with status {}", response.status()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim().parse().ok()
}

/// Maps a search response body to an outcome. Only the first candidate counts.
pub fn parse_response(body: &[u8]) -> ProviderOutcome {
    let places: Vec<Place> = match serde_json::from_slice(body) {
        Ok(places) => places,
        Err(e) => return ProviderOutcome::TransientError(format!("bad Nominatim payload: {e}")),
    };
    let Some(place) = places.into_iter().next() else {
        return ProviderOutcome::NotFound;
    };

    let borough_hint = place
        .address
        .borough
        .or(place.address.suburb)
        .or(place.address.city_district)
        .unwrap_or_default();

    ProviderOutcome::found(AddressRecord {
        display_name: place.display_name,
        latitude: parse_coordinate(&place.lat),
        longitude: parse_coordinate(&place.lon),
        borough_hint,
    })
}

#[async_trait::async_trait]
impl GeocodeProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        NOMINATIM_PROVIDER
    }

    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> ProviderOutcome {
        info!("Querying OSM with: {}", query);
        let body = match self.fetch(query).await {
            Ok(body) => body,
            Err(e) => return ProviderOutcome::TransientError(e.to_string()),
        };
        let outcome = parse_response(&body);
        debug!("Nominatim outcome: {:?}", outcome);
        outcome
    }
}
