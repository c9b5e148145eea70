use crate::common::error::Result;
use crate::common::types::{AddressRecord, RinkIdentity};
use crate::config::GeocodingConfig;
use crate::geocode::normalize::{normalize_identity, NormalizedIdentity};
use crate::geocode::{
    GeocodeCache, GeocodeProvider, GoogleGeocodingProvider, NominatimProvider, ProviderOutcome,
};
use tracing::{debug, info, instrument, warn};

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Primary,
    Secondary,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: AddressRecord,
    pub origin: Origin,
    /// Outbound provider calls made for this identity.
    pub calls: usize,
}

impl Resolution {
    pub fn made_outbound_calls(&self) -> bool {
        self.calls > 0
    }
}

/// Cache first, then the free provider once, then the paid provider with up
/// to three query variants. Never fails: the worst case is an empty record.
pub struct ProviderChain {
    primary: Box<dyn GeocodeProvider>,
    secondary: Option<Box<dyn GeocodeProvider>>,
    cache: GeocodeCache,
    region_suffix: String,
}

fn join_query(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProviderChain {
    pub fn new(
        primary: Box<dyn GeocodeProvider>,
        secondary: Option<Box<dyn GeocodeProvider>>,
        cache: GeocodeCache,
        region_suffix: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache,
            region_suffix: region_suffix.into(),
        }
    }

    /// Nominatim as primary, Google as secondary when a key is configured.
    pub fn from_config(config: &GeocodingConfig, cache: GeocodeCache) -> Result<Self> {
        let client = config.http_client()?;
        let primary = NominatimProvider::new(client.clone(), config);
        let secondary = GoogleGeocodingProvider::from_config(client, config)
            .map(|provider| Box::new(provider) as Box<dyn GeocodeProvider>);
        if secondary.is_none() {
            info!("No Google API key configured, secondary geocoding disabled");
        }
        Ok(Self::new(
            Box::new(primary),
            secondary,
            cache,
            config.region_suffix.clone(),
        ))
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    pub fn into_cache(self) -> GeocodeCache {
        self.cache
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn primary_query(&self, identity: &NormalizedIdentity) -> String {
        join_query(&[&identity.name, &identity.borough, &self.region_suffix])
    }

    /// Secondary variants in priority order, duplicates dropped.
    pub fn secondary_queries(&self, identity: &NormalizedIdentity) -> Vec<String> {
        let candidates = [
            join_query(&[&identity.name, &identity.borough, &self.region_suffix]),
            join_query(&[&identity.bare_name, &self.region_suffix]),
            join_query(&[&identity.name, &self.region_suffix]),
        ];
        let mut queries: Vec<String> = Vec::with_capacity(candidates.len());
        for query in candidates {
            if !queries.contains(&query) {
                queries.push(query);
            }
        }
        queries
    }

    pub async fn resolve(&mut self, identity: &RinkIdentity) -> AddressRecord {
        self.resolve_with_origin(identity).await.record
    }

    #[instrument(skip(self), fields(rink = %identity.name, borough = %identity.borough))]
    pub async fn resolve_with_origin(&mut self, identity: &RinkIdentity) -> Resolution {
        if let Some(record) = self.cache.lookup(identity) {
            debug!("Cache hit");
            return Resolution {
                record: record.clone(),
                origin: Origin::Cache,
                calls: 0,
            };
        }

        let normalized = normalize_identity(identity);
        let mut calls = 0;

        let query = self.primary_query(&normalized);
        calls += 1;
        match self.primary.geocode(&query).await.canonical() {
            ProviderOutcome::Found(record) => {
                log_found(self.primary.name(), &record);
                self.cache.store(identity, record.clone());
                return Resolution {
                    record,
                    origin: Origin::Primary,
                    calls,
                };
            }
            ProviderOutcome::NotFound => {
                info!("No results found for {} from {}", identity.name, self.primary.name());
            }
            ProviderOutcome::Denied(reason) | ProviderOutcome::TransientError(reason) => {
                warn!(
                    "Error getting address for {} from {}: {}",
                    identity.name,
                    self.primary.name(),
                    reason
                );
            }
        }

        let queries = self.secondary_queries(&normalized);
        if let Some(secondary) = self.secondary.as_deref() {
            for query in queries {
                calls += 1;
                match secondary.geocode(&query).await.canonical() {
                    ProviderOutcome::Found(record) => {
                        log_found(secondary.name(), &record);
                        self.cache.store(identity, record.clone());
                        return Resolution {
                            record,
                            origin: Origin::Secondary,
                            calls,
                        };
                    }
                    ProviderOutcome::NotFound => {
                        debug!("No {} result for '{}'", secondary.name(), query);
                    }
                    ProviderOutcome::TransientError(reason) => {
                        warn!("{} failed for '{}': {}, trying next variant", secondary.name(), query, reason);
                    }
                    ProviderOutcome::Denied(reason) => {
                        warn!("{} denied the request: {}, giving up on {}", secondary.name(), reason, identity.name);
                        break;
                    }
                }
            }
        }

        warn!("Could not resolve an address for {}", identity.name);
        Resolution {
            record: AddressRecord::empty(),
            origin: Origin::Unresolved,
            calls,
        }
    }
}

fn log_found(provider: &str, record: &AddressRecord) {
    info!("Found via {}: {}", provider, record.display_name);
    if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
        info!("Coordinates: {}, {}", lat, lon);
    }
    if !record.borough_hint.is_empty() {
        info!("Provider borough: {}", record.borough_hint);
    }
}
