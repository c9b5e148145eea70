//! Address resolution: text normalization, the geocode cache, the two
//! providers and the chain that ties them together.

pub mod cache;
pub mod chain;
pub mod google;
pub mod nominatim;
pub mod normalize;

pub use cache::GeocodeCache;
pub use chain::{Origin, ProviderChain, Resolution};
pub use google::GoogleGeocodingProvider;
pub use nominatim::NominatimProvider;

use crate::common::types::AddressRecord;

/// What a single provider call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderOutcome {
    Found(AddressRecord),
    NotFound,
    /// The provider refused us (bad key, quota). No point asking it again.
    Denied(String),
    /// Transport, HTTP status or payload problems. The next source may still answer.
    TransientError(String),
}

impl ProviderOutcome {
    /// Wraps a provider answer. Text fields are trimmed, and a record left
    /// without any usable field counts as no result.
    pub fn found(record: AddressRecord) -> Self {
        let record = record.trimmed();
        if record.is_empty() {
            ProviderOutcome::NotFound
        } else {
            ProviderOutcome::Found(record)
        }
    }

    /// Runs a `Found` through [`ProviderOutcome::found`]; other outcomes pass as is.
    pub fn canonical(self) -> Self {
        match self {
            ProviderOutcome::Found(record) => Self::found(record),
            other => other,
        }
    }
}

/// A geocoding service queried with free text.
#[async_trait::async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Resolve one query. Implementations must not return errors; every
    /// failure is mapped into a `ProviderOutcome`.
    async fn geocode(&self, query: &str) -> ProviderOutcome;
}
