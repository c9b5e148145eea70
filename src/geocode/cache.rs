use crate::common::types::{AddressRecord, RinkIdentity};
use crate::geocode::normalize::normalize_name;
use crate::snapshot;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Resolved addresses keyed by rink name.
///
/// The key ignores the borough: two rinks sharing a name in different
/// boroughs share one entry. Only non-empty records are held, so unresolved
/// rinks from a previous run are retried.
#[derive(Debug, Default, Clone)]
pub struct GeocodeCache {
    entries: HashMap<String, AddressRecord>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for an identity: its normalized name, so spellings that
    /// produce the same provider queries share one entry.
    pub fn key_for(identity: &RinkIdentity) -> String {
        normalize_name(&identity.name)
    }

    pub fn lookup(&self, identity: &RinkIdentity) -> Option<&AddressRecord> {
        self.entries.get(&Self::key_for(identity))
    }

    /// Stores `record` for the identity's name, with its text fields trimmed.
    /// Empty records are ignored and a non-empty record already held is kept.
    /// Returns whether the cache changed.
    pub fn store(&mut self, identity: &RinkIdentity, record: AddressRecord) -> bool {
        let record = record.trimmed();
        if record.is_empty() {
            return false;
        }
        let key = Self::key_for(identity);
        match self.entries.get(&key) {
            Some(existing) if !existing.is_empty() => {
                debug!("Keeping cached address for '{}'", key);
                false
            }
            _ => {
                self.entries.insert(key, record);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seeds the cache from a previous snapshot. Never fails: a missing file or
    /// an unreadable document gives an empty cache, bad entries are skipped.
    pub fn from_snapshot(path: &Path) -> Self {
        let mut cache = Self::new();
        if !path.exists() {
            info!("No previous snapshot at {}, starting with an empty cache", path.display());
            return cache;
        }

        let document = match snapshot::read_snapshot(path) {
            Ok(document) => document,
            Err(e) => {
                warn!(
                    "Could not read previous snapshot {}: {}. Starting with an empty cache",
                    path.display(),
                    e
                );
                return cache;
            }
        };

        let (entries, skipped) = snapshot::cache_entries(&document);
        for (identity, record) in entries {
            cache.store(&identity, record);
        }
        info!(
            "Seeded geocode cache with {} addresses from {} ({} entries skipped)",
            cache.len(),
            path.display(),
            skipped
        );
        cache
    }
}
