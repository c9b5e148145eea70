use crate::apis::{ListingSource, MontrealRinksCrawler};
use crate::common::constants::SNAPSHOT_TIME_FORMAT;
use crate::common::error::Result;
use crate::common::types::{
    AddressRecord, BoroughListing, EnrichedBorough, EnrichedRink, RinkIdentity,
};
use crate::config::Config;
use crate::geocode::{GeocodeCache, Origin, ProviderChain, Resolution};
use crate::parser::parse_listing;
use crate::snapshot::write_snapshot;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Result of a complete pipeline run.
///
/// Every listed rink lands in exactly one origin bucket. A repeated
/// (name, borough) row reuses the address resolved for its first occurrence
/// and counts as a cache hit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub boroughs: usize,
    pub rinks: usize,
    pub cache_hits: usize,
    pub primary_hits: usize,
    pub secondary_hits: usize,
    pub unresolved: usize,
    pub updated: String,
    pub output_file: PathBuf,
}

impl RunSummary {
    fn count(&mut self, origin: Origin) {
        match origin {
            Origin::Cache => self.cache_hits += 1,
            Origin::Primary => self.primary_hits += 1,
            Origin::Secondary => self.secondary_hits += 1,
            Origin::Unresolved => self.unresolved += 1,
        }
    }
}

/// One run: fetch listing, parse, geocode every rink, write the snapshot.
pub struct Pipeline {
    source: Box<dyn ListingSource>,
    chain: ProviderChain,
    politeness_delay: Duration,
    output_path: PathBuf,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn ListingSource>,
        chain: ProviderChain,
        politeness_delay: Duration,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            chain,
            politeness_delay,
            output_path: output_path.into(),
        }
    }

    /// Wires the Montréal crawler and the provider chain, seeding the cache
    /// from the previous snapshot.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = GeocodeCache::from_snapshot(config.snapshot.cache_source());
        let chain = ProviderChain::from_config(&config.geocoding, cache)?;
        let source = MontrealRinksCrawler::new(config.geocoding.http_client()?, &config.source.url);
        Ok(Self::new(
            Box::new(source),
            chain,
            config.geocoding.politeness_delay(),
            config.snapshot.path.clone(),
        ))
    }

    pub fn chain(&self) -> &ProviderChain {
        &self.chain
    }

    #[instrument(skip(self), fields(source = self.source.source_name()))]
    pub async fn run(&mut self) -> Result<RunSummary> {
        let html = self.source.fetch_listing().await?;
        let listing = parse_listing(&html);

        let (boroughs, mut summary) = self.enrich(listing).await;
        summary.updated = chrono::Local::now().format(SNAPSHOT_TIME_FORMAT).to_string();
        summary.output_file = self.output_path.clone();

        write_snapshot(&self.output_path, &boroughs, &summary.updated)?;
        info!("Pipeline finished");
        Ok(summary)
    }

    /// Resolves every distinct identity once, in document order, then builds
    /// the output records from that mapping.
    pub async fn enrich(
        &mut self,
        listing: Vec<BoroughListing>,
    ) -> (Vec<EnrichedBorough>, RunSummary) {
        let mut summary = RunSummary {
            boroughs: listing.len(),
            rinks: listing.iter().map(|b| b.rinks.len()).sum(),
            ..RunSummary::default()
        };

        let mut resolved: HashMap<RinkIdentity, AddressRecord> = HashMap::new();
        let mut last_outbound: Option<Instant> = None;

        for borough in &listing {
            info!("Processing borough: {}", borough.name);
            for rink in &borough.rinks {
                let identity = rink.identity(&borough.name);
                if resolved.contains_key(&identity) {
                    summary.count(Origin::Cache);
                    continue;
                }
                info!("Looking up address for: {}", identity.name);
                self.throttle(&identity, last_outbound).await;

                let resolution: Resolution = self.chain.resolve_with_origin(&identity).await;
                if resolution.made_outbound_calls() {
                    last_outbound = Some(Instant::now());
                }
                summary.count(resolution.origin);
                resolved.insert(identity, resolution.record);
            }
            debug!("Finished processing borough: {}", borough.name);
        }

        let boroughs = listing
            .into_iter()
            .map(|borough| {
                let rinks = borough
                    .rinks
                    .into_iter()
                    .map(|rink| {
                        let address = resolved
                            .get(&rink.identity(&borough.name))
                            .cloned()
                            .unwrap_or_default();
                        EnrichedRink { rink, address }
                    })
                    .collect();
                EnrichedBorough {
                    name: borough.name,
                    rinks,
                }
            })
            .collect();

        (boroughs, summary)
    }

    /// Waits out the politeness delay before an identity that will go to the
    /// network, counted from the last outbound round.
    async fn throttle(&self, identity: &RinkIdentity, last_outbound: Option<Instant>) {
        if self.chain.cache().lookup(identity).is_some() {
            return;
        }
        if let Some(last) = last_outbound {
            let elapsed = last.elapsed();
            if elapsed < self.politeness_delay {
                let wait = self.politeness_delay - elapsed;
                debug!("Waiting {:?} before the next lookup", wait);
                tokio::time::sleep(wait).await;
            }
        }
    }
}
