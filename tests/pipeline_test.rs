use rink_scraper::apis::ListingSource;
use rink_scraper::common::error::Result;
use rink_scraper::common::types::{AddressRecord, RinkIdentity};
use rink_scraper::geocode::{GeocodeCache, GeocodeProvider, ProviderChain, ProviderOutcome};
use rink_scraper::pipeline::Pipeline;
use rink_scraper::snapshot::read_snapshot;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const LISTING: &str = r#"
<html><body>
  <h2>Ahuntsic-Cartierville</h2>
  <table>
    <tr><th>Patinoire</th><th>Ouvert</th><th>Déblayé</th><th>Arrosé</th><th>Resurfacé</th><th>Condition</th></tr>
    <tr><td>Patinoire, Parc Ahuntsic (LR)</td><td>Oui</td><td>Oui</td><td>Non</td><td>Oui</td><td>Bon</td></tr>
    <tr><td>Patinoire, Parc Saint-Benoît (PSE)</td><td>Non</td><td>Non</td><td>Non</td><td>Non</td><td>Fermée</td></tr>
  </table>
  <h2>Villeray–Saint-Michel–Parc-Extension</h2>
  <table>
    <tr><td>Patinoire, Parc Jarry (PP)</td><td>Oui</td><td>Oui</td><td>Oui</td><td>Non</td><td>Excellente</td></tr>
    <tr><td>Patinoire, Parc Ahuntsic (PSE)</td><td>Oui</td><td>Non</td><td>Non</td><td>Non</td><td>Bon</td></tr>
  </table>
</body></html>
"#;

struct StaticListing(&'static str);

#[async_trait::async_trait]
impl ListingSource for StaticListing {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn fetch_listing(&self) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Answers from a fixed table keyed by query text and logs every query.
struct TableProvider {
    answers: HashMap<String, ProviderOutcome>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl TableProvider {
    fn boxed(
        answers: Vec<(&str, ProviderOutcome)>,
    ) -> (Box<dyn GeocodeProvider>, Arc<Mutex<Vec<String>>>) {
        let queries = Arc::new(Mutex::new(Vec::new()));
        let provider = Self {
            answers: answers
                .into_iter()
                .map(|(q, outcome)| (q.to_string(), outcome))
                .collect(),
            queries: queries.clone(),
        };
        (Box::new(provider), queries)
    }
}

#[async_trait::async_trait]
impl GeocodeProvider for TableProvider {
    fn name(&self) -> &'static str {
        "table"
    }

    async fn geocode(&self, query: &str) -> ProviderOutcome {
        self.queries.lock().unwrap().push(query.to_string());
        self.answers
            .get(query)
            .cloned()
            .unwrap_or(ProviderOutcome::NotFound)
    }
}

fn record(display_name: &str, lat: f64, lon: f64, borough: &str) -> AddressRecord {
    AddressRecord {
        display_name: display_name.to_string(),
        latitude: Some(lat),
        longitude: Some(lon),
        borough_hint: borough.to_string(),
    }
}

fn ahuntsic_record() -> AddressRecord {
    record("Parc Ahuntsic, Montréal", 45.5532, -73.6556, "Ahuntsic-Cartierville")
}

fn jarry_record() -> AddressRecord {
    record("285 Rue Faillon O, Montréal", 45.5339, -73.6284, "")
}

fn pipeline_with(
    output: &Path,
    cache: GeocodeCache,
    delay: Duration,
) -> (Pipeline, Arc<Mutex<Vec<String>>>, Arc<Mutex<Vec<String>>>) {
    let (primary, primary_queries) = TableProvider::boxed(vec![(
        "Parc Ahuntsic, Ahuntsic-Cartierville, Montréal, QC",
        ProviderOutcome::Found(ahuntsic_record()),
    )]);
    let (secondary, secondary_queries) = TableProvider::boxed(vec![(
        "Jarry, Montréal, QC",
        ProviderOutcome::Found(jarry_record()),
    )]);
    let chain = ProviderChain::new(primary, Some(secondary), cache, "Montréal, QC");
    let pipeline = Pipeline::new(Box::new(StaticListing(LISTING)), chain, delay, output);
    (pipeline, primary_queries, secondary_queries)
}

#[tokio::test]
async fn test_full_run_writes_enriched_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("montreal_rinks.xml");

    let (mut pipeline, primary_queries, secondary_queries) =
        pipeline_with(&output, GeocodeCache::new(), Duration::ZERO);
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.boroughs, 2);
    assert_eq!(summary.rinks, 4);
    assert_eq!(summary.primary_hits, 1);
    assert_eq!(summary.secondary_hits, 1);
    assert_eq!(summary.unresolved, 1);
    // The second "Parc Ahuntsic" shares the cache entry of the first.
    assert_eq!(summary.cache_hits, 1);
    assert_eq!(summary.output_file, output);

    // Ahuntsic, Saint-Benoît, Jarry; the repeated Ahuntsic never reaches a provider.
    assert_eq!(primary_queries.lock().unwrap().len(), 3);
    assert_eq!(
        *secondary_queries.lock().unwrap(),
        vec![
            "Parc Saint-Benoît, Ahuntsic-Cartierville, Montréal, QC".to_string(),
            "Saint-Benoît, Montréal, QC".to_string(),
            "Parc Saint-Benoît, Montréal, QC".to_string(),
            "Parc Jarry, Villeray–Saint-Michel–Parc-Extension, Montréal, QC".to_string(),
            "Jarry, Montréal, QC".to_string(),
        ]
    );

    let document = read_snapshot(&output).unwrap();
    assert_eq!(document.updated, summary.updated);
    assert_eq!(document.boroughs.len(), 2);

    let ahuntsic = &document.boroughs[0].rinks[0];
    assert_eq!(ahuntsic.kind, "Patinoire");
    assert_eq!(ahuntsic.code, "LR");
    assert_eq!(ahuntsic.name, "Parc Ahuntsic");
    assert_eq!(ahuntsic.location.address, "Parc Ahuntsic, Montréal");
    assert_eq!(ahuntsic.location.coordinates.lat, "45.5532");
    assert_eq!(ahuntsic.status.sprayed, "Non");

    let saint_benoit = &document.boroughs[0].rinks[1];
    assert_eq!(saint_benoit.location.address, "");
    assert_eq!(saint_benoit.location.coordinates.lat, "");

    let repeated = &document.boroughs[1].rinks[1];
    assert_eq!(repeated.code, "PSE");
    assert_eq!(repeated.location.address, "Parc Ahuntsic, Montréal");
}

#[tokio::test]
async fn test_second_run_is_served_from_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("montreal_rinks.xml");

    let (mut first, _, _) = pipeline_with(&output, GeocodeCache::new(), Duration::ZERO);
    first.run().await.unwrap();

    let cache = GeocodeCache::from_snapshot(&output);
    assert_eq!(cache.len(), 2);
    assert_eq!(
        cache.lookup(&RinkIdentity::new("Parc Ahuntsic", "Ahuntsic-Cartierville")),
        Some(&ahuntsic_record())
    );
    assert_eq!(
        cache.lookup(&RinkIdentity::new("Parc Jarry", "")),
        Some(&jarry_record())
    );

    let (mut second, primary_queries, secondary_queries) =
        pipeline_with(&output, cache, Duration::ZERO);
    let summary = second.run().await.unwrap();

    // Only the rink left unresolved last time goes back to the providers.
    assert_eq!(summary.cache_hits, 3);
    assert_eq!(summary.unresolved, 1);
    assert_eq!(
        *primary_queries.lock().unwrap(),
        vec!["Parc Saint-Benoît, Ahuntsic-Cartierville, Montréal, QC".to_string()]
    );
    assert_eq!(secondary_queries.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_politeness_delay_between_outbound_lookups() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("montreal_rinks.xml");
    let delay = Duration::from_millis(40);

    let (mut pipeline, _, _) = pipeline_with(&output, GeocodeCache::new(), delay);
    let started = Instant::now();
    pipeline.run().await.unwrap();

    // Three identities hit the network, so at least two pauses.
    assert!(started.elapsed() >= delay * 2);
}

#[tokio::test]
async fn test_cached_run_does_not_wait() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("montreal_rinks.xml");

    let mut cache = GeocodeCache::new();
    cache.store(&RinkIdentity::new("Parc Ahuntsic", ""), ahuntsic_record());
    cache.store(&RinkIdentity::new("Parc Saint-Benoît", ""), ahuntsic_record());
    cache.store(&RinkIdentity::new("Parc Jarry", ""), jarry_record());

    let (mut pipeline, primary_queries, _) =
        pipeline_with(&output, cache, Duration::from_secs(30));
    let summary = tokio::time::timeout(Duration::from_secs(5), pipeline.run())
        .await
        .expect("a fully cached run must not sleep")
        .unwrap();

    // "Parc Ahuntsic" is listed in two boroughs, so four identities, all cached.
    assert_eq!(summary.cache_hits, 4);
    assert_eq!(summary.primary_hits + summary.secondary_hits + summary.unresolved, 0);
    assert!(primary_queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_row_counts_as_cache_hit() {
    const REPEATED: &str = r#"
<html><body>
  <h2>Villeray–Saint-Michel–Parc-Extension</h2>
  <table>
    <tr><td>Patinoire, Parc Jarry (PP)</td><td>Oui</td><td>Oui</td><td>Oui</td><td>Non</td><td>Excellente</td></tr>
    <tr><td>Patinoire, Parc Jarry (PSE)</td><td>Oui</td><td>Non</td><td>Non</td><td>Non</td><td>Bon</td></tr>
  </table>
</body></html>
"#;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("montreal_rinks.xml");

    let (primary, primary_queries) = TableProvider::boxed(vec![]);
    let (secondary, secondary_queries) = TableProvider::boxed(vec![(
        "Jarry, Montréal, QC",
        ProviderOutcome::Found(jarry_record()),
    )]);
    let chain = ProviderChain::new(primary, Some(secondary), GeocodeCache::new(), "Montréal, QC");
    let mut pipeline = Pipeline::new(
        Box::new(StaticListing(REPEATED)),
        chain,
        Duration::ZERO,
        &output,
    );
    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.rinks, 2);
    assert_eq!(summary.secondary_hits, 1);
    assert_eq!(summary.cache_hits, 1);
    assert_eq!(
        summary.cache_hits + summary.primary_hits + summary.secondary_hits + summary.unresolved,
        summary.rinks
    );
    assert_eq!(primary_queries.lock().unwrap().len(), 1);
    assert_eq!(secondary_queries.lock().unwrap().len(), 2);

    let document = read_snapshot(&output).unwrap();
    let rinks = &document.boroughs[0].rinks;
    assert_eq!(rinks[1].code, "PSE");
    assert_eq!(rinks[1].location.address, "285 Rue Faillon O, Montréal");
}
