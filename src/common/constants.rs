/// Endpoint and naming constants shared across the scraper.

// Source listing
pub const MONTREAL_RINKS_URL: &str = "https://montreal2.qc.ca/ski/en/conditions_patinoires_arr.php";

// Geocoding providers
pub const NOMINATIM_PROVIDER: &str = "nominatim";
pub const GOOGLE_PROVIDER: &str = "google";
pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Nominatim's usage policy requires an identifying User-Agent.
pub const DEFAULT_USER_AGENT: &str = "RinkStatusBot/1.0";

/// Appended to every geocoding query to pin results to the island.
pub const DEFAULT_REGION_SUFFIX: &str = "Montréal, QC";

/// Environment variable holding the paid provider credential.
pub const GOOGLE_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

pub const DEFAULT_POLITENESS_DELAY_MS: u64 = 1000;
pub const DEFAULT_SNAPSHOT_PATH: &str = "montreal_rinks.xml";
pub const DEFAULT_CONFIG_PATH: &str = "rinks.toml";

// Logging defaults, overridable from the [logging] config section
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "rink_scraper.log";
pub const DEFAULT_LOG_FILTER: &str = "rink_scraper=info";

// Listing defaults
pub const UNKNOWN_RINK_TYPE: &str = "Unknown";
pub const MISSING_STATUS: &str = "N/A";

/// Snapshot timestamp format for the root `updated` attribute.
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
