//! The persisted XML snapshot: written at the end of every run and read back
//! at the start of the next one to seed the geocode cache.

use crate::common::error::Result;
use crate::common::types::{
    AddressRecord, EnrichedBorough, EnrichedRink, RinkIdentity, RinkStatus,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
const ROOT_ELEMENT: &str = "rinks";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(rename = "@updated", default)]
    pub updated: String,
    #[serde(rename = "borough", default)]
    pub boroughs: Vec<BoroughElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoroughElement {
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "rink", default)]
    pub rinks: Vec<RinkElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RinkElement {
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(rename = "@code", default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: LocationElement,
    #[serde(default)]
    pub status: StatusElement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationElement {
    /// Borough reported by the geocoder, omitted when unknown.
    #[serde(rename = "@borough", default, skip_serializing_if = "String::is_empty")]
    pub borough: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: CoordinatesElement,
}

/// Kept as text so a bad value only invalidates its own entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinatesElement {
    #[serde(rename = "@lat", default)]
    pub lat: String,
    #[serde(rename = "@lon", default)]
    pub lon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusElement {
    #[serde(default)]
    pub open: String,
    #[serde(default)]
    pub cleared: String,
    #[serde(default)]
    pub sprayed: String,
    #[serde(default)]
    pub resurfaced: String,
    #[serde(default)]
    pub condition: String,
}

fn format_coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl From<&EnrichedRink> for RinkElement {
    fn from(enriched: &EnrichedRink) -> Self {
        let rink = &enriched.rink;
        let address = &enriched.address;
        Self {
            kind: rink.kind.clone(),
            code: rink.code.clone(),
            name: rink.name.clone(),
            location: LocationElement {
                borough: address.borough_hint.clone(),
                address: address.display_name.clone(),
                coordinates: CoordinatesElement {
                    lat: format_coordinate(address.latitude),
                    lon: format_coordinate(address.longitude),
                },
            },
            status: StatusElement::from(&rink.status),
        }
    }
}

impl From<&RinkStatus> for StatusElement {
    fn from(status: &RinkStatus) -> Self {
        Self {
            open: status.open.clone(),
            cleared: status.cleared.clone(),
            sprayed: status.sprayed.clone(),
            resurfaced: status.resurfaced.clone(),
            condition: status.condition.clone(),
        }
    }
}

impl SnapshotDocument {
    pub fn from_boroughs(boroughs: &[EnrichedBorough], updated: &str) -> Self {
        Self {
            updated: updated.to_string(),
            boroughs: boroughs
                .iter()
                .map(|borough| BoroughElement {
                    name: borough.name.clone(),
                    rinks: borough.rinks.iter().map(RinkElement::from).collect(),
                })
                .collect(),
        }
    }

    /// Pretty-printed document, declaration included.
    pub fn to_xml(&self) -> Result<String> {
        let mut body = String::new();
        let mut serializer =
            quick_xml::se::Serializer::with_root(&mut body, Some(ROOT_ELEMENT))?;
        serializer.indent(' ', 2);
        self.serialize(serializer)?;

        let mut xml = String::with_capacity(XML_DECLARATION.len() + body.len() + 1);
        xml.push_str(XML_DECLARATION);
        xml.push_str(&body);
        xml.push('\n');
        Ok(xml)
    }

    pub fn from_xml(xml: &str) -> Result<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    pub fn rink_count(&self) -> usize {
        self.boroughs.iter().map(|b| b.rinks.len()).sum()
    }
}

/// Writes the snapshot through a temporary sibling file so a crash never
/// leaves a truncated snapshot behind.
pub fn write_snapshot(path: &Path, boroughs: &[EnrichedBorough], updated: &str) -> Result<()> {
    let document = SnapshotDocument::from_boroughs(boroughs, updated);
    let xml = document.to_xml()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("xml.tmp");
    fs::write(&tmp_path, xml)?;
    fs::rename(&tmp_path, path)?;

    info!(
        "Wrote snapshot with {} boroughs and {} rinks to {}",
        document.boroughs.len(),
        document.rink_count(),
        path.display()
    );
    Ok(())
}

pub fn read_snapshot(path: &Path) -> Result<SnapshotDocument> {
    let xml = fs::read_to_string(path)?;
    SnapshotDocument::from_xml(&xml)
}

fn parse_coordinate(raw: &str) -> std::result::Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| format!("invalid coordinate '{}': {}", raw, e))
}

fn address_from_location(location: &LocationElement) -> std::result::Result<AddressRecord, String> {
    let latitude = parse_coordinate(&location.coordinates.lat)?;
    let longitude = parse_coordinate(&location.coordinates.lon)?;
    if latitude.is_some() != longitude.is_some() {
        return Err("only one of lat/lon present".to_string());
    }
    Ok(AddressRecord {
        display_name: location.address.clone(),
        latitude,
        longitude,
        borough_hint: location.borough.clone(),
    })
}

/// Extracts resolved addresses from a snapshot. Unresolved rinks are left
/// out; malformed entries are logged, left out and counted in the second
/// element of the result.
pub fn cache_entries(document: &SnapshotDocument) -> (Vec<(RinkIdentity, AddressRecord)>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;

    for borough in &document.boroughs {
        for rink in &borough.rinks {
            let name = rink.name.trim();
            if name.is_empty() {
                warn!("Skipping snapshot rink without a name in borough '{}'", borough.name);
                skipped += 1;
                continue;
            }
            match address_from_location(&rink.location) {
                Ok(record) if record.is_empty() => {
                    debug!("Snapshot has no address for '{}', will look it up again", name);
                }
                Ok(record) => {
                    entries.push((RinkIdentity::new(name, borough.name.trim()), record));
                }
                Err(reason) => {
                    warn!("Skipping snapshot entry for '{}': {}", name, reason);
                    skipped += 1;
                }
            }
        }
    }
    (entries, skipped)
}
