/// The (name, borough) pair used to look a rink up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RinkIdentity {
    pub name: String,
    pub borough: String,
}

impl RinkIdentity {
    pub fn new(name: impl Into<String>, borough: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            borough: borough.into(),
        }
    }
}

/// A geocoded address. A record with every field empty means "unresolved",
/// which is a valid result rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressRecord {
    pub display_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub borough_hint: String,
}

impl AddressRecord {
    /// The unresolved placeholder.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Strips surrounding whitespace from the text fields. Records are kept in
    /// this form so that they read back from a snapshot unchanged.
    pub fn trimmed(self) -> Self {
        Self {
            display_name: self.display_name.trim().to_string(),
            borough_hint: self.borough_hint.trim().to_string(),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.display_name.is_empty()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.borough_hint.is_empty()
    }
}

/// Maintenance status columns of the listing, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RinkStatus {
    pub open: String,
    pub cleared: String,
    pub sprayed: String,
    pub resurfaced: String,
    pub condition: String,
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rink {
    /// Rink type as published, e.g. "Patinoire" or "Anneau de glace".
    pub kind: String,
    pub name: String,
    /// Short code in parentheses after the name (e.g. "LR", "TSR"), empty when absent.
    pub code: String,
    pub status: RinkStatus,
}

impl Rink {
    pub fn identity(&self, borough: &str) -> RinkIdentity {
        RinkIdentity::new(self.name.clone(), borough)
    }
}

/// A borough section of the listing with its rinks in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoroughListing {
    pub name: String,
    pub rinks: Vec<Rink>,
}

/// A rink together with the address resolved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRink {
    pub rink: Rink,
    pub address: AddressRecord,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedBorough {
    pub name: String,
    pub rinks: Vec<EnrichedRink>,
}
