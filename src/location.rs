use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A saved city. Fields are never edited after creation; the list only
/// reorders or drops entries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default = "Location::default_country")]
    pub country: String,
    /// IANA timezone identifier, e.g. `Europe/Paris`
    #[serde(default = "Location::default_zone")]
    pub zone: String,
}

impl Location {
    pub const UNKNOWN_COUNTRY: &'static str = "Unknown";
    pub const DEFAULT_ZONE: &'static str = "UTC";

    /// Build a location, filling in defaults for missing country/zone
    pub fn new(
        name: impl Into<String>,
        country: Option<String>,
        zone: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            country: country.unwrap_or_else(Self::default_country),
            zone: zone.unwrap_or_else(Self::default_zone),
        }
    }

    /// Identity used for de-duplication. Zone is not part of it
    pub fn key(&self) -> LocationKey {
        LocationKey {
            name: self.name.clone(),
            country: self.country.clone(),
        }
    }

    pub fn matches(&self, key: &LocationKey) -> bool {
        self.name == key.name && self.country == key.country
    }

    fn default_country() -> String {
        Self::UNKNOWN_COUNTRY.into()
    }

    fn default_zone() -> String {
        Self::DEFAULT_ZONE.into()
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} ({})", self.name, self.country, self.zone)
    }
}

/// Stable handle to a location in the list. Positions shift when the list is
/// mutated, so anything held across user input should use this instead.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct LocationKey {
    pub name: String,
    pub country: String,
}
