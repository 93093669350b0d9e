use crate::{
    location::{Location, LocationKey},
    settings::Settings,
    storage::Storage,
};
use anyhow::Context;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Owner of the saved location list and settings. This is the only thing that
/// writes to storage, and every mutation is persisted before returning.
pub struct LocationStore {
    storage: Box<dyn Storage>,
    locations: Vec<Location>,
    settings: Settings,
}

/// Result of [LocationStore::add]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddOutcome {
    Added,
    /// A location with the same name and country is already saved
    Duplicate,
}

/// Direction to move a location within the list
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Left,
    Right,
}

impl LocationStore {
    const LOCATIONS_KEY: &'static str = "locations";
    const SETTINGS_KEY: &'static str = "settings";

    /// Load persisted state. Anything missing or malformed falls back to
    /// defaults rather than failing, but a storage that can't be read at all
    /// is an error.
    pub fn load(storage: Box<dyn Storage>) -> anyhow::Result<Self> {
        let locations = read_key::<Vec<Value>>(&*storage, Self::LOCATIONS_KEY)?
            .map(coerce_locations)
            .unwrap_or_default();
        let settings = read_key::<Settings>(&*storage, Self::SETTINGS_KEY)?
            .unwrap_or_default();
        info!(
            "Loaded {} location(s), date format `{}`",
            locations.len(),
            settings.date_format
        );
        Ok(Self {
            storage,
            locations,
            settings,
        })
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Current position of a location, if it's still in the list
    pub fn position(&self, key: &LocationKey) -> Option<usize> {
        self.locations.iter().position(|location| location.matches(key))
    }

    /// Append a location, unless one with the same name and country is
    /// already present
    pub fn add(&mut self, location: Location) -> anyhow::Result<AddOutcome> {
        if self.position(&location.key()).is_some() {
            info!("Skipping duplicate location {location}");
            return Ok(AddOutcome::Duplicate);
        }
        info!("Adding location {location}");
        self.locations.push(location);
        self.save_locations()?;
        Ok(AddOutcome::Added)
    }

    /// Remove the location at an index. Returns `None` and leaves the list
    /// alone if the index is out of range.
    pub fn remove(&mut self, index: usize) -> anyhow::Result<Option<Location>> {
        if index >= self.locations.len() {
            warn!(
                "Ignoring removal of index {index} from list of length {}",
                self.locations.len()
            );
            return Ok(None);
        }
        let location = self.locations.remove(index);
        info!("Removed location {location}");
        self.save_locations()?;
        Ok(Some(location))
    }

    /// Swap a location with its neighbor. Moving off either end of the list
    /// does nothing. Return whether anything moved.
    pub fn move_location(
        &mut self,
        index: usize,
        direction: Direction,
    ) -> anyhow::Result<bool> {
        let len = self.locations.len();
        let neighbor = match direction {
            Direction::Left => index.checked_sub(1),
            Direction::Right => Some(index + 1),
        };
        let Some(neighbor) =
            neighbor.filter(|&neighbor| index < len && neighbor < len)
        else {
            return Ok(false);
        };
        self.locations.swap(index, neighbor);
        self.save_locations()?;
        Ok(true)
    }

    /// Replace all settings
    pub fn update_settings(&mut self, settings: Settings) -> anyhow::Result<()> {
        info!("Saving settings: {settings:?}");
        self.settings = settings;
        let serialized = serde_json::to_string(&self.settings)?;
        self.storage
            .set(Self::SETTINGS_KEY, &serialized)
            .context("Error saving settings")
    }

    fn save_locations(&self) -> anyhow::Result<()> {
        let serialized = serde_json::to_string(&self.locations)?;
        self.storage
            .set(Self::LOCATIONS_KEY, &serialized)
            .context("Error saving locations")
    }
}

/// Read and parse a key. Absent → `None`. Present but unparseable is logged
/// and also treated as absent.
fn read_key<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> anyhow::Result<Option<T>> {
    let Some(contents) = storage
        .get(key)
        .with_context(|| format!("Error reading `{key}` from storage"))?
    else {
        return Ok(None);
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!("Ignoring malformed `{key}` in storage: {err}");
            Ok(None)
        }
    }
}

/// Turn persisted JSON into valid locations, dropping entries that aren't
/// locations or would violate uniqueness
fn coerce_locations(values: Vec<Value>) -> Vec<Location> {
    let mut locations: Vec<Location> = Vec::with_capacity(values.len());
    for value in values {
        let location = match serde_json::from_value::<Location>(value) {
            Ok(location) if !location.name.trim().is_empty() => location,
            Ok(_) => {
                warn!("Dropping persisted location with empty name");
                continue;
            }
            Err(err) => {
                warn!("Dropping malformed persisted location: {err}");
                continue;
            }
        };
        let key = location.key();
        if locations.iter().any(|existing| existing.matches(&key)) {
            warn!("Dropping duplicate persisted location {location}");
            continue;
        }
        locations.push(location);
    }
    locations
}
