//! Station presets: named keywords that bulk import a themed set of tracks

use std::collections::BTreeMap;

pub const DEFAULT_STATIONS: &[(&str, &str)] = &[
    ("lofi", "lofi chill beats"),
    ("summer", "summer pop hits"),
    ("indie", "indie folk"),
    ("jazz", "jazz smooth"),
    ("electronic", "electronic chill"),
];

/// station loaded on the very first visit
pub const WELCOME_STATION: &str = "summer";

#[derive(Debug, Clone)]
pub struct Stations {
    presets: BTreeMap<String, String>,
}

impl Default for Stations {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

impl Stations {
    /// Built-in presets, extended or overridden by `extra`.
    pub fn new(extra: &BTreeMap<String, String>) -> Self {
        let mut presets = DEFAULT_STATIONS
            .iter()
            .map(|(k, q)| (k.to_string(), q.to_string()))
            .collect::<BTreeMap<_, _>>();
        presets.extend(extra.iter().map(|(k, q)| (k.to_lowercase(), q.clone())));
        Self { presets }
    }

    /// Unknown keywords are searched for as they are.
    pub fn query_for(&self, keyword: &str) -> String {
        self.presets
            .get(&keyword.to_lowercase())
            .cloned()
            .unwrap_or_else(|| keyword.to_string())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.presets.iter().map(|(k, q)| (k.as_str(), q.as_str()))
    }

    pub fn playlist_name(keyword: &str) -> String {
        format!("{} Radio", keyword.to_uppercase())
    }
}
