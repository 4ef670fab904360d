use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Which endpoint of a (possibly geo-redundant) account a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[default]
    Primary,
    Secondary,
}

impl LocationMode {
    pub fn other(self) -> Self {
        match self {
            LocationMode::Primary => LocationMode::Secondary,
            LocationMode::Secondary => LocationMode::Primary,
        }
    }
}

impl fmt::Display for LocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationMode::Primary => f.write_str("primary"),
            LocationMode::Secondary => f.write_str("secondary"),
        }
    }
}

impl FromStr for LocationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(LocationMode::Primary),
            "secondary" => Ok(LocationMode::Secondary),
            other => anyhow::bail!("unknown location mode '{other}', expected primary or secondary"),
        }
    }
}

/// The hosts a request is allowed to go to, keyed by location.
///
/// Iteration order is primary first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostLocations(BTreeMap<LocationMode, String>);

impl HostLocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(mode: LocationMode, host: impl Into<String>) -> Self {
        let mut locations = Self::new();
        locations.insert(mode, host);
        locations
    }

    pub fn insert(&mut self, mode: LocationMode, host: impl Into<String>) {
        self.0.insert(mode, host.into());
    }

    pub fn get(&self, mode: LocationMode) -> Option<&str> {
        self.0.get(&mode).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The only entry, when exactly one location is allowed.
    pub fn sole(&self) -> Option<(LocationMode, &str)> {
        if self.0.len() == 1 {
            self.0.iter().next().map(|(m, h)| (*m, h.as_str()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Secondary".parse::<LocationMode>().unwrap(), LocationMode::Secondary);
        assert_eq!("primary".parse::<LocationMode>().unwrap(), LocationMode::Primary);
        assert!("tertiary".parse::<LocationMode>().is_err());
    }

    #[test]
    fn sole_only_for_single_entry() {
        let mut locations = HostLocations::single(LocationMode::Secondary, "a-secondary");
        assert_eq!(locations.sole(), Some((LocationMode::Secondary, "a-secondary")));
        locations.insert(LocationMode::Primary, "a");
        assert_eq!(locations.sole(), None);
        assert_eq!(locations.get(LocationMode::Primary), Some("a"));
    }
}
