//! Package versions and half-open version ranges.
//!
//! Example: "2.1" => Version(vec![2, 1])
//!
//! Trailing zero components are dropped on parse so "2", "2.0" and "2.0.0"
//! compare equal; the derived ordering is then numeric per component.

use crate::error::ConfigError;
use regex::Regex;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("version pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version(Vec<u32>);

impl Version {
    pub fn new(mut parts: Vec<u32>) -> Self {
        while parts.last() == Some(&0) {
            parts.pop();
        }
        Self(parts)
    }
}

impl FromStr for Version {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || ConfigError::InvalidVersion(s.to_string());
        if !VERSION_RE.is_match(s) {
            return Err(invalid());
        }
        let parts = s
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(parts))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = self.0.first().copied().unwrap_or(0);
        let minor = self.0.get(1).copied().unwrap_or(0);
        write!(f, "{}.{}", major, minor)?;
        for part in self.0.iter().skip(2) {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `[min, max)`; a missing bound is unbounded on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub max: Option<Version>,
}

impl VersionRange {
    pub fn new(min: Option<Version>, max: Option<Version>) -> Self {
        Self { min, max }
    }

    /// Tightest range satisfying both sides.
    pub fn intersect(&self, other: &Self) -> Self {
        let min = match (&self.min, &other.min) {
            (Some(a), Some(b)) => Some(a.max(b).clone()),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
        let max = match (&self.max, &other.max) {
            (Some(a), Some(b)) => Some(a.min(b).clone()),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        matches!((&self.min, &self.max), (Some(min), Some(max)) if max <= min)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.min, &self.max) {
            (Some(min), Some(max)) => write!(f, ">={}, <{}", min, max),
            (Some(min), None) => write!(f, ">={}", min),
            (None, Some(max)) => write!(f, "<{}", max),
            (None, None) => f.write_str("*"),
        }
    }
}

/// A package requirement declared by one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    pub package: String,
    pub range: VersionRange,
    pub sublibs: Vec<String>,
}

/// Authoring-side package declaration; versions are parsed when the owning
/// descriptor is built.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
    #[serde(default)]
    pub sublibs: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn min(mut self, version: impl Into<String>) -> Self {
        self.min = Some(version.into());
        self
    }

    pub fn max(mut self, version: impl Into<String>) -> Self {
        self.max = Some(version.into());
        self
    }

    pub fn sublib(mut self, name: impl Into<String>) -> Self {
        self.sublibs.push(name.into());
        self
    }

    pub(crate) fn resolve(&self) -> Result<VersionConstraint, ConfigError> {
        let min = self.min.as_deref().map(str::parse).transpose()?;
        let max = self.max.as_deref().map(str::parse).transpose()?;
        let mut sublibs = self.sublibs.clone();
        sublibs.sort();
        sublibs.dedup();
        Ok(VersionConstraint {
            package: self.name.clone(),
            range: VersionRange::new(min, max),
            sublibs,
        })
    }
}
