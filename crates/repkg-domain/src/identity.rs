use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use pep440_rs::Version;
use serde::{Deserialize, Serialize};

/// A package id pinned to one exact version.
///
/// Two identities match when both the id and the version compare equal; the
/// version comparison follows PEP 440 so `1.2` and `1.2.0` are the same
/// release.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageIdentity {
    id: String,
    #[serde(with = "version_string")]
    version: Version,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: Version) -> Self {
        Self {
            id: id.into(),
            version,
        }
    }

    /// Builds an identity from an id and a textual version.
    ///
    /// # Errors
    ///
    /// Returns an error when the id is blank or the version does not parse.
    pub fn parse(id: &str, version: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty() {
            return Err(anyhow!("package id must not be empty"));
        }
        let version = Version::from_str(version.trim())
            .map_err(|err| anyhow!("{err}"))
            .with_context(|| format!("invalid version `{version}` for package {id}"))?;
        Ok(Self::new(id, version))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &Version {
        &self.version
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

impl FromStr for PackageIdentity {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        let (id, version) = raw
            .split_once('@')
            .ok_or_else(|| anyhow!("expected `id@version`, got `{raw}`"))?;
        Self::parse(id, version)
    }
}

mod version_string {
    use std::str::FromStr;

    use pep440_rs::Version;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(version: &Version, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(version)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Version, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::from_str(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_part_versions_parse() {
        let identity = PackageIdentity::parse("MyPackage", "1.2.3.4").unwrap();
        assert_eq!(identity.id(), "MyPackage");
        assert_eq!(identity.to_string(), "MyPackage@1.2.3.4");
    }

    #[test]
    fn equality_ignores_trailing_zero_segments() {
        let short = PackageIdentity::parse("Lib", "1.2").unwrap();
        let long: PackageIdentity = "Lib@1.2.0".parse().unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn ids_compare_exactly() {
        let lower = PackageIdentity::parse("lib", "1.0").unwrap();
        let upper = PackageIdentity::parse("Lib", "1.0").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn rejects_missing_separator_and_blank_id() {
        assert!("MyPackage".parse::<PackageIdentity>().is_err());
        assert!(PackageIdentity::parse("  ", "1.0").is_err());
        assert!(PackageIdentity::parse("Lib", "not a version").is_err());
    }
}
