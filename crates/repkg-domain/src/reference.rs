use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    Assembly,
    Project,
    Package,
}

impl ReferenceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKind::Assembly => "assembly",
            ReferenceKind::Project => "project",
            ReferenceKind::Package => "package",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "assembly" => Ok(ReferenceKind::Assembly),
            "project" => Ok(ReferenceKind::Project),
            "package" => Ok(ReferenceKind::Package),
            other => Err(anyhow!("unknown reference kind `{other}`")),
        }
    }
}

/// A reference held by a project.
///
/// `local_copy` decides whether the referenced file is copied into the build
/// output. `package` names the installed package that introduced the
/// reference, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReference {
    pub kind: ReferenceKind,
    pub name: String,
    pub local_copy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl ProjectReference {
    pub fn new(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            local_copy: true,
            package: None,
        }
    }

    pub fn assembly(name: impl Into<String>) -> Self {
        Self::new(ReferenceKind::Assembly, name)
    }

    #[must_use]
    pub fn with_local_copy(mut self, local_copy: bool) -> Self {
        self.local_copy = local_copy;
        self
    }

    #[must_use]
    pub fn owned_by(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn is_owned_by(&self, package_id: &str) -> bool {
        self.package.as_deref() == Some(package_id)
    }
}
