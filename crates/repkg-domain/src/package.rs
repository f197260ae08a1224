use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{PackageIdentity, ProjectReference, ReferenceKind};

/// One entry of the package-tracking file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub identity: PackageIdentity,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Files the package placed into the project, relative to the project root.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl InstalledPackage {
    pub fn new(identity: PackageIdentity) -> Self {
        Self {
            identity,
            dependencies: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn depends_on(&self, package_id: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == package_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    pub kind: ReferenceKind,
    pub name: String,
    pub local_copy: bool,
}

impl ReferenceSpec {
    /// Creates the project reference for `package_id` from this template.
    pub fn instantiate(&self, package_id: &str) -> ProjectReference {
        ProjectReference::new(self.kind, self.name.clone())
            .with_local_copy(self.local_copy)
            .owned_by(package_id)
    }
}

/// What a package source hands back for one identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageContent {
    pub identity: PackageIdentity,
    /// Directory the payload paths below are relative to.
    pub root: PathBuf,
    pub dependencies: Vec<String>,
    pub references: Vec<ReferenceSpec>,
    pub files: Vec<PathBuf>,
    pub readme: Option<PathBuf>,
}

impl PackageContent {
    pub fn new(identity: PackageIdentity, root: impl Into<PathBuf>) -> Self {
        Self {
            identity,
            root: root.into(),
            dependencies: Vec::new(),
            references: Vec::new(),
            files: Vec::new(),
            readme: None,
        }
    }

    pub fn installed_record(&self) -> InstalledPackage {
        InstalledPackage {
            identity: self.identity.clone(),
            dependencies: self.dependencies.clone(),
            files: self.files.clone(),
        }
    }
}
