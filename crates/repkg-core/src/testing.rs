//! In-memory collaborators shared by unit tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use repkg_domain::{
    InstalledPackage, PackageContent, PackageIdentity, ProjectReference, ReferenceSpec,
    ReferenceKind, TRACKING_FILE,
};

use crate::effects::FileSystem;
use crate::project::{PackageProject, TrackingFile};

pub(crate) const ROOT: &str = "/projects/MyProject";

pub(crate) fn identity(id: &str, version: &str) -> PackageIdentity {
    PackageIdentity::parse(id, version).unwrap()
}

#[derive(Debug, Default)]
pub(crate) struct MemoryProject {
    pub packages: Vec<InstalledPackage>,
    pub references: Vec<ProjectReference>,
    pub feed: HashMap<PackageIdentity, PackageContent>,
    pub saves: usize,
}

impl MemoryProject {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Installs `identity` as if a previous install had run, owning `references`.
    pub(crate) fn with_installed(
        mut self,
        identity: &PackageIdentity,
        references: &[(&str, bool)],
        files: &[&str],
    ) -> Self {
        let mut package = InstalledPackage::new(identity.clone());
        package.files = files.iter().map(PathBuf::from).collect();
        self.packages.push(package);
        for (name, local_copy) in references {
            self.references.push(
                ProjectReference::assembly(*name)
                    .with_local_copy(*local_copy)
                    .owned_by(identity.id()),
            );
        }
        self
    }

    pub(crate) fn with_dependent(mut self, dependent: &PackageIdentity, on: &str) -> Self {
        let mut package = InstalledPackage::new(dependent.clone());
        package.dependencies.push(on.to_string());
        self.packages.push(package);
        self
    }

    /// Makes `identity` available from the feed with the given reference defaults.
    pub(crate) fn with_feed_package(
        mut self,
        identity: &PackageIdentity,
        references: &[(&str, bool)],
        files: &[&str],
        readme: Option<&str>,
    ) -> Self {
        let mut content = PackageContent::new(identity.clone(), "/feed");
        content.references = references
            .iter()
            .map(|(name, local_copy)| ReferenceSpec {
                kind: ReferenceKind::Assembly,
                name: (*name).to_string(),
                local_copy: *local_copy,
            })
            .collect();
        content.files = files.iter().map(PathBuf::from).collect();
        content.readme = readme.map(PathBuf::from);
        self.feed.insert(identity.clone(), content);
        self
    }

    pub(crate) fn reference(&self, name: &str) -> &ProjectReference {
        self.find_reference(name)
            .unwrap_or_else(|| panic!("reference {name} missing"))
    }
}

impl PackageProject for MemoryProject {
    fn name(&self) -> &str {
        "MyProject"
    }

    fn root(&self) -> &Path {
        Path::new(ROOT)
    }

    fn installed_packages(&self) -> &[InstalledPackage] {
        &self.packages
    }

    fn record_installed(&mut self, package: InstalledPackage) {
        self.packages
            .retain(|existing| existing.identity.id() != package.identity.id());
        self.packages.push(package);
    }

    fn forget_installed(&mut self, identity: &PackageIdentity) -> Option<InstalledPackage> {
        let index = self
            .packages
            .iter()
            .position(|package| &package.identity == identity)?;
        Some(self.packages.remove(index))
    }

    fn references(&self) -> &[ProjectReference] {
        &self.references
    }

    fn add_reference(&mut self, reference: ProjectReference) -> &mut ProjectReference {
        self.references
            .retain(|existing| existing.name != reference.name);
        self.references.push(reference);
        let last = self.references.len() - 1;
        &mut self.references[last]
    }

    fn remove_reference(&mut self, name: &str) -> Option<ProjectReference> {
        let index = self
            .references
            .iter()
            .position(|reference| reference.name == name)?;
        Some(self.references.remove(index))
    }

    fn tracking_file(&self) -> TrackingFile {
        TrackingFile::new(ROOT, TRACKING_FILE)
    }

    fn resolve_package(&self, identity: &PackageIdentity) -> Result<Option<PackageContent>> {
        if identity.id() == "Corrupt" {
            return Err(anyhow!("descriptor for {identity} is malformed"));
        }
        Ok(self.feed.get(identity).cloned())
    }

    fn save(&mut self) -> Result<()> {
        self.saves += 1;
        Ok(())
    }
}

/// Records every file operation instead of touching the disk.
#[derive(Debug, Default)]
pub(crate) struct RecordingFileSystem {
    removed: Mutex<Vec<PathBuf>>,
    copied: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl RecordingFileSystem {
    pub(crate) fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }

    pub(crate) fn copied(&self) -> Vec<(PathBuf, PathBuf)> {
        self.copied.lock().unwrap().clone()
    }
}

impl FileSystem for RecordingFileSystem {
    fn remove_file(&self, path: &Path) -> Result<()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn copy(&self, src: &Path, dest: &Path) -> Result<()> {
        self.copied
            .lock()
            .unwrap()
            .push((src.to_path_buf(), dest.to_path_buf()));
        Ok(())
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
