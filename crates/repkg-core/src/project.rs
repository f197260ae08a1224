use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use repkg_domain::{
    load_package, load_tracking_file, render_tracking_file, InstalledPackage, PackageContent,
    PackageIdentity, ProjectManifest, ProjectReference, MANIFEST_FILE, TRACKING_FILE,
};

/// Identifies a project's package-tracking file.
///
/// Matching is on the exact path after lexical normalisation; relative
/// candidates are taken relative to the project root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingFile {
    root: PathBuf,
    path: PathBuf,
}

impl TrackingFile {
    pub fn new(root: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let path = normalize(&root.join(path.into()));
        Self { root, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn matches(&self, candidate: &Path) -> bool {
        normalize(&self.root.join(candidate)) == self.path
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// The host project model the steps operate on.
pub trait PackageProject {
    fn name(&self) -> &str;
    fn root(&self) -> &Path;

    /// Packages recorded in the tracking file.
    fn installed_packages(&self) -> &[InstalledPackage];

    fn find_installed(&self, identity: &PackageIdentity) -> Option<&InstalledPackage> {
        self.installed_packages()
            .iter()
            .find(|package| &package.identity == identity)
    }

    /// Records `package`, replacing any entry with the same id.
    fn record_installed(&mut self, package: InstalledPackage);
    fn forget_installed(&mut self, identity: &PackageIdentity) -> Option<InstalledPackage>;

    fn references(&self) -> &[ProjectReference];

    fn find_reference(&self, name: &str) -> Option<&ProjectReference> {
        self.references()
            .iter()
            .find(|reference| reference.name == name)
    }

    /// Adds `reference`, replacing any reference with the same name, and
    /// returns the stored instance.
    fn add_reference(&mut self, reference: ProjectReference) -> &mut ProjectReference;
    fn remove_reference(&mut self, name: &str) -> Option<ProjectReference>;

    fn tracking_file(&self) -> TrackingFile;

    /// Looks `identity` up in the project's package source.
    fn resolve_package(&self, identity: &PackageIdentity) -> Result<Option<PackageContent>>;

    /// Persists the project. An empty tracking record never creates the
    /// tracking file, but an existing one is rewritten to match.
    fn save(&mut self) -> Result<()>;
}

/// Project backed by `repkg.toml`, `packages.toml`, and a directory feed.
#[derive(Debug)]
pub struct FileProject {
    root: PathBuf,
    manifest: ProjectManifest,
    packages: Vec<InstalledPackage>,
    source: Option<PathBuf>,
}

impl FileProject {
    /// Opens the project rooted at `root`.
    ///
    /// `source_override` replaces the manifest's `[project].source`.
    ///
    /// # Errors
    /// Returns an error if the manifest or tracking file cannot be read.
    pub fn open(root: &Path, source_override: Option<&Path>) -> Result<Self> {
        let manifest_path = root.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(anyhow!("no {MANIFEST_FILE} found in {}", root.display()));
        }
        let manifest = ProjectManifest::load(&manifest_path)?;
        let packages = load_tracking_file(&root.join(TRACKING_FILE))?;
        let source = source_override
            .map(Path::to_path_buf)
            .or_else(|| manifest.source().map(|source| root.join(source)));
        tracing::debug!(
            project = manifest.name(),
            installed = packages.len(),
            source = ?source,
            "opened project"
        );
        Ok(Self {
            root: root.to_path_buf(),
            manifest,
            packages,
            source,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl PackageProject for FileProject {
    fn name(&self) -> &str {
        self.manifest.name()
    }

    fn root(&self) -> &Path {
        &self.root
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
        self.manifest.references()
    }

    fn add_reference(&mut self, reference: ProjectReference) -> &mut ProjectReference {
        let references = self.manifest.references_mut();
        references.retain(|existing| existing.name != reference.name);
        references.push(reference);
        let last = references.len() - 1;
        &mut references[last]
    }

    fn remove_reference(&mut self, name: &str) -> Option<ProjectReference> {
        let references = self.manifest.references_mut();
        let index = references
            .iter()
            .position(|reference| reference.name == name)?;
        Some(references.remove(index))
    }

    fn tracking_file(&self) -> TrackingFile {
        TrackingFile::new(&self.root, TRACKING_FILE)
    }

    fn resolve_package(&self, identity: &PackageIdentity) -> Result<Option<PackageContent>> {
        let source = self
            .source
            .as_deref()
            .ok_or_else(|| anyhow!("project {} has no package source", self.name()))?;
        load_package(source, identity)
    }

    fn save(&mut self) -> Result<()> {
        let manifest_path = self.manifest_path();
        fs::write(&manifest_path, self.manifest.render())
            .with_context(|| format!("writing {}", manifest_path.display()))?;
        let tracking = self.tracking_file();
        if !self.packages.is_empty() || tracking.path().is_file() {
            fs::write(tracking.path(), render_tracking_file(&self.packages))
                .with_context(|| format!("writing {}", tracking.path().display()))?;
        }
        Ok(())
    }
}
