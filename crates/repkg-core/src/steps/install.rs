use std::path::PathBuf;

use repkg_domain::PackageIdentity;
use serde::Serialize;
use tracing::{debug, info};

use crate::effects::FileSystem;
use crate::error::PackageError;
use crate::events::PackageEvents;
use crate::project::PackageProject;
use crate::tooling::timings::TimingGuard;

/// Installs one package version from the project's package source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallPackageStep {
    identity: PackageIdentity,
    preserve_local_copy_references: bool,
    skip_readme_display: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AddedReference {
    pub name: String,
    pub local_copy: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct InstallReport {
    pub identity: PackageIdentity,
    pub preserve_local_copy_references: bool,
    pub skip_readme_display: bool,
    pub added_references: Vec<AddedReference>,
    pub files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readme: Option<PathBuf>,
}

impl InstallPackageStep {
    pub fn new(identity: PackageIdentity) -> Self {
        Self {
            identity,
            preserve_local_copy_references: false,
            skip_readme_display: false,
        }
    }

    /// When set, the caller owns `local_copy` on the references this step adds
    /// and the step leaves the package defaults in place.
    #[must_use]
    pub fn with_preserve_local_copy_references(mut self, preserve: bool) -> Self {
        self.preserve_local_copy_references = preserve;
        self
    }

    #[must_use]
    pub fn with_skip_readme_display(mut self, skip: bool) -> Self {
        self.skip_readme_display = skip;
        self
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn preserve_local_copy_references(&self) -> bool {
        self.preserve_local_copy_references
    }

    pub fn skip_readme_display(&self) -> bool {
        self.skip_readme_display
    }

    /// # Errors
    /// Returns [`PackageError::InstallResolution`] when the package source
    /// cannot provide the package, or any copy, listener, or persistence
    /// failure.
    pub fn execute(
        &self,
        project: &mut dyn PackageProject,
        events: &PackageEvents,
        fs: &dyn FileSystem,
    ) -> Result<InstallReport, PackageError> {
        let _timing = TimingGuard::new("install");
        let content = project
            .resolve_package(&self.identity)
            .map_err(|err| PackageError::InstallResolution {
                identity: self.identity.clone(),
                reason: format!("{err:#}"),
            })?
            .ok_or_else(|| PackageError::InstallResolution {
                identity: self.identity.clone(),
                reason: "not found in package source".to_string(),
            })?;

        let mut report = InstallReport {
            identity: self.identity.clone(),
            preserve_local_copy_references: self.preserve_local_copy_references,
            skip_readme_display: self.skip_readme_display,
            added_references: Vec::new(),
            files: Vec::new(),
            readme: None,
        };

        let root = project.root().to_path_buf();
        for file in &content.files {
            let dest = root.join(file);
            if let Some(parent) = dest.parent() {
                fs.create_dir_all(parent)?;
            }
            fs.copy(&content.root.join(file), &dest)?;
            report.files.push(file.clone());
        }

        for spec in &content.references {
            let mut reference = spec.instantiate(self.identity.id());
            if !self.preserve_local_copy_references {
                if let Some(existing) = project.find_reference(&reference.name) {
                    debug!(
                        reference = %reference.name,
                        local_copy = existing.local_copy,
                        "keeping local copy of replaced reference"
                    );
                    reference.local_copy = existing.local_copy;
                }
            }
            let added = project.add_reference(reference);
            events.notify_reference_adding(added)?;
            report.added_references.push(AddedReference {
                name: added.name.clone(),
                local_copy: added.local_copy,
            });
        }

        project.record_installed(content.installed_record());
        project.save()?;

        if !self.skip_readme_display {
            report.readme = content.readme.as_ref().map(|readme| content.root.join(readme));
        }

        info!(
            package = %self.identity,
            references = report.added_references.len(),
            files = report.files.len(),
            "installed"
        );
        Ok(report)
    }
}
