use std::path::{Path, PathBuf};

use repkg_domain::PackageIdentity;
use serde::Serialize;
use tracing::{debug, info};

use crate::effects::FileSystem;
use crate::error::PackageError;
use crate::events::PackageEvents;
use crate::project::PackageProject;
use crate::tooling::timings::TimingGuard;

/// Removes one installed package from a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UninstallPackageStep {
    identity: PackageIdentity,
    force_remove: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct UninstallReport {
    pub identity: PackageIdentity,
    pub force_remove: bool,
    pub removed_references: Vec<String>,
    pub removed_files: Vec<PathBuf>,
    /// Files whose removal a listener cancelled.
    pub kept_files: Vec<PathBuf>,
    pub tracking_file_proposed: bool,
}

impl UninstallPackageStep {
    pub fn new(identity: PackageIdentity) -> Self {
        Self {
            identity,
            force_remove: false,
        }
    }

    /// Skips the check that other installed packages depend on this one.
    #[must_use]
    pub fn with_force_remove(mut self, force_remove: bool) -> Self {
        self.force_remove = force_remove;
        self
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn force_remove(&self) -> bool {
        self.force_remove
    }

    /// Runs the uninstall, publishing a notification for each reference and
    /// file it removes.
    ///
    /// # Errors
    /// Returns [`PackageError::PackageNotFound`] if the package is not
    /// installed, [`PackageError::DependencyRemoval`] if it is still required
    /// and removal is not forced, or any listener or persistence failure.
    pub fn execute(
        &self,
        project: &mut dyn PackageProject,
        events: &PackageEvents,
        fs: &dyn FileSystem,
    ) -> Result<UninstallReport, PackageError> {
        let _timing = TimingGuard::new("uninstall");
        let installed = project
            .find_installed(&self.identity)
            .cloned()
            .ok_or_else(|| PackageError::PackageNotFound {
                identity: self.identity.clone(),
                project: project.name().to_string(),
            })?;

        if self.force_remove {
            debug!(package = %self.identity, "forced removal, skipping dependency check");
        } else {
            let dependents: Vec<String> = project
                .installed_packages()
                .iter()
                .filter(|package| package.identity != self.identity)
                .filter(|package| package.depends_on(self.identity.id()))
                .map(|package| package.identity.to_string())
                .collect();
            if !dependents.is_empty() {
                return Err(PackageError::DependencyRemoval {
                    identity: self.identity.clone(),
                    dependents,
                });
            }
        }

        let mut report = UninstallReport {
            identity: self.identity.clone(),
            force_remove: self.force_remove,
            removed_references: Vec::new(),
            removed_files: Vec::new(),
            kept_files: Vec::new(),
            tracking_file_proposed: false,
        };

        let owned: Vec<String> = project
            .references()
            .iter()
            .filter(|reference| reference.is_owned_by(self.identity.id()))
            .map(|reference| reference.name.clone())
            .collect();
        for name in owned {
            if let Some(reference) = project.find_reference(&name) {
                events.notify_reference_removing(reference)?;
            }
            project.remove_reference(&name);
            debug!(package = %self.identity, reference = %name, "reference removed");
            report.removed_references.push(name);
        }

        let root = project.root().to_path_buf();
        for file in &installed.files {
            remove_unless_cancelled(&root.join(file), events, fs, &mut report)?;
        }

        project.forget_installed(&self.identity);
        if project.installed_packages().is_empty() {
            let tracking = project.tracking_file();
            report.tracking_file_proposed = true;
            remove_unless_cancelled(tracking.path(), events, fs, &mut report)?;
        }
        project.save()?;

        info!(
            package = %self.identity,
            references = report.removed_references.len(),
            files = report.removed_files.len(),
            kept = report.kept_files.len(),
            "uninstalled"
        );
        Ok(report)
    }
}

fn remove_unless_cancelled(
    path: &Path,
    events: &PackageEvents,
    fs: &dyn FileSystem,
    report: &mut UninstallReport,
) -> Result<(), PackageError> {
    if events.notify_file_removing(path)? {
        debug!(path = %path.display(), "file removal cancelled");
        report.kept_files.push(path.to_path_buf());
    } else {
        fs.remove_file(path)?;
        report.removed_files.push(path.to_path_buf());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use repkg_domain::ProjectReference;

    use super::*;
    use crate::events::{FileRemovingEvent, PackageEventListener};
    use crate::testing::{identity, MemoryProject, RecordingFileSystem, ROOT};

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl PackageEventListener for Log {
        fn file_removing(&self, event: &mut FileRemovingEvent) -> Result<()> {
            let path = event.path().to_path_buf();
            if path.ends_with("keep.txt") {
                event.cancel();
            }
            self.0
                .lock()
                .unwrap()
                .push(format!("file:{}", path.display()));
            Ok(())
        }

        fn reference_removing(&self, reference: &ProjectReference) -> Result<()> {
            self.0.lock().unwrap().push(format!(
                "ref:{}:{}",
                reference.name, reference.local_copy
            ));
            Ok(())
        }
    }

    #[test]
    fn missing_package_is_reported() {
        let mut project = MemoryProject::new();
        let fs = RecordingFileSystem::default();
        let err = UninstallPackageStep::new(identity("MyPackage", "1.2.3.4"))
            .execute(&mut project, &PackageEvents::new(), &fs)
            .unwrap_err();
        assert!(matches!(err, PackageError::PackageNotFound { .. }), "{err}");
    }

    #[test]
    fn dependents_block_unforced_removal() {
        let target = identity("Core", "1.0");
        let mut project = MemoryProject::new()
            .with_installed(&target, &[("Core.dll", true)], &[])
            .with_dependent(&identity("App", "2.0"), "Core");
        let fs = RecordingFileSystem::default();

        let err = UninstallPackageStep::new(target.clone())
            .execute(&mut project, &PackageEvents::new(), &fs)
            .unwrap_err();
        match err {
            PackageError::DependencyRemoval { dependents, .. } => {
                assert_eq!(dependents, vec!["App@2.0".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(project.find_installed(&target).is_some());
        assert_eq!(project.references.len(), 1);
    }

    #[test]
    fn forced_removal_ignores_dependents() {
        let target = identity("Core", "1.0");
        let mut project = MemoryProject::new()
            .with_installed(&target, &[("Core.dll", true)], &[])
            .with_dependent(&identity("App", "2.0"), "Core");
        let fs = RecordingFileSystem::default();

        let report = UninstallPackageStep::new(target.clone())
            .with_force_remove(true)
            .execute(&mut project, &PackageEvents::new(), &fs)
            .unwrap();
        assert!(report.force_remove);
        assert!(project.find_installed(&target).is_none());
        assert!(!report.tracking_file_proposed);
        assert_eq!(project.saves, 1);
    }

    #[test]
    fn notifies_before_detaching_and_honours_cancellation() {
        let target = identity("MyPackage", "1.2.3.4");
        let mut project = MemoryProject::new().with_installed(
            &target,
            &[("NUnit.Framework", false)],
            &["content/keep.txt", "scripts/myscript.js"],
        );
        project
            .references
            .push(ProjectReference::assembly("System.Xml"));
        let fs = RecordingFileSystem::default();
        let events = PackageEvents::new();
        let log = Arc::new(Log::default());
        let _sub = events.subscribe(log.clone());

        let report = UninstallPackageStep::new(target)
            .execute(&mut project, &events, &fs)
            .unwrap();

        let root = Path::new(ROOT);
        let tracking = root.join("packages.toml");
        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                "ref:NUnit.Framework:false".to_string(),
                format!("file:{}", root.join("content/keep.txt").display()),
                format!("file:{}", root.join("scripts/myscript.js").display()),
                format!("file:{}", tracking.display()),
            ]
        );
        assert_eq!(report.removed_references, vec!["NUnit.Framework"]);
        assert_eq!(report.kept_files, vec![root.join("content/keep.txt")]);
        assert_eq!(
            fs.removed(),
            vec![root.join("scripts/myscript.js"), tracking]
        );
        assert!(report.tracking_file_proposed);
        assert_eq!(project.references.len(), 1);
        assert_eq!(project.references[0].name, "System.Xml");
    }
}
