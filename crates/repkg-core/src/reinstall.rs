//! Forced uninstall followed by a fresh install of the same package version.
//!
//! The uninstall phase publishes the references and files it removes; a
//! listener records each removed reference's `local_copy` flag by name and
//! cancels deletion of the project's package-tracking file, which the install
//! phase rewrites. During the install phase a second listener copies the
//! recorded flags onto the newly created references of the same name.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use indexmap::IndexMap;
use repkg_domain::{PackageIdentity, ProjectReference};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::effects::FileSystem;
use crate::error::PackageError;
use crate::events::{FileRemovingEvent, PackageEventListener, PackageEvents};
use crate::project::{PackageProject, TrackingFile};
use crate::steps::{InstallPackageStep, InstallReport, UninstallPackageStep, UninstallReport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReinstallState {
    Idle,
    UninstallRunning,
    InstallRunning,
    Complete,
    Failed,
}

impl fmt::Display for ReinstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReinstallState::Idle => "idle",
            ReinstallState::UninstallRunning => "uninstall-running",
            ReinstallState::InstallRunning => "install-running",
            ReinstallState::Complete => "complete",
            ReinstallState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// `local_copy` flags of the references removed during the uninstall phase,
/// keyed by reference name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UninstallOutcome {
    local_copy: IndexMap<String, bool>,
}

impl UninstallOutcome {
    pub fn record(&mut self, name: &str, local_copy: bool) {
        self.local_copy.insert(name.to_string(), local_copy);
    }

    pub fn local_copy(&self, name: &str) -> Option<bool> {
        self.local_copy.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.local_copy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.local_copy.is_empty()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ReinstallReport {
    pub identity: PackageIdentity,
    pub uninstall: UninstallReport,
    pub install: InstallReport,
    /// References whose `local_copy` flag was carried over from the uninstall.
    pub restored: Vec<String>,
}

struct RemovalTracker {
    tracking_file: TrackingFile,
    outcome: Mutex<UninstallOutcome>,
}

impl RemovalTracker {
    fn new(tracking_file: TrackingFile) -> Self {
        Self {
            tracking_file,
            outcome: Mutex::new(UninstallOutcome::default()),
        }
    }

    fn take_outcome(&self) -> UninstallOutcome {
        let mut outcome = self.outcome.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *outcome)
    }
}

impl PackageEventListener for RemovalTracker {
    fn file_removing(&self, event: &mut FileRemovingEvent) -> Result<()> {
        if self.tracking_file.matches(event.path()) {
            debug!(path = %event.path().display(), "keeping package-tracking file");
            event.cancel();
        }
        Ok(())
    }

    fn reference_removing(&self, reference: &ProjectReference) -> Result<()> {
        self.outcome
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(&reference.name, reference.local_copy);
        Ok(())
    }
}

struct LocalCopyRestorer {
    outcome: UninstallOutcome,
    restored: Mutex<Vec<String>>,
}

impl LocalCopyRestorer {
    fn new(outcome: UninstallOutcome) -> Self {
        Self {
            outcome,
            restored: Mutex::new(Vec::new()),
        }
    }

    fn take_restored(&self) -> Vec<String> {
        let mut restored = self.restored.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *restored)
    }
}

impl PackageEventListener for LocalCopyRestorer {
    fn reference_adding(&self, reference: &mut ProjectReference) -> Result<()> {
        if let Some(local_copy) = self.outcome.local_copy(&reference.name) {
            debug!(reference = %reference.name, local_copy, "restoring local copy");
            reference.local_copy = local_copy;
            self.restored
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(reference.name.clone());
        }
        Ok(())
    }
}

/// One reinstall of one package version. Not reusable once executed.
pub struct ReinstallPackageAction<'a> {
    identity: PackageIdentity,
    events: &'a PackageEvents,
    fs: &'a dyn FileSystem,
    state: ReinstallState,
}

impl<'a> ReinstallPackageAction<'a> {
    pub fn new(identity: PackageIdentity, events: &'a PackageEvents, fs: &'a dyn FileSystem) -> Self {
        Self {
            identity,
            events,
            fs,
            state: ReinstallState::Idle,
        }
    }

    pub fn identity(&self) -> &PackageIdentity {
        &self.identity
    }

    pub fn state(&self) -> ReinstallState {
        self.state
    }

    /// The uninstall half always removes by force: the package is reinstalled
    /// immediately, so packages depending on it are never left broken.
    pub fn uninstall_step(&self) -> UninstallPackageStep {
        UninstallPackageStep::new(self.identity.clone()).with_force_remove(true)
    }

    pub fn install_step(&self) -> InstallPackageStep {
        InstallPackageStep::new(self.identity.clone())
            .with_preserve_local_copy_references(true)
            .with_skip_readme_display(true)
    }

    /// Runs the reinstall against `project`.
    ///
    /// # Errors
    /// Returns the first error raised by either step, unchanged. Nothing that
    /// was already applied is rolled back. Returns
    /// [`PackageError::AlreadyExecuted`] on a second call.
    pub fn execute(
        &mut self,
        project: &mut dyn PackageProject,
    ) -> Result<ReinstallReport, PackageError> {
        if self.state != ReinstallState::Idle {
            return Err(PackageError::AlreadyExecuted);
        }
        match self.run(project) {
            Ok(report) => {
                self.transition(ReinstallState::Complete);
                Ok(report)
            }
            Err(err) => {
                self.transition(ReinstallState::Failed);
                warn!(package = %self.identity, error = %err, "reinstall failed");
                Err(err)
            }
        }
    }

    fn run(&mut self, project: &mut dyn PackageProject) -> Result<ReinstallReport, PackageError> {
        self.transition(ReinstallState::UninstallRunning);
        let tracker = Arc::new(RemovalTracker::new(project.tracking_file()));
        let uninstall = {
            let _subscription = self.events.subscribe(tracker.clone());
            self.uninstall_step().execute(project, self.events, self.fs)?
        };
        let outcome = tracker.take_outcome();
        debug!(captured = outcome.len(), "captured local copy flags");

        self.transition(ReinstallState::InstallRunning);
        let restorer = Arc::new(LocalCopyRestorer::new(outcome));
        let install = {
            let _subscription = self.events.subscribe(restorer.clone());
            self.install_step().execute(project, self.events, self.fs)?
        };

        Ok(ReinstallReport {
            identity: self.identity.clone(),
            uninstall,
            install,
            restored: restorer.take_restored(),
        })
    }

    fn transition(&mut self, next: ReinstallState) {
        info!(package = %self.identity, from = %self.state, to = %next, "reinstall state");
        self.state = next;
    }
}
