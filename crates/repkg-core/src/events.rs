//! Synchronous notification hub for package lifecycle events.
//!
//! Listeners are invoked on the calling thread, in the order they subscribed,
//! before the emitting step continues. A listener error stops dispatch and is
//! returned to the emitter as [`PackageError::Subscriber`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use anyhow::Result;
use repkg_domain::ProjectReference;
use tracing::trace;

use crate::error::PackageError;

const FILE_REMOVING: &str = "file-removing";
const REFERENCE_REMOVING: &str = "reference-removing";
const REFERENCE_ADDING: &str = "reference-adding";

/// A proposed file deletion that any listener may cancel.
#[derive(Debug, Clone)]
pub struct FileRemovingEvent {
    path: PathBuf,
    cancelled: bool,
}

impl FileRemovingEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cancelled: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

pub trait PackageEventListener: Send + Sync {
    fn file_removing(&self, _event: &mut FileRemovingEvent) -> Result<()> {
        Ok(())
    }

    /// Called before `reference` is detached from the project.
    fn reference_removing(&self, _reference: &ProjectReference) -> Result<()> {
        Ok(())
    }

    /// Called once `reference` has been added to the project.
    fn reference_adding(&self, _reference: &mut ProjectReference) -> Result<()> {
        Ok(())
    }
}

type Listener = Arc<dyn PackageEventListener>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default, Clone)]
pub struct PackageEvents {
    registry: Arc<Registry>,
}

impl std::fmt::Debug for PackageEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageEvents")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl PackageEvents {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `listener` until the returned guard is dropped.
    #[must_use = "dropping the subscription detaches the listener immediately"]
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().push((id, listener));
        trace!(subscription = id, "listener attached");
        Subscription {
            registry: Arc::downgrade(&self.registry),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Publishes a cancellable removal of `path`; returns whether any listener
    /// cancelled it.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Subscriber`] when a listener fails.
    pub fn notify_file_removing(&self, path: &Path) -> Result<bool, PackageError> {
        let mut event = FileRemovingEvent::new(path);
        for listener in self.snapshot() {
            listener
                .file_removing(&mut event)
                .map_err(|err| subscriber_error(FILE_REMOVING, err))?;
        }
        trace!(path = %path.display(), cancelled = event.is_cancelled(), "file removing");
        Ok(event.is_cancelled())
    }

    /// # Errors
    ///
    /// Returns [`PackageError::Subscriber`] when a listener fails.
    pub fn notify_reference_removing(
        &self,
        reference: &ProjectReference,
    ) -> Result<(), PackageError> {
        trace!(reference = %reference.name, "reference removing");
        for listener in self.snapshot() {
            listener
                .reference_removing(reference)
                .map_err(|err| subscriber_error(REFERENCE_REMOVING, err))?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`PackageError::Subscriber`] when a listener fails.
    pub fn notify_reference_adding(
        &self,
        reference: &mut ProjectReference,
    ) -> Result<(), PackageError> {
        trace!(reference = %reference.name, "reference adding");
        for listener in self.snapshot() {
            listener
                .reference_adding(reference)
                .map_err(|err| subscriber_error(REFERENCE_ADDING, err))?;
        }
        Ok(())
    }

    // Listeners run without the lock held so they may subscribe or unsubscribe.
    fn snapshot(&self) -> Vec<Listener> {
        self.registry
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

fn subscriber_error(event: &'static str, err: anyhow::Error) -> PackageError {
    PackageError::Subscriber {
        event,
        source: err.into(),
    }
}

/// Keeps a listener attached; detaches it on drop.
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Registry>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().retain(|(id, _)| *id != self.id);
            trace!(subscription = self.id, "listener detached");
        }
    }
}
