use repkg_domain::PackageIdentity;

pub type SubscriberFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(thiserror::Error, Debug)]
pub enum PackageError {
    #[error("{identity} is not installed in project {project}")]
    PackageNotFound {
        identity: PackageIdentity,
        project: String,
    },
    #[error("unable to remove {identity}: required by {}", dependents.join(", "))]
    DependencyRemoval {
        identity: PackageIdentity,
        dependents: Vec<String>,
    },
    #[error("unable to resolve {identity}: {reason}")]
    InstallResolution {
        identity: PackageIdentity,
        reason: String,
    },
    #[error("{event} subscriber failed: {source}")]
    Subscriber {
        event: &'static str,
        #[source]
        source: SubscriberFailure,
    },
    #[error("reinstall action has already been executed")]
    AlreadyExecuted,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PackageError {
    /// Stable machine-readable code used in JSON output.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            PackageError::PackageNotFound { .. } => "package_not_found",
            PackageError::DependencyRemoval { .. } => "dependency_removal",
            PackageError::InstallResolution { .. } => "install_resolution",
            PackageError::Subscriber { .. } => "subscriber_failed",
            PackageError::AlreadyExecuted => "already_executed",
            PackageError::Other(_) => "internal",
        }
    }
}
