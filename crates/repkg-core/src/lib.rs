#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

mod commands;
pub mod config;
pub mod effects;
mod error;
pub mod events;
pub mod project;
pub mod reinstall;
pub mod steps;
mod tooling;

#[cfg(test)]
mod testing;

pub use crate::commands::{
    install_package, reinstall_package, uninstall_package, InstallRequest, ReinstallRequest,
    UninstallRequest,
};
pub use crate::config::context::{CommandContext, CommandGroup, CommandInfo};
pub use crate::config::{Config, GlobalOptions, InstallConfig, SourceConfig};
pub use crate::effects::{FileSystem, SharedFileSystem, SystemFileSystem};
pub use crate::error::{PackageError, SubscriberFailure};
pub use crate::events::{FileRemovingEvent, PackageEventListener, PackageEvents, Subscription};
pub use crate::project::{FileProject, PackageProject, TrackingFile};
pub use crate::reinstall::{
    ReinstallPackageAction, ReinstallReport, ReinstallState, UninstallOutcome,
};
pub use crate::steps::{
    AddedReference, InstallPackageStep, InstallReport, UninstallPackageStep, UninstallReport,
};
pub use crate::tooling::outcome::{
    format_status_message, to_json_response, CommandStatus, ExecutionOutcome,
};
