//! The two package operations a reinstall is built from.

pub mod install;
pub mod uninstall;

pub use install::{AddedReference, InstallPackageStep, InstallReport};
pub use uninstall::{UninstallPackageStep, UninstallReport};
