#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod feed;
pub mod identity;
pub mod manifest;
pub mod package;
pub mod reference;
mod toml;
pub mod tracking;

pub use feed::{load_package, package_dir, PACKAGE_DESCRIPTOR};
pub use identity::PackageIdentity;
pub use manifest::{discover_project_root, ProjectManifest, MANIFEST_FILE};
pub use package::{InstalledPackage, PackageContent, ReferenceSpec};
pub use reference::{ProjectReference, ReferenceKind};
pub use tracking::{load_tracking_file, parse_tracking_file, render_tracking_file, TRACKING_FILE};
