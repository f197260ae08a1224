use anyhow::Result;
use repkg_domain::{PackageIdentity, MANIFEST_FILE};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::context::CommandContext;
use crate::error::PackageError;
use crate::project::{FileProject, PackageProject};
use crate::reinstall::ReinstallPackageAction;
use crate::steps::{InstallPackageStep, UninstallPackageStep};
use crate::tooling::outcome::ExecutionOutcome;

#[derive(Clone, Debug)]
pub struct ReinstallRequest {
    pub id: String,
    pub version: String,
}

#[derive(Clone, Debug)]
pub struct InstallRequest {
    pub id: String,
    pub version: String,
}

#[derive(Clone, Debug)]
pub struct UninstallRequest {
    pub id: String,
    pub version: String,
    pub force: bool,
}

/// Reinstalls an installed package in place, keeping its references'
/// local-copy settings.
///
/// # Errors
/// Returns an error only for unexpected I/O or persistence failures; package
/// and project problems are reported through the outcome.
pub fn reinstall_package(
    ctx: &CommandContext,
    request: &ReinstallRequest,
) -> Result<ExecutionOutcome> {
    let (identity, mut project) = match prepare(ctx, &request.id, &request.version) {
        Ok(prepared) => prepared,
        Err(outcome) => return Ok(outcome),
    };
    let mut action = ReinstallPackageAction::new(identity.clone(), ctx.events(), ctx.fs());
    match action.execute(&mut project) {
        Ok(report) => Ok(ExecutionOutcome::success(
            format!("reinstalled {identity}"),
            serde_json::to_value(&report)?,
        )),
        Err(err) => package_error_outcome(&identity, err),
    }
}

/// # Errors
/// Returns an error only for unexpected I/O or persistence failures.
pub fn install_package(
    ctx: &CommandContext,
    request: &InstallRequest,
) -> Result<ExecutionOutcome> {
    let (identity, mut project) = match prepare(ctx, &request.id, &request.version) {
        Ok(prepared) => prepared,
        Err(outcome) => return Ok(outcome),
    };
    let step = InstallPackageStep::new(identity.clone())
        .with_skip_readme_display(!ctx.config().install().show_readme);
    match step.execute(&mut project, ctx.events(), ctx.fs()) {
        Ok(report) => {
            let mut details = serde_json::to_value(&report)?;
            if let Some(readme) = &report.readme {
                if let Ok(text) = std::fs::read_to_string(readme) {
                    details["readme_text"] = Value::String(text);
                }
            }
            Ok(ExecutionOutcome::success(format!("installed {identity}"), details))
        }
        Err(err) => package_error_outcome(&identity, err),
    }
}

/// # Errors
/// Returns an error only for unexpected I/O or persistence failures.
pub fn uninstall_package(
    ctx: &CommandContext,
    request: &UninstallRequest,
) -> Result<ExecutionOutcome> {
    let (identity, mut project) = match prepare(ctx, &request.id, &request.version) {
        Ok(prepared) => prepared,
        Err(outcome) => return Ok(outcome),
    };
    let step = UninstallPackageStep::new(identity.clone()).with_force_remove(request.force);
    match step.execute(&mut project, ctx.events(), ctx.fs()) {
        Ok(report) => Ok(ExecutionOutcome::success(
            format!("uninstalled {identity}"),
            serde_json::to_value(&report)?,
        )),
        Err(err) => package_error_outcome(&identity, err),
    }
}

fn prepare(
    ctx: &CommandContext,
    id: &str,
    version: &str,
) -> Result<(PackageIdentity, FileProject), ExecutionOutcome> {
    let identity = PackageIdentity::parse(id, version).map_err(|err| {
        ExecutionOutcome::user_error(
            format!("invalid package identity: {err}"),
            json!({
                "reason": "invalid_identity",
                "hint": "pass a package id and a version such as 1.2.3.4",
            }),
        )
    })?;
    let project = ctx.open_project().map_err(|err| {
        ExecutionOutcome::user_error(
            format!("{err:#}"),
            json!({
                "reason": "missing_project",
                "hint": format!("run inside a directory containing {MANIFEST_FILE} or pass --project"),
            }),
        )
    })?;
    debug!(package = %identity, project = project.name(), "prepared command");
    Ok((identity, project))
}

fn package_error_outcome(
    identity: &PackageIdentity,
    err: PackageError,
) -> Result<ExecutionOutcome> {
    let reason = err.reason();
    let message = err.to_string();
    match err {
        PackageError::PackageNotFound { .. } => Ok(ExecutionOutcome::user_error(
            message,
            json!({
                "reason": reason,
                "package": identity.to_string(),
                "hint": format!(
                    "install it first with `repkg install {} {}`",
                    identity.id(),
                    identity.version()
                ),
            }),
        )),
        PackageError::DependencyRemoval { dependents, .. } => Ok(ExecutionOutcome::user_error(
            message,
            json!({
                "reason": reason,
                "package": identity.to_string(),
                "dependents": dependents,
                "hint": "pass --force to remove it anyway, or use `repkg reinstall`",
            }),
        )),
        PackageError::InstallResolution { .. } => Ok(ExecutionOutcome::user_error(
            message,
            json!({
                "reason": reason,
                "package": identity.to_string(),
                "hint": "check that the package source contains this version",
            }),
        )),
        PackageError::Subscriber { .. } | PackageError::AlreadyExecuted => {
            Ok(ExecutionOutcome::failure(
                message,
                json!({ "reason": reason, "package": identity.to_string() }),
            ))
        }
        PackageError::Other(err) => Err(err),
    }
}
