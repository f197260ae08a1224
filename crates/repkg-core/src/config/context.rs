use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use repkg_domain::{discover_project_root, MANIFEST_FILE};
use serde::{Deserialize, Serialize};

use crate::config::{Config, GlobalOptions};
use crate::effects::{FileSystem, SharedFileSystem};
use crate::events::PackageEvents;
use crate::project::FileProject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandGroup {
    Reinstall,
    Install,
    Uninstall,
}

impl fmt::Display for CommandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandGroup::Reinstall => "reinstall",
            CommandGroup::Install => "install",
            CommandGroup::Uninstall => "uninstall",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CommandInfo {
    pub group: CommandGroup,
    pub name: &'static str,
}

impl CommandInfo {
    #[must_use]
    pub const fn new(group: CommandGroup, name: &'static str) -> Self {
        Self { group, name }
    }
}

pub struct CommandContext<'a> {
    pub global: &'a GlobalOptions,
    config: Config,
    events: PackageEvents,
    fs: SharedFileSystem,
    project_root: OnceLock<PathBuf>,
}

impl<'a> CommandContext<'a> {
    /// Creates a command context from the process environment.
    #[must_use]
    pub fn new(global: &'a GlobalOptions, fs: SharedFileSystem) -> Self {
        Self::with_config(global, Config::from_env(), fs)
    }

    #[must_use]
    pub fn with_config(global: &'a GlobalOptions, config: Config, fs: SharedFileSystem) -> Self {
        Self {
            global,
            config,
            events: PackageEvents::new(),
            fs,
            project_root: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn events(&self) -> &PackageEvents {
        &self.events
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Resolves the project root: `--project` when given, otherwise the nearest
    /// ancestor of the working directory holding `repkg.toml`.
    ///
    /// # Errors
    /// Returns an error if no project can be found.
    pub fn project_root(&self) -> Result<PathBuf> {
        if let Some(path) = self.project_root.get() {
            return Ok(path.clone());
        }
        let path = match &self.global.project {
            Some(explicit) => explicit.clone(),
            None => {
                let cwd = std::env::current_dir().context("unable to determine project root")?;
                discover_project_root(&cwd).ok_or_else(|| {
                    anyhow!("no {MANIFEST_FILE} found in {} or its parents", cwd.display())
                })?
            }
        };
        let _ = self.project_root.set(path.clone());
        Ok(path)
    }

    /// Opens the file-backed project, honouring `REPKG_SOURCE`.
    ///
    /// # Errors
    /// Returns an error if the project cannot be located or read.
    pub fn open_project(&self) -> Result<FileProject> {
        let root = self.project_root()?;
        FileProject::open(&root, self.config.source().override_dir())
    }
}
