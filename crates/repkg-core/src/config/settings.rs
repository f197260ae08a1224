use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub verbose: u8,
    pub trace: bool,
    pub json: bool,
    pub project: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

pub(crate) fn is_truthy(raw: &str) -> bool {
    let value = raw.trim();
    !value.is_empty()
        && !matches!(
            value.to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        )
}

#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) source: SourceConfig,
    pub(crate) install: InstallConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Self {
        Self {
            source: SourceConfig {
                override_dir: snapshot
                    .var("REPKG_SOURCE")
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(PathBuf::from),
            },
            install: InstallConfig {
                show_readme: snapshot.var("REPKG_SHOW_README").map_or(true, is_truthy),
            },
        }
    }

    #[must_use]
    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    #[must_use]
    pub fn install(&self) -> &InstallConfig {
        &self.install
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub override_dir: Option<PathBuf>,
}

impl SourceConfig {
    #[must_use]
    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstallConfig {
    pub show_readme: bool,
}
