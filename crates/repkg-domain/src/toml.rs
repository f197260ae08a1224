use std::path::{Component, PathBuf};

use anyhow::{anyhow, Context, Result};
use toml_edit::{Array, Item, Table, Value as TomlValue};

pub(crate) fn string_field(table: &Table, key: &str) -> Option<String> {
    table
        .get(key)
        .and_then(Item::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

pub(crate) fn bool_field(table: &Table, key: &str) -> Option<bool> {
    table.get(key).and_then(Item::as_bool)
}

pub(crate) fn string_array(table: &Table, key: &str) -> Vec<String> {
    table
        .get(key)
        .and_then(Item::as_array)
        .map(|array| {
            array
                .iter()
                .filter_map(TomlValue::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Reads an array of paths that must stay inside the directory they are
/// relative to.
pub(crate) fn relative_path_array(table: &Table, key: &str) -> Result<Vec<PathBuf>> {
    string_array(table, key)
        .iter()
        .map(|raw| relative_path(raw).with_context(|| format!("invalid `{key}` entry")))
        .collect()
}

/// Rejects empty, absolute, and parent-escaping paths.
pub(crate) fn relative_path(raw: &str) -> Result<PathBuf> {
    let path = PathBuf::from(raw);
    let mut normal = false;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(anyhow!("`{raw}` escapes its base directory"));
            }
        }
    }
    if !normal {
        return Err(anyhow!("`{raw}` does not name a file"));
    }
    Ok(path)
}

pub(crate) fn render_array<I, S>(values: I) -> Item
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut array = Array::new();
    for value in values {
        array.push(value.as_ref());
    }
    Item::Value(TomlValue::Array(array))
}

/// Paths are stored with forward slashes regardless of platform.
pub(crate) fn portable_path(path: &std::path::Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn relative_paths_stay_inside_their_base() {
        assert_eq!(
            relative_path("scripts/./lib.js").unwrap(),
            Path::new("scripts/./lib.js")
        );
        assert!(relative_path("../victim.txt").is_err());
        assert!(relative_path("content/../../victim.txt").is_err());
        assert!(relative_path("/etc/passwd").is_err());
        assert!(relative_path("").is_err());
        assert!(relative_path(".").is_err());
    }
}
