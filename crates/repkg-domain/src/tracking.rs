use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, Value as TomlValue};

use crate::toml::{portable_path, relative_path_array, render_array, string_array, string_field};
use crate::{InstalledPackage, PackageIdentity};

pub const TRACKING_FILE: &str = "packages.toml";

/// Reads the package-tracking file; a missing file means nothing is installed.
///
/// # Errors
///
/// Returns an error when the file exists but cannot be read or parsed.
pub fn load_tracking_file(path: &Path) -> Result<Vec<InstalledPackage>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_tracking_file(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

/// # Errors
///
/// Returns an error on invalid TOML or a `[[package]]` entry without a valid
/// id and version.
pub fn parse_tracking_file(contents: &str) -> Result<Vec<InstalledPackage>> {
    let doc: DocumentMut = contents.parse()?;
    let Some(tables) = doc.get("package").and_then(Item::as_array_of_tables) else {
        return Ok(Vec::new());
    };
    tables.iter().map(parse_package).collect()
}

fn parse_package(table: &Table) -> Result<InstalledPackage> {
    let id = string_field(table, "id").ok_or_else(|| anyhow!("package entry without an id"))?;
    let version = string_field(table, "version")
        .ok_or_else(|| anyhow!("package {id} has no version"))?;
    let files = relative_path_array(table, "files")
        .with_context(|| format!("package {id} lists a file outside the project"))?;
    Ok(InstalledPackage {
        identity: PackageIdentity::parse(&id, &version)?,
        dependencies: string_array(table, "dependencies"),
        files,
    })
}

#[must_use]
pub fn render_tracking_file(packages: &[InstalledPackage]) -> String {
    let mut ordered: Vec<&InstalledPackage> = packages.iter().collect();
    ordered.sort_by(|a, b| a.identity.id().cmp(b.identity.id()));

    let mut tables = ArrayOfTables::new();
    for package in ordered {
        let mut table = Table::new();
        table.insert("id", Item::Value(TomlValue::from(package.identity.id())));
        table.insert(
            "version",
            Item::Value(TomlValue::from(package.identity.version().to_string())),
        );
        table.insert("dependencies", render_array(&package.dependencies));
        table.insert(
            "files",
            render_array(package.files.iter().map(|path| portable_path(path))),
        );
        tables.push(table);
    }

    let mut doc = DocumentMut::new();
    if !tables.is_empty() {
        doc.insert("package", Item::ArrayOfTables(tables));
    }
    doc.to_string()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn render_then_parse_preserves_entries() {
        let mut nunit = InstalledPackage::new(PackageIdentity::parse("NUnit", "2.6.3").unwrap());
        nunit.files.push(PathBuf::from("content").join("nunit.txt"));
        let mut app = InstalledPackage::new(PackageIdentity::parse("App.Core", "1.2.3.4").unwrap());
        app.dependencies.push("NUnit".to_string());

        let rendered = render_tracking_file(&[nunit.clone(), app.clone()]);
        assert!(rendered.contains("content/nunit.txt"), "{rendered}");
        let parsed = parse_tracking_file(&rendered).unwrap();
        assert_eq!(parsed, vec![app, nunit]);
    }

    #[test]
    fn missing_file_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let packages = load_tracking_file(&temp.path().join(TRACKING_FILE)).unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn entry_without_version_is_rejected() {
        let err = parse_tracking_file("[[package]]\nid = \"NUnit\"\n").unwrap_err();
        assert!(err.to_string().contains("no version"), "{err}");
    }

    #[test]
    fn files_outside_the_project_are_rejected() {
        for entry in ["../victim.txt", "/tmp/victim.txt"] {
            let contents =
                format!("[[package]]\nid = \"Lib\"\nversion = \"1.0\"\nfiles = [\"{entry}\"]\n");
            let err = parse_tracking_file(&contents).unwrap_err();
            assert!(
                format!("{err:#}").contains("outside the project"),
                "{entry}: {err:#}"
            );
        }
    }
}
