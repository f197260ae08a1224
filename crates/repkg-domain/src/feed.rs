use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use toml_edit::{DocumentMut, Item};

use crate::toml::{bool_field, relative_path, relative_path_array, string_array, string_field};
use crate::{PackageContent, PackageIdentity, ReferenceKind, ReferenceSpec};

pub const PACKAGE_DESCRIPTOR: &str = "package.toml";

/// Directory a package version lives in: `<source>/<id>/<version>`.
pub fn package_dir(source: &Path, identity: &PackageIdentity) -> PathBuf {
    source
        .join(identity.id())
        .join(identity.version().to_string())
}

/// Looks `identity` up in a directory feed.
///
/// Returns `Ok(None)` when the feed has no descriptor for that id and version.
///
/// # Errors
///
/// Returns an error when the descriptor exists but is unreadable, malformed, or
/// describes a different package.
pub fn load_package(source: &Path, identity: &PackageIdentity) -> Result<Option<PackageContent>> {
    let dir = package_dir(source, identity);
    let descriptor = dir.join(PACKAGE_DESCRIPTOR);
    if !descriptor.is_file() {
        tracing::debug!(path = %descriptor.display(), "package descriptor not found");
        return Ok(None);
    }
    let contents = fs::read_to_string(&descriptor)
        .with_context(|| format!("reading {}", descriptor.display()))?;
    let content = parse_descriptor(&contents, dir)
        .with_context(|| format!("failed to parse {}", descriptor.display()))?;
    if &content.identity != identity {
        return Err(anyhow!(
            "{} describes {} instead of {identity}",
            descriptor.display(),
            content.identity
        ));
    }
    Ok(Some(content))
}

fn parse_descriptor(contents: &str, root: PathBuf) -> Result<PackageContent> {
    let doc: DocumentMut = contents.parse()?;
    let package = doc
        .get("package")
        .and_then(Item::as_table)
        .ok_or_else(|| anyhow!("missing [package] table"))?;
    let id = string_field(package, "id").ok_or_else(|| anyhow!("missing [package].id"))?;
    let version =
        string_field(package, "version").ok_or_else(|| anyhow!("missing [package].version"))?;

    let mut content = PackageContent::new(PackageIdentity::parse(&id, &version)?, root);
    content.dependencies = string_array(package, "dependencies");
    content.files = relative_path_array(package, "files")?;
    content.readme = string_field(package, "readme")
        .map(|raw| relative_path(&raw).context("invalid `readme` entry"))
        .transpose()?;

    if let Some(tables) = doc.get("reference").and_then(Item::as_array_of_tables) {
        for table in tables {
            let name =
                string_field(table, "name").ok_or_else(|| anyhow!("reference without a name"))?;
            let kind = match string_field(table, "kind") {
                Some(raw) => raw.parse()?,
                None => ReferenceKind::Assembly,
            };
            content.references.push(ReferenceSpec {
                kind,
                name,
                local_copy: bool_field(table, "local-copy").unwrap_or(true),
            });
        }
    }
    Ok(content)
}
