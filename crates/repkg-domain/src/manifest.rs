use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use toml_edit::{ArrayOfTables, DocumentMut, Item, Table, Value as TomlValue};

use crate::toml::{bool_field, string_field};
use crate::{ProjectReference, ReferenceKind};

pub const MANIFEST_FILE: &str = "repkg.toml";

/// Editable view over `repkg.toml`.
///
/// Only the `[[reference]]` tables are rewritten on render; everything else in
/// the document keeps its original formatting.
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    doc: DocumentMut,
    name: String,
    source: Option<PathBuf>,
    references: Vec<ProjectReference>,
}

impl ProjectManifest {
    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a valid manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parses manifest contents.
    ///
    /// # Errors
    ///
    /// Returns an error when the TOML is invalid, `[project].name` is missing,
    /// or a reference table is malformed.
    pub fn parse(contents: &str) -> Result<Self> {
        let doc: DocumentMut = contents.parse()?;
        let project = doc
            .get("project")
            .and_then(Item::as_table)
            .ok_or_else(|| anyhow!("missing [project] table"))?;
        let name =
            string_field(project, "name").ok_or_else(|| anyhow!("missing [project].name"))?;
        let source = string_field(project, "source").map(PathBuf::from);

        let mut references = Vec::new();
        if let Some(tables) = doc.get("reference").and_then(Item::as_array_of_tables) {
            for table in tables {
                references.push(parse_reference(table)?);
            }
        }

        Ok(Self {
            doc,
            name,
            source,
            references,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn references(&self) -> &[ProjectReference] {
        &self.references
    }

    pub fn references_mut(&mut self) -> &mut Vec<ProjectReference> {
        &mut self.references
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut doc = self.doc.clone();
        if self.references.is_empty() {
            doc.remove("reference");
        } else {
            let mut tables = ArrayOfTables::new();
            for reference in &self.references {
                tables.push(render_reference(reference));
            }
            doc.insert("reference", Item::ArrayOfTables(tables));
        }
        doc.to_string()
    }
}

fn parse_reference(table: &Table) -> Result<ProjectReference> {
    let name = string_field(table, "name").ok_or_else(|| anyhow!("reference without a name"))?;
    let kind = match string_field(table, "kind") {
        Some(raw) => raw.parse()?,
        None => ReferenceKind::Assembly,
    };
    let local_copy = bool_field(table, "local-copy").unwrap_or(true);
    let mut reference = ProjectReference::new(kind, name).with_local_copy(local_copy);
    reference.package = string_field(table, "package");
    Ok(reference)
}

fn render_reference(reference: &ProjectReference) -> Table {
    let mut table = Table::new();
    table.insert("kind", Item::Value(TomlValue::from(reference.kind.as_str())));
    table.insert("name", Item::Value(TomlValue::from(reference.name.as_str())));
    table.insert("local-copy", Item::Value(TomlValue::from(reference.local_copy)));
    if let Some(package) = &reference.package {
        table.insert("package", Item::Value(TomlValue::from(package.as_str())));
    }
    table
}

/// Walks up from `start` looking for a directory that holds `repkg.toml`.
pub fn discover_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(MANIFEST_FILE).is_file() {
            return Some(dir);
        }
        if !dir.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"# keep me
[project]
name = "MyProject"
source = "../feed"

[[reference]]
kind = "assembly"
name = "NUnit.Framework"
local-copy = false
package = "NUnit"

[[reference]]
name = "System.Xml"
"#;

    #[test]
    fn parses_project_and_references() {
        let manifest = ProjectManifest::parse(SAMPLE).unwrap();
        assert_eq!(manifest.name(), "MyProject");
        assert_eq!(manifest.source(), Some(Path::new("../feed")));
        let refs = manifest.references();
        assert_eq!(refs.len(), 2);
        assert!(!refs[0].local_copy);
        assert!(refs[0].is_owned_by("NUnit"));
        assert_eq!(refs[1].kind, ReferenceKind::Assembly);
        assert!(refs[1].local_copy);
        assert_eq!(refs[1].package, None);
    }

    #[test]
    fn render_keeps_other_content() {
        let mut manifest = ProjectManifest::parse(SAMPLE).unwrap();
        manifest.references_mut().remove(1);
        let rendered = manifest.render();
        assert!(rendered.contains("# keep me"));
        assert!(rendered.contains("source = \"../feed\""));
        assert!(!rendered.contains("System.Xml"));

        let reparsed = ProjectManifest::parse(&rendered).unwrap();
        assert_eq!(reparsed.references(), manifest.references());
    }

    #[test]
    fn missing_name_is_rejected() {
        let err = ProjectManifest::parse("[project]\nsource = \"feed\"\n").unwrap_err();
        assert!(err.to_string().contains("name"), "{err}");
    }

    #[test]
    fn discovers_manifest_in_ancestor() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join(MANIFEST_FILE), SAMPLE).unwrap();
        let nested = temp.path().join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(discover_project_root(&nested), Some(temp.path().to_path_buf()));
    }
}
