#![allow(dead_code)]

use std::{
    fs,
    path::{Path, PathBuf},
};

use assert_cmd::assert::Assert;
use serde_json::Value;
use tempfile::TempDir;
use toml_edit::DocumentMut;

/// A project at `<temp>/app` with `Lib@1.0.0.0` installed from `<temp>/feed`.
///
/// The installed `Lib.Core` reference has `local-copy = false`; the feed
/// descriptor leaves it at the default of `true`.
pub fn prepare_fixture(prefix: &str) -> (TempDir, PathBuf) {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir");
    let app = temp.path().join("app");
    let feed = temp.path().join("feed").join("Lib").join("1.0.0.0");

    write(
        &app.join("repkg.toml"),
        r#"[project]
name = "App"
source = "../feed"

[[reference]]
kind = "assembly"
name = "Lib.Core"
local-copy = false
package = "Lib"

[[reference]]
kind = "assembly"
name = "System.Xml"
"#,
    );
    write(
        &app.join("packages.toml"),
        r#"[[package]]
id = "Lib"
version = "1.0.0.0"
files = ["scripts/lib.js"]
"#,
    );
    write(&app.join("scripts").join("lib.js"), "// stale\n");

    write(
        &feed.join("package.toml"),
        r#"[package]
id = "Lib"
version = "1.0.0.0"
readme = "readme.txt"
files = ["scripts/lib.js"]

[[reference]]
kind = "assembly"
name = "Lib.Core"

[[reference]]
kind = "assembly"
name = "Lib.Extras"
"#,
    );
    write(&feed.join("scripts").join("lib.js"), "// fresh\n");
    write(&feed.join("readme.txt"), "Thanks for installing Lib.\n");

    (temp, app)
}

pub fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    fs::write(path, contents).expect("write fixture file");
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

/// Returns the `local-copy` flag of the named `[[reference]]`, defaulting to true.
pub fn reference_local_copy(app: &Path, name: &str) -> Option<bool> {
    let contents = fs::read_to_string(app.join("repkg.toml")).expect("read manifest");
    let doc: DocumentMut = contents.parse().expect("valid manifest");
    let references = doc.get("reference")?.as_array_of_tables()?;
    let found = references
        .iter()
        .find(|table| table.get("name").and_then(|item| item.as_str()) == Some(name))
        .map(|table| {
            table
                .get("local-copy")
                .and_then(|item| item.as_bool())
                .unwrap_or(true)
        });
    found
}

pub fn installed_ids(app: &Path) -> Vec<String> {
    let contents = fs::read_to_string(app.join("packages.toml")).expect("read tracking file");
    let doc: DocumentMut = contents.parse().expect("valid tracking file");
    let ids = doc
        .get("package")
        .and_then(|item| item.as_array_of_tables())
        .map(|tables| {
            tables
                .iter()
                .filter_map(|table| table.get("id").and_then(|item| item.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    ids
}
