//! JSON declaration manifests, for build setups that already know their
//! annotated fields (or for hand-written fixtures).
//!
//! ```json
//! { "package": "com.example",
//!   "fields": [{ "name": "message", "type": "String", "owner": "MyPreferences",
//!                "preference": { "defaultString": "hello" } }],
//!   "preferenceFiles": [{ "name": "prefs", "owner": "Wrapper",
//!                         "preferenceFile": { "fileName": "startup" } }] }
//! ```

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::ir::{AnnotatedField, ClassName, Origin, PreferenceArgs, PreferenceFileArgs, WrapperCandidate};
use crate::scan::kotlin::Scanned;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    package: String,
    #[serde(default)]
    fields: Vec<FieldEntry>,
    #[serde(default)]
    preference_files: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldEntry {
    name: String,
    #[serde(rename = "type")]
    type_token: String,
    /// Declaring class relative to the manifest package (`Outer.Inner`).
    owner: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    preference: PreferenceArgs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileEntry {
    name: String,
    owner: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    preference_file: PreferenceFileArgs,
}

pub fn load_manifest(path: &Path, source: &str) -> Result<Scanned> {
    let manifest: Manifest = from_str_with_path(source)
        .map_err(|message| Error::Manifest { path: path.to_path_buf(), message })?;
    let origin = |line: usize| Origin { path: path.to_path_buf(), line };
    let owner = |entry: &str, dotted: &str| -> Result<ClassName> {
        if dotted.split('.').any(str::is_empty) {
            return Err(Error::Manifest {
                path: path.to_path_buf(),
                message: format!("`{entry}` has an empty or malformed owner `{dotted}`"),
            });
        }
        Ok(ClassName::nested(&manifest.package, dotted))
    };

    let mut out = Scanned { package: manifest.package.clone(), ..Scanned::default() };
    for field in &manifest.fields {
        out.fields.push(AnnotatedField {
            name: field.name.clone(),
            type_token: field.type_token.clone(),
            owner: owner(&field.name, &field.owner)?,
            args: field.preference.clone(),
            origin: origin(field.line),
        });
    }
    for file in &manifest.preference_files {
        out.wrappers.push(WrapperCandidate {
            name: file.name.clone(),
            owner: owner(&file.name, &file.owner)?,
            args: file.preference_file.clone(),
            origin: origin(file.line),
        });
    }
    Ok(out)
}

/// Deserialize with the JSON path of the failure in the message.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> std::result::Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at {path}: {}", err.into_inner())
    })
}
