//! Input front ends: Kotlin sources and JSON manifests.
//!
//! Both produce the same raw material ([`AnnotatedField`] and
//! [`WrapperCandidate`]) in input order; nothing here interprets types or
//! resolves wrappers.
pub mod kotlin;
pub mod lexer;
pub mod manifest;

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::diagnostics::Reporter;
use crate::error::{Error, Result};
use crate::ir::{AnnotatedField, WrapperCandidate};

pub use kotlin::Scanned;

#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub files: Vec<PathBuf>,
    pub fields: Vec<AnnotatedField>,
    pub wrappers: Vec<WrapperCandidate>,
}

impl Inputs {
    pub fn extend(&mut self, path: &Path, scanned: Scanned) {
        tracing::debug!(
            path = %path.display(),
            fields = scanned.fields.len(),
            wrappers = scanned.wrappers.len(),
            "scanned input"
        );
        self.files.push(path.to_path_buf());
        self.fields.extend(scanned.fields);
        self.wrappers.extend(scanned.wrappers);
    }
}

/// Reads every file, in order, through the front end its extension selects.
pub fn load_inputs(paths: &[PathBuf], reporter: &mut dyn Reporter) -> Result<Inputs> {
    let mut inputs = Inputs::default();
    for path in paths {
        let scanned = load_file(path, reporter)?;
        inputs.extend(path, scanned);
    }
    Ok(inputs)
}

pub fn load_file(path: &Path, reporter: &mut dyn Reporter) -> Result<Scanned> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if !matches!(extension, "kt" | "kts" | "json") {
        return Err(Error::UnsupportedInput(path.to_path_buf()));
    }
    let source = std::fs::read_to_string(path)
        .map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
    match extension {
        "json" => manifest::load_manifest(path, &source),
        _ => kotlin::scan_source(path, &source, reporter),
    }
}

/// Expands quoted glob patterns; literal paths pass through unchanged.
/// Order is pattern order, then glob order; repeats are dropped.
pub fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = IndexSet::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let entries = glob::glob(pattern)
                .map_err(|e| Error::Pattern(format!("invalid glob pattern {pattern}: {e}")))?;
            let mut matched_any = false;
            for entry in entries {
                let path = entry.map_err(|e| Error::Pattern(e.to_string()))?;
                matched_any = true;
                out.insert(path);
            }
            if !matched_any {
                return Err(Error::Pattern(format!("glob pattern matched no files: {pattern}")));
            }
        } else {
            out.insert(PathBuf::from(pattern));
        }
    }

    Ok(out.into_iter().collect())
}
