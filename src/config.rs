//! Configuration file (`prefext.toml`) and its validation.
//!
//! Every key is optional. Command-line flags override the file; the
//! `KAPT_KOTLIN_GENERATED` environment variable stands in for `--out-dir`.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::codegen::{CodegenSettings, DEFAULT_EDITOR_TYPE, DEFAULT_STORE_TYPE, WriteMode};
use crate::error::{Error, Result};
use crate::lower::ClassFallback;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());
static PACKAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());
static QUALIFIED_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-z_][A-Za-z0-9_]*\.)+[A-Z][A-Za-z0-9_]*(\.[A-Z][A-Za-z0-9_]*)*$").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the generated sources.
    pub out_dir: Option<PathBuf>,
    /// Package of the generated files (default: package of the first field).
    pub package: Option<String>,
    pub class_fallback: ClassFallback,
    pub write_mode: WriteMode,
    pub extensions_file: String,
    pub wrapper_file: String,
    /// Fully qualified key-value store type.
    pub store_type: String,
    /// Fully qualified transactional editor type.
    pub editor_type: String,
    /// Exit non-zero when error diagnostics were reported.
    pub fail_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        let codegen = CodegenSettings::default();
        Self {
            out_dir: None,
            package: None,
            class_fallback: ClassFallback::default(),
            write_mode: WriteMode::default(),
            extensions_file: codegen.extensions_file,
            wrapper_file: codegen.wrapper_file,
            store_type: DEFAULT_STORE_TYPE.to_string(),
            editor_type: DEFAULT_EDITOR_TYPE.to_string(),
            fail_on_error: true,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| Error::Read { path: path.to_path_buf(), source })?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks names that end up verbatim in generated Kotlin.
    pub fn validate(&self) -> Result<()> {
        for (what, name) in [("extensions_file", &self.extensions_file), ("wrapper_file", &self.wrapper_file)] {
            if !IDENTIFIER.is_match(name) {
                return Err(Error::Config(format!("{what} must be a Kotlin identifier, got {name:?}")));
            }
        }
        if self.extensions_file == self.wrapper_file {
            return Err(Error::Config("extensions_file and wrapper_file must differ".to_string()));
        }
        if let Some(package) = &self.package {
            if !PACKAGE.is_match(package) {
                return Err(Error::Config(format!("package must be a dotted Kotlin name, got {package:?}")));
            }
        }
        for (what, name) in [("store_type", &self.store_type), ("editor_type", &self.editor_type)] {
            if !QUALIFIED_CLASS.is_match(name) {
                return Err(Error::Config(format!(
                    "{what} must be a fully qualified class name (e.g. {DEFAULT_STORE_TYPE}), got {name:?}"
                )));
            }
        }
        Ok(())
    }

    pub fn codegen_settings(&self) -> CodegenSettings {
        CodegenSettings {
            package: self.package.clone(),
            write_mode: self.write_mode,
            extensions_file: self.extensions_file.clone(),
            wrapper_file: self.wrapper_file.clone(),
            store_type: self.store_type.clone(),
            editor_type: self.editor_type.clone(),
        }
    }
}
