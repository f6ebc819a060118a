use std::path::PathBuf;

/// Fatal failures of a generation pass.
///
/// Per-field problems (unsupported types, bad annotation arguments) are not
/// errors; they go through [`crate::diagnostics::Reporter`] and the pass
/// carries on without the offending field.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no output directory configured (pass --out-dir, set KAPT_KOTLIN_GENERATED or `out_dir` in the config file)")]
    MissingOutputConfiguration,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("unsupported input file {0} (expected .kt, .kts or .json)")]
    UnsupportedInput(PathBuf),

    #[error("{0}")]
    Pattern(String),

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
