//! `prefext`: typed `SharedPreferences` extensions generated from
//! `@Preference`-annotated Kotlin properties.
//!
//! Pipeline: [`scan`] (Kotlin sources or JSON manifests) → [`collect`]
//! (validated declarations, wrapper table) → [`lower`] (wrapper binding
//! resolution) → [`codegen`] (Kotlin source) → [`output`].
pub mod cli;
pub mod codegen;
pub mod collect;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod lower;
pub mod output;
pub mod pipeline;
pub mod registry;
pub mod scan;

pub use error::{Error, Result};
pub use pipeline::{Generator, Report};
