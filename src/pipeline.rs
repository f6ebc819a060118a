//! One generation pass: scan → collect → resolve → emit → write.
use std::path::PathBuf;

use serde::Serialize;

use crate::codegen::{self, GeneratedSource};
use crate::collect::{self, WrapperEntry};
use crate::config::Config;
use crate::diagnostics::{Diagnostics, Reporter};
use crate::error::{Error, Result};
use crate::ir::FieldDecl;
use crate::lower::{self, Binding};
use crate::output;
use crate::scan;

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub source: GeneratedSource,
    /// Files written by [`Generator::run`]; empty for [`Generator::generate`].
    pub written: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
    pub field_count: usize,
    pub wrapper_binding_count: usize,
}

/// Everything a pass knows, for `prefext inspect`.
#[derive(Debug, Serialize)]
struct Inspection<'a> {
    files: &'a [PathBuf],
    fields: &'a [FieldDecl],
    wrappers: Vec<WrapperEntry<'a>>,
    bindings: &'a [Binding<'a>],
    diagnostics: &'a Diagnostics,
}

pub struct Generator {
    config: Config,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Full pass. Fails before reading anything when no output directory is set.
    pub fn run(&self, paths: &[PathBuf]) -> Result<Report> {
        let out_dir = self.config.out_dir.clone().ok_or(Error::MissingOutputConfiguration)?;
        let mut report = self.generate(paths)?;
        report.written = output::write_units(&out_dir, &report.source)?;
        Ok(report)
    }

    /// Everything but writing.
    pub fn generate(&self, paths: &[PathBuf]) -> Result<Report> {
        let mut diagnostics = Diagnostics::new();
        let inputs = scan::load_inputs(paths, &mut diagnostics)?;
        tracing::info!(
            files = inputs.files.len(),
            fields = inputs.fields.len(),
            wrappers = inputs.wrappers.len(),
            "loaded inputs"
        );
        if inputs.fields.is_empty() {
            diagnostics.note("no @Preference properties found; nothing to generate".to_string(), None);
        }

        let decls = collect::collect(&inputs.fields, &inputs.wrappers, &mut diagnostics);
        let bindings = lower::resolve(&decls, self.config.class_fallback, &mut diagnostics);
        let source = codegen::emit(&bindings, &self.config.codegen_settings());

        Ok(Report {
            source,
            written: Vec::new(),
            field_count: bindings.len(),
            wrapper_binding_count: bindings.iter().filter(|b| b.wrapper.is_some()).count(),
            diagnostics,
        })
    }

    /// Collected declarations, wrapper table, bindings and diagnostics as JSON.
    pub fn inspect(&self, paths: &[PathBuf]) -> Result<serde_json::Value> {
        let mut diagnostics = Diagnostics::new();
        let inputs = scan::load_inputs(paths, &mut diagnostics)?;
        let decls = collect::collect(&inputs.fields, &inputs.wrappers, &mut diagnostics);
        let bindings = lower::resolve(&decls, self.config.class_fallback, &mut diagnostics);
        let inspection = Inspection {
            files: &inputs.files,
            fields: &decls.fields,
            wrappers: decls.wrappers.entries().collect(),
            bindings: &bindings,
            diagnostics: &diagnostics,
        };
        Ok(serde_json::to_value(&inspection)?)
    }
}
