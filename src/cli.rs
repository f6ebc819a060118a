//! CLI: scan → (generate | inspect | types)
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::codegen::WriteMode;
use crate::config::Config;
use crate::error::Error;
use crate::lower::ClassFallback;
use crate::pipeline::Generator;
use crate::registry::PrefKind;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate typed SharedPreferences extensions from @Preference-annotated Kotlin properties
#[derive(Parser, Debug)]
#[command(name = "prefext", version)]
pub struct CommandLineInterface {
    /// debug-level logging (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// scan inputs and write the generated Kotlin sources
    Generate(GenerateOut),
    /// scan inputs and print collected declarations and bindings as JSON
    Inspect(InspectOut),
    /// print the supported types and their SharedPreferences accessors
    Types,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs (.kt, .kts or .json manifests). May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// prefext.toml configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// wrapper matching by declaring class: only without file-keyed wrappers, or always
    #[arg(long, value_enum)]
    class_fallback: Option<ClassFallback>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// root directory for generated sources
    #[arg(long, env = "KAPT_KOTLIN_GENERATED")]
    out_dir: Option<PathBuf>,

    /// package of the generated files (default: package of the first annotated property)
    #[arg(long)]
    package: Option<String>,

    /// how generated setters finish the editor transaction
    #[arg(long, value_enum)]
    write_mode: Option<WriteMode>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct InspectOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(policy) = self.class_fallback {
            config.class_fallback = policy;
        }
        Ok(config)
    }

    fn paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        Ok(crate::scan::resolve_file_path_patterns(&self.input)?)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }

                let mut config = target.input_settings.config()?;
                if let Some(out_dir) = &target.out_dir {
                    config.out_dir = Some(out_dir.clone());
                }
                if let Some(package) = &target.package {
                    config.package = Some(package.clone());
                }
                if let Some(mode) = target.write_mode {
                    config.write_mode = mode;
                }
                config.validate()?;
                // before glob resolution: nothing is read without a destination
                if config.out_dir.is_none() {
                    return Err(Error::MissingOutputConfiguration.into());
                }

                let generator = Generator::new(config);
                let paths = target.input_settings.paths()?;
                let report = generator.run(&paths)?;

                report.diagnostics.render();
                for path in &report.written {
                    eprintln!("{} {}", "wrote".green().bold(), path.display());
                }
                eprintln!(
                    "{} properties, {} wrapper bindings, {} errors",
                    report.field_count,
                    report.wrapper_binding_count,
                    report.diagnostics.error_count(),
                );
                if report.diagnostics.has_errors() && generator.config().fail_on_error {
                    return Ok(ExitCode::FAILURE);
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Inspect(target) => {
                let config = target.input_settings.config()?;
                let paths = target.input_settings.paths()?;
                let value = Generator::new(config).inspect(&paths)?;
                let src = serde_json::to_string_pretty(&value)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &src)?;
                } else {
                    println!("{src}");
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Types => {
                println!("{:<10} {:<12} {}", "kind", "kotlin type", "accessors");
                for kind in PrefKind::ALL {
                    let mapping = kind.mapping();
                    println!(
                        "{:<10} {:<12} get{suffix} / put{suffix}",
                        format!("{kind:?}"),
                        mapping.native_type,
                        suffix = mapping.accessor_suffix,
                    );
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
