//! Golden fixture runner.
//!
//! Every directory under `fixtures/` (or the directory given as the first
//! argument) is one case:
//!
//! ```text
//! fixtures/<case>/input/*.{kt,kts,json}   scanned in name order
//! fixtures/<case>/prefext.toml            optional config
//! fixtures/<case>/expected/**/*.kt        exact expected output, by package path
//! ```
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use prefext::Generator;
use prefext::config::Config;

fn main() -> Result<ExitCode> {
    let root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("fixtures"));
    let mut cases: Vec<PathBuf> = std::fs::read_dir(&root)
        .with_context(|| format!("reading {}", root.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    cases.sort();

    let mut failed = 0usize;
    for case in &cases {
        let name = case.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match run_case(case) {
            Ok(()) => eprintln!("{} {name}", "✓".green()),
            Err(error) => {
                failed += 1;
                eprintln!("{} {name}: {error:#}", "✗".red());
            }
        }
    }
    eprintln!("{} cases, {} failed", cases.len(), failed);
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn run_case(case: &Path) -> Result<()> {
    let config_path = case.join("prefext.toml");
    let config = if config_path.exists() { Config::load(&config_path)? } else { Config::default() };

    let pattern = format!("{}/input/*", case.display());
    let mut inputs: Vec<PathBuf> = glob::glob(&pattern)?.filter_map(|p| p.ok()).collect();
    inputs.sort();

    let report = Generator::new(config).generate(&inputs)?;
    let expected_dir = case.join("expected");
    let mut expected = files_under(&expected_dir)?;
    expected.sort();

    let mut produced: Vec<PathBuf> = report.source.units.iter().map(|u| report.source.relative_path(u)).collect();
    produced.sort();
    if produced != expected {
        bail!("produced {produced:?}, expected {expected:?}");
    }

    for unit in &report.source.units {
        let relative = report.source.relative_path(unit);
        let want = std::fs::read_to_string(expected_dir.join(&relative))?;
        if let Some((line, got, want)) = first_difference(&unit.source, &want) {
            bail!("{}:{line}\n  got:  {got}\n  want: {want}", relative.display());
        }
    }
    Ok(())
}

fn files_under(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.kt", dir.display());
    let mut out = Vec::new();
    for path in glob::glob(&pattern)? {
        let path = path?;
        out.push(path.strip_prefix(dir)?.to_path_buf());
    }
    Ok(out)
}

fn first_difference<'a>(got: &'a str, want: &'a str) -> Option<(usize, &'a str, &'a str)> {
    let mut got_lines = got.lines();
    let mut want_lines = want.lines();
    let mut line = 1;
    loop {
        match (got_lines.next(), want_lines.next()) {
            (None, None) => return (got.ends_with('\n') != want.ends_with('\n')).then_some((line, "<eof>", "<eof>")),
            (g, w) if g == w => line += 1,
            (g, w) => return Some((line, g.unwrap_or("<eof>"), w.unwrap_or("<eof>"))),
        }
    }
}
