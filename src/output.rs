use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::codegen::GeneratedSource;
use crate::error::{Error, Result};

/// Writes every unit below `out_dir/<package path>/`, one open-write-close
/// per file. Returns the written paths in unit order.
pub fn write_units(out_dir: &Path, source: &GeneratedSource) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(source.units.len());
    for unit in &source.units {
        let path = out_dir.join(source.relative_path(unit));
        write_file(&path, unit.source.as_bytes())?;
        tracing::info!(path = %path.display(), bytes = unit.source.len(), "wrote generated source");
        written.push(path);
    }
    Ok(written)
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    let fail = |source: std::io::Error| Error::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(fail)?;
    }
    let mut writer = BufWriter::new(File::create(path).map_err(fail)?);
    writer.write_all(contents).map_err(fail)?;
    writer.flush().map_err(fail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::GeneratedUnit;

    #[test]
    fn writes_into_package_directories() {
        let dir = tempfile::tempdir().unwrap();
        let source = GeneratedSource {
            package: "com.example".into(),
            units: vec![
                GeneratedUnit { file_name: "PreferenceExtensions.kt".into(), source: "a\n".into() },
                GeneratedUnit { file_name: "PreferenceWrapperExtensions.kt".into(), source: "b\n".into() },
            ],
        };
        let written = write_units(dir.path(), &source).unwrap();
        assert_eq!(written.len(), 2);
        let first = dir.path().join("com/example/PreferenceExtensions.kt");
        assert_eq!(written[0], first);
        assert_eq!(std::fs::read_to_string(first).unwrap(), "a\n");
    }

    #[test]
    fn default_package_writes_at_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let source = GeneratedSource {
            package: String::new(),
            units: vec![GeneratedUnit { file_name: "PreferenceExtensions.kt".into(), source: String::new() }],
        };
        let written = write_units(dir.path(), &source).unwrap();
        assert_eq!(written, [dir.path().join("PreferenceExtensions.kt")]);
    }
}
