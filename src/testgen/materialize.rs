use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::detectors::language::Language;

#[derive(Debug, thiserror::Error)]
#[error("could not write {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/* ============================================================
   Public entry
   ============================================================ */

/// `<dir>/<stem>_test.<language>` with the language name lower-cased.
pub fn output_path(file: &Path, language: Language) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = format!("{stem}_test.{}", language.name().to_lowercase());

    match file.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Write generated code next to its source, replacing any earlier output.
pub fn materialize_test(
    root: &Path,
    file: &Path,
    language: Language,
    test_code: &str,
) -> Result<PathBuf, WriteError> {
    let path = output_path(file, language);
    let full = root.join(&path);

    ensure_parent_dir(&full)
        .and_then(|_| fs::write(&full, test_code))
        .map_err(|source| WriteError {
            path: path.clone(),
            source,
        })?;

    Ok(path)
}

/* ============================================================
   Helpers
   ============================================================ */

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_names_use_lowercased_language() {
        assert_eq!(
            output_path(Path::new("app.py"), Language::Python),
            PathBuf::from("app_test.python")
        );
        assert_eq!(
            output_path(Path::new("src/lib/engine.cpp"), Language::Cpp),
            PathBuf::from("src/lib/engine_test.c++")
        );
        assert_eq!(
            output_path(Path::new("notes.txt"), Language::Unknown),
            PathBuf::from("notes_test.unknown")
        );
    }

    #[test]
    fn overwrites_previous_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = Path::new("pkg/app.ts");

        materialize_test(dir.path(), file, Language::TypeScript, "old").unwrap();
        let written = materialize_test(dir.path(), file, Language::TypeScript, "new").unwrap();

        assert_eq!(written, PathBuf::from("pkg/app_test.typescript"));
        assert_eq!(
            fs::read_to_string(dir.path().join(&written)).unwrap(),
            "new"
        );
    }
}
