// src/context/imports.rs
//
// Import-line scanning and module-name-to-file resolution.
//
// Guarantees:
// - Pure text heuristic, no parsing
// - First existing candidate wins, per token
// - No deduplication; false positives are accepted
//

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::detectors::language::Language;

/* ============================================================
   Constants
   ============================================================ */

pub const SOURCE_EXTENSIONS: [&str; 3] = [".py", ".js", ".ts"];

const IMPORT_MARKERS: [&str; 3] = ["import ", "from ", "require("];

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/* ============================================================
   Token classification
   ============================================================ */

/// How a single whitespace-delimited token of an import line is read.
/// Rules are tried in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportToken<'a> {
    /// `.utils` style: one leading dot. All dots are stripped.
    Relative(String),
    /// `pkg.mod` style: dots become path separators.
    Dotted(String),
    /// Already names a source file.
    SourcePath(&'a str),
    /// Bare identifier, lower-cased.
    Identifier(String),
    Other,
}

impl<'a> ImportToken<'a> {
    pub fn classify(token: &'a str) -> Self {
        let mut chars = token.chars();
        let first = chars.next();
        let second = chars.next();

        if first == Some('.') && second.is_some() && second != Some('.') {
            return ImportToken::Relative(token.replace('.', ""));
        }

        if token.contains('.') {
            return ImportToken::Dotted(token.replace('.', "/"));
        }

        // Shadowed by the dotted rule for every real file name; kept so the
        // rule order stays relative, dotted, literal path, identifier.
        if SOURCE_EXTENSIONS.iter().any(|ext| token.ends_with(ext)) {
            return ImportToken::SourcePath(token);
        }

        if is_identifier(token) {
            return ImportToken::Identifier(token.to_lowercase());
        }

        ImportToken::Other
    }

    /// Relative file names this token could refer to, in the order they are tried.
    pub fn candidates(&self) -> Vec<String> {
        match self {
            ImportToken::Relative(base)
            | ImportToken::Dotted(base)
            | ImportToken::Identifier(base) => SOURCE_EXTENSIONS
                .iter()
                .map(|ext| format!("{base}{ext}"))
                .collect(),
            ImportToken::SourcePath(path) => vec![path.to_string()],
            ImportToken::Other => Vec::new(),
        }
    }
}

/// Python's `str.isidentifier`, near enough.
pub fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {
            chars.all(|c| c == '_' || c.is_alphanumeric())
        }
        _ => false,
    }
}

pub fn is_import_line(line: &str) -> bool {
    IMPORT_MARKERS.iter().any(|m| line.contains(m))
}

/* ============================================================
   Related source files
   ============================================================ */

/// Files referenced by `file`'s import lines that exist under `root`.
///
/// Returned paths are the candidates that exist, relative to `root`.
/// Languages outside Python/JavaScript/TypeScript always yield nothing.
pub fn find_related_files(
    language: Language,
    file: &Path,
    root: &Path,
) -> Result<Vec<PathBuf>, ResolveError> {
    if !language.scans_imports() {
        return Ok(Vec::new());
    }

    let text = fs::read_to_string(file).map_err(|source| ResolveError::Read {
        path: file.to_path_buf(),
        source,
    })?;

    let mut related = Vec::new();

    for line in text.lines().filter(|l| is_import_line(l)) {
        for token in line.split_whitespace() {
            let hit = ImportToken::classify(token)
                .candidates()
                .into_iter()
                .find(|c| root.join(c).exists());

            if let Some(found) = hit {
                debug!("{}: `{token}` -> {found}", file.display());
                related.push(PathBuf::from(found));
            }
        }
    }

    Ok(related)
}
