use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::Config;
use crate::context::imports::find_related_files;
use crate::detectors::framework::{framework_for, TestFramework};
use crate::detectors::language::Language;
use crate::testgen::coverage::{generate_coverage_report, read_report};
use crate::testgen::resolve::find_related_test;

#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("error reading file {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A related file and its full text.
#[derive(Debug, Clone)]
pub struct RelatedFile {
    pub path: PathBuf,
    pub content: String,
}

/* ============================================================
   Gathering
   ============================================================ */

/// Read `file` plus whatever context can be found for it and compose the
/// prompt. Only an unreadable `file` is an error; missing context is logged
/// and left out.
///
/// `cwd` is where relative paths (the file itself, related modules) are
/// resolved from.
pub fn create_prompt(
    cfg: &Config,
    file: &Path,
    language: Language,
    cwd: &Path,
) -> Result<String, PromptError> {
    let source_path = cwd.join(file);
    let source = fs::read_to_string(&source_path).map_err(|source| PromptError::Source {
        path: file.to_path_buf(),
        source,
    })?;

    let related = gather_related(file, &source_path, language, cwd);
    let coverage = gather_coverage(cfg, file, language, cwd);

    Ok(compose_prompt(
        file,
        language,
        framework_for(language),
        &source,
        &related,
        &coverage,
    ))
}

fn gather_related(
    file: &Path,
    source_path: &Path,
    language: Language,
    cwd: &Path,
) -> Vec<RelatedFile> {
    let paths = match find_related_files(language, source_path, cwd) {
        Ok(p) => p,
        Err(e) => {
            error!("Error identifying related files in {}: {e}", file.display());
            Vec::new()
        }
    };

    if paths.is_empty() {
        info!("No related files found for {} to reference", file.display());
    } else {
        info!("Related files for {}: {:?}", file.display(), paths);
    }

    paths
        .into_iter()
        .filter_map(|path| match fs::read_to_string(cwd.join(&path)) {
            Ok(content) => Some(RelatedFile { path, content }),
            Err(e) => {
                error!("Error reading related file {}: {e}", path.display());
                None
            }
        })
        .collect()
}

fn gather_coverage(cfg: &Config, file: &Path, language: Language, cwd: &Path) -> String {
    let Some(test_file) = find_related_test(language, file, &cfg.test_root, cwd) else {
        return String::new();
    };

    info!("Existing test for {}: {}", file.display(), test_file.display());

    let report = match generate_coverage_report(&test_file, language, &cfg.jest_config) {
        Ok(Some(report)) => report,
        Ok(None) => return String::new(),
        Err(e) => {
            error!("Error generating coverage report for {}: {e}", test_file.display());
            return String::new();
        }
    };

    read_report(&report).unwrap_or_else(|e| {
        warn!("Error reading coverage report: {e}");
        String::new()
    })
}

/* ============================================================
   Composition
   ============================================================ */

pub fn compose_prompt(
    file: &Path,
    language: Language,
    framework: TestFramework,
    source: &str,
    related: &[RelatedFile],
    coverage: &str,
) -> String {
    let mut out = format!(
        "The following is a {language} file '{}' that uses the {framework} testing framework:\n\n{source}\n\n",
        file.display()
    );

    let related_content: String = related
        .iter()
        .map(|r| format!("\n{}:\n{}", r.path.display(), r.content))
        .collect();

    if !related_content.is_empty() {
        out.push_str(&format!("\nRelated files:\n{related_content}\n\n"));
    }

    if !coverage.is_empty() {
        out.push_str(&format!("\nCode coverage report:\n{coverage}\n\n"));
    }

    out.push_str(&format!(
        "Write test cases for the code above using {framework}. \
         Ensure that any uncovered lines in the coverage report are fully tested."
    ));

    out
}
