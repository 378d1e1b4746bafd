use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::context::imports::ImportToken;
use crate::detectors::language::Language;

/// pytest discovery names, tried in this order.
const TEST_FILE_PATTERNS: [&str; 4] = ["tests.py", "test.py", "test_*.py", "*_test.py"];

/* ============================================================
   Public entry
   ============================================================ */

/// First existing Python test under `search_root` whose `from` imports
/// appear to reference `target`. At most one file is ever returned, even
/// when several tests match.
///
/// `cwd` anchors the existence checks for `target` and for literal
/// source-path tokens.
pub fn find_related_test(
    language: Language,
    target: &Path,
    search_root: &Path,
    cwd: &Path,
) -> Option<PathBuf> {
    if language != Language::Python {
        return None;
    }

    let target_exists = cwd.join(target).exists();
    let target_str = target.to_string_lossy();

    for test_file in candidate_test_files(search_root) {
        let content = match fs::read_to_string(&test_file) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping unreadable test file {}: {e}", test_file.display());
                continue;
            }
        };

        let referenced = content
            .lines()
            .filter(|l| l.contains("from "))
            .flat_map(str::split_whitespace)
            .any(|token| token_references(token, &target_str, target_exists, cwd));

        if referenced {
            debug!("{} references {}", test_file.display(), target.display());
            return Some(test_file);
        }
    }

    None
}

/* ============================================================
   Helpers
   ============================================================ */

fn token_references(token: &str, target: &str, target_exists: bool, cwd: &Path) -> bool {
    match ImportToken::classify(token) {
        ImportToken::SourcePath(path) => cwd.join(path).exists() && path.contains(target),
        ImportToken::Other => false,
        module => target_exists && module.candidates().iter().any(|c| target.contains(c.as_str())),
    }
}

/// Test files grouped by pattern, pattern order first, then file name order.
/// A file matching two patterns is listed twice.
fn candidate_test_files(root: &Path) -> Vec<PathBuf> {
    let patterns: Vec<Pattern> = TEST_FILE_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let files: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    let mut ordered = Vec::new();
    for pattern in &patterns {
        for file in &files {
            let name = file.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            if pattern.matches(name) {
                ordered.push(file.clone());
            }
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, name: &str, body: &str) -> PathBuf {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn candidates_follow_pattern_order() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b_test.py", "");
        write(dir.path(), "test_a.py", "");
        write(dir.path(), "pkg/tests.py", "");
        write(dir.path(), "test.py", "");
        write(dir.path(), "notes.py", "");

        let names: Vec<String> = candidate_test_files(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, ["tests.py", "test.py", "test_a.py", "b_test.py"]);
    }

    #[test]
    fn finds_test_importing_target() {
        let project = TempDir::new().unwrap();
        let tool = TempDir::new().unwrap();
        write(project.path(), "billing.py", "def total(): pass\n");
        let test = write(tool.path(), "test_billing.py", "from billing import total\n");

        let found = find_related_test(
            Language::Python,
            Path::new("billing.py"),
            tool.path(),
            project.path(),
        );

        assert_eq!(found, Some(test));
    }

    #[test]
    fn returns_only_the_first_match() {
        let project = TempDir::new().unwrap();
        let tool = TempDir::new().unwrap();
        write(project.path(), "billing.py", "");
        let first = write(tool.path(), "tests.py", "from .billing import total\n");
        write(tool.path(), "test_billing.py", "from billing import total\n");
        write(tool.path(), "billing_test.py", "from billing import total\n");

        let found = find_related_test(
            Language::Python,
            Path::new("billing.py"),
            tool.path(),
            project.path(),
        );

        assert_eq!(found, Some(first));
    }

    #[test]
    fn plain_imports_are_ignored() {
        let project = TempDir::new().unwrap();
        let tool = TempDir::new().unwrap();
        write(project.path(), "billing.py", "");
        write(tool.path(), "test_billing.py", "import billing\n");

        let found = find_related_test(
            Language::Python,
            Path::new("billing.py"),
            tool.path(),
            project.path(),
        );

        assert_eq!(found, None);
    }

    #[test]
    fn missing_target_never_matches_module_tokens() {
        let project = TempDir::new().unwrap();
        let tool = TempDir::new().unwrap();
        write(tool.path(), "test_billing.py", "from billing import total\n");

        let found = find_related_test(
            Language::Python,
            Path::new("billing.py"),
            tool.path(),
            project.path(),
        );

        assert_eq!(found, None);
    }

    #[test]
    fn only_python_is_resolved() {
        let project = TempDir::new().unwrap();
        let tool = TempDir::new().unwrap();
        write(project.path(), "billing.js", "");
        write(tool.path(), "test_billing.py", "from billing import total\n");

        let found = find_related_test(
            Language::JavaScript,
            Path::new("billing.js"),
            tool.path(),
            project.path(),
        );

        assert_eq!(found, None);
    }

    // The search walks the tool's tree, not the target's project.
    #[test]
    fn tests_beside_the_target_are_not_searched() {
        let project = TempDir::new().unwrap();
        let tool = TempDir::new().unwrap();
        write(project.path(), "billing.py", "");
        write(project.path(), "test_billing.py", "from billing import total\n");

        let found = find_related_test(
            Language::Python,
            Path::new("billing.py"),
            tool.path(),
            project.path(),
        );

        assert_eq!(found, None);
    }
}
