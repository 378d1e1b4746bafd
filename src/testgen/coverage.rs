// Runs the external coverage tool for a resolved test file and leaves a
// plain-text report beside it. Reports are never cleaned up.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, error, info, warn};

use crate::detectors::language::Language;

#[derive(Debug, thiserror::Error)]
pub enum CoverageError {
    #[error("could not start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("coverage tool for {language} is not installed")]
    NotInstalled { language: Language },

    #[error("report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// `<dir>/<stem>_coverage_report.txt` for a given test file.
pub fn coverage_report_path(test_file: &Path) -> PathBuf {
    let stem = test_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    test_file
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{stem}_coverage_report.txt"))
}

/* ============================================================
   Public API
   ============================================================ */

/// Produce a report for `test_file`. `Ok(None)` means the language has no
/// coverage tooling wired up.
pub fn generate_coverage_report(
    test_file: &Path,
    language: Language,
    jest_config: &Path,
) -> Result<Option<PathBuf>, CoverageError> {
    let report = coverage_report_path(test_file);

    match language {
        Language::Python => {
            ensure_tool(language)?;
            let [run, report_cmd] = python_commands(test_file);
            run_python_steps(run, report_cmd, &report)?;
        }

        Language::JavaScript => {
            ensure_tool(language)?;
            run_checked(jest_command(jest_config), Sink::File(&report))?;
        }

        _ => return Ok(None),
    }

    info!("Code coverage report saved to {}", report.display());
    Ok(Some(report))
}

/// Whether the coverage tool for `language` is installed. Nothing is
/// installed on the caller's behalf.
pub fn coverage_tool_available(language: Language) -> bool {
    let Some(cmd) = tool_check_command(language) else {
        match language {
            Language::Java => info!("Make sure Jacoco is configured in your Maven/Gradle build."),
            _ => warn!("Coverage tool check is not configured for {language}."),
        }
        return false;
    };

    match run_checked(cmd, Sink::Discard) {
        Ok(_) => {
            debug!("Coverage tool for {language} is installed.");
            true
        }
        Err(e) => {
            error!("Coverage tool for {language} is not installed: {e}");
            false
        }
    }
}

fn ensure_tool(language: Language) -> Result<(), CoverageError> {
    if coverage_tool_available(language) {
        Ok(())
    } else {
        Err(CoverageError::NotInstalled { language })
    }
}

/* ============================================================
   Commands
   ============================================================ */

/// `coverage run <test>` then `coverage report -m` without site-packages.
pub fn python_commands(test_file: &Path) -> [Command; 2] {
    let mut run = Command::new("coverage");
    run.arg("run").arg(test_file);

    let mut report = Command::new("coverage");
    report.arg("report").arg("-m").arg("--omit=*/site-packages/*");

    [run, report]
}

pub fn jest_command(jest_config: &Path) -> Command {
    let mut jest = Command::new("jest");
    jest.arg("--coverage")
        .arg(format!("--config={}", jest_config.display()));
    jest
}

fn tool_check_command(language: Language) -> Option<Command> {
    match language {
        Language::Python => {
            let mut pip = Command::new("python3");
            pip.args(["-m", "pip", "show", "coverage"]);
            Some(pip)
        }
        Language::JavaScript => {
            let mut npm = Command::new("npm");
            npm.args(["list", "jest"]);
            Some(npm)
        }
        _ => None,
    }
}

/* ============================================================
   Helpers
   ============================================================ */

/// Where a child's stdout goes.
enum Sink<'a> {
    Inherit,
    Discard,
    File(&'a Path),
}

/// The report file is only created once the instrumented run succeeded.
fn run_python_steps(run: Command, report_cmd: Command, report: &Path) -> Result<(), CoverageError> {
    run_checked(run, Sink::Inherit)?;
    run_checked(report_cmd, Sink::File(report))?;
    Ok(())
}

/// Run to completion, capturing stderr for the error message.
fn run_checked(mut cmd: Command, stdout: Sink<'_>) -> Result<Output, CoverageError> {
    let command = describe(&cmd);

    match stdout {
        Sink::File(path) => {
            let file = File::create(path).map_err(|source| CoverageError::Report {
                path: path.to_path_buf(),
                source,
            })?;
            cmd.stdout(Stdio::from(file));
        }
        Sink::Inherit => {
            cmd.stdout(Stdio::inherit());
        }
        Sink::Discard => {
            cmd.stdout(Stdio::null());
        }
    }
    cmd.stderr(Stdio::piped());

    let output = cmd.output().map_err(|source| CoverageError::Spawn {
        program: cmd.get_program().to_string_lossy().into_owned(),
        source,
    })?;

    if !output.status.success() {
        return Err(CoverageError::Failed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

fn describe(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Report text, if one was written.
pub fn read_report(path: &Path) -> Result<String, CoverageError> {
    fs::read_to_string(path).map_err(|source| CoverageError::Report {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_path_sits_beside_test_file() {
        assert_eq!(
            coverage_report_path(Path::new("tests/test_api.py")),
            PathBuf::from("tests/test_api_coverage_report.txt")
        );
        assert_eq!(
            coverage_report_path(Path::new("test_api.py")),
            PathBuf::from("test_api_coverage_report.txt")
        );
    }

    fn command_line(cmd: &Command) -> Vec<String> {
        describe(cmd).split(' ').map(String::from).collect()
    }

    #[test]
    fn python_runs_then_reports() {
        let [run, report] = python_commands(Path::new("tests/test_api.py"));

        assert_eq!(command_line(&run), ["coverage", "run", "tests/test_api.py"]);
        assert_eq!(
            command_line(&report),
            ["coverage", "report", "-m", "--omit=*/site-packages/*"]
        );
    }

    #[test]
    fn jest_uses_coverage_flag_and_config() {
        let jest = jest_command(Path::new("ci/jest.config.js"));
        assert_eq!(
            command_line(&jest),
            ["jest", "--coverage", "--config=ci/jest.config.js"]
        );
    }

    #[test]
    fn tool_checks_exist_only_for_python_and_javascript() {
        let pip = tool_check_command(Language::Python).unwrap();
        assert_eq!(command_line(&pip), ["python3", "-m", "pip", "show", "coverage"]);

        let npm = tool_check_command(Language::JavaScript).unwrap();
        assert_eq!(command_line(&npm), ["npm", "list", "jest"]);

        assert!(tool_check_command(Language::Go).is_none());
        assert!(!coverage_tool_available(Language::Java));
    }

    #[cfg(unix)]
    #[test]
    fn failed_instrumented_run_writes_no_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = dir.path().join("test_api_coverage_report.txt");

        let mut run = Command::new("sh");
        run.arg("-c").arg("echo 'ImportError' >&2; exit 1");
        let mut report_cmd = Command::new("sh");
        report_cmd.arg("-c").arg("echo TOTAL");

        let err = run_python_steps(run, report_cmd, &report).unwrap_err();

        assert!(matches!(err, CoverageError::Failed { ref stderr, .. } if stderr == "ImportError"));
        assert!(!report.exists());
    }

    #[cfg(unix)]
    #[test]
    fn successful_steps_fill_the_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = dir.path().join("test_api_coverage_report.txt");

        let mut run = Command::new("sh");
        run.arg("-c").arg("exit 0");
        let mut report_cmd = Command::new("sh");
        report_cmd.arg("-c").arg("echo 'TOTAL 10 2 80%'");

        run_python_steps(run, report_cmd, &report).unwrap();
        assert_eq!(read_report(&report).unwrap(), "TOTAL 10 2 80%\n");
    }

    #[test]
    fn unsupported_languages_are_a_no_op() {
        let dir = tempfile::TempDir::new().unwrap();
        let test_file = dir.path().join("FooTest.java");

        let out = generate_coverage_report(&test_file, Language::Java, Path::new("jest.config.js"))
            .unwrap();

        assert!(out.is_none());
        assert!(!coverage_report_path(&test_file).exists());
    }

    #[test]
    fn missing_tool_is_reported_as_spawn_error() {
        let cmd = Command::new("definitely-not-a-coverage-tool-4d1c");
        let err = run_checked(cmd, Sink::Discard).unwrap_err();
        assert!(matches!(err, CoverageError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_captures_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo boom >&2; exit 3");

        match run_checked(cmd, Sink::Discard).unwrap_err() {
            CoverageError::Failed { command, stderr, .. } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn stdout_is_written_to_report() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = dir.path().join("r.txt");
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo 'Name Stmts Miss'");

        run_checked(cmd, Sink::File(&report)).unwrap();
        assert_eq!(read_report(&report).unwrap(), "Name Stmts Miss\n");
    }
}
