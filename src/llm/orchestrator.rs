use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigError};
use crate::detectors::language::detect_language;
use crate::llm::client::Generator;
use crate::llm::prompt::create_prompt;
use crate::testgen::materialize::materialize_test;

/// Per-run tally. Informational only, never affects the exit status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub generated: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Build prompts only: no generation call, no output file.
    pub dry_run: bool,
}

/// Split raw CLI arguments into file paths. Each argument may itself hold
/// several whitespace-separated paths.
pub fn changed_files<S: AsRef<str>>(args: &[S]) -> Vec<PathBuf> {
    args.iter()
        .flat_map(|a| a.as_ref().split_whitespace())
        .map(PathBuf::from)
        .collect()
}

/// Startup entry: a configuration error aborts before any generator is
/// built or any file is touched.
pub fn run_with_config<G, F>(
    cfg: Result<Config, ConfigError>,
    make_generator: F,
    files: &[PathBuf],
    cwd: &Path,
    opts: RunOptions,
) -> Result<RunSummary, ConfigError>
where
    G: Generator,
    F: FnOnce(&Config) -> G,
{
    let cfg = cfg?;
    let generator = make_generator(&cfg);
    Ok(run_test_generation(&cfg, &generator, files, cwd, opts))
}

/// Process each changed file in order. A failing file is logged and
/// skipped; the run always continues to the next one.
pub fn run_test_generation<G: Generator>(
    cfg: &Config,
    generator: &G,
    files: &[PathBuf],
    cwd: &Path,
    opts: RunOptions,
) -> RunSummary {
    let mut summary = RunSummary::default();

    if files.is_empty() {
        warn!("No changed files detected.");
        return summary;
    }

    for file in files {
        let language = detect_language(file);

        /* ================= PROMPT ================= */

        let prompt = match create_prompt(cfg, file, language, cwd) {
            Ok(p) => p,
            Err(e) => {
                error!("{e}");
                warn!("Skipping file {} due to prompt generation issues.", file.display());
                summary.skipped += 1;
                continue;
            }
        };

        if opts.dry_run {
            info!("Prompt for {} ({} bytes, dry run)", file.display(), prompt.len());
            debug!("{prompt}");
            summary.skipped += 1;
            continue;
        }

        /* ================= GENERATION ================= */

        let generation = match generator.generate(&prompt) {
            Ok(g) => g,
            Err(e) => {
                error!("Error calling generation API: {e}");
                error!("Failed to generate tests for {}", file.display());
                summary.failed += 1;
                continue;
            }
        };

        if generation.text.is_empty() {
            error!("Failed to generate tests for {}: empty response", file.display());
            summary.failed += 1;
            continue;
        }

        info!(
            "Test cases generated successfully (prompt {})",
            &generation.prompt_hash[..12.min(generation.prompt_hash.len())]
        );

        /* ================= OUTPUT ================= */

        match materialize_test(cwd, file, language, &generation.text) {
            Ok(path) => {
                info!("Test cases for {} saved to {}", file.display(), path.display());
                summary.generated += 1;
            }
            Err(e) => {
                error!("{e}");
                summary.failed += 1;
            }
        }
    }

    info!(
        "Done: {} generated, {} skipped, {} failed",
        summary.generated, summary.skipped, summary.failed
    );

    summary
}
