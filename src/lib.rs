//! Drafts test files for changed sources by prompting a chat-completion model
//! with the source, the local modules it imports and any coverage report
//! from an existing test.

pub mod config;
pub mod context;
pub mod detectors;
pub mod llm;
pub mod logger;
pub mod testgen;

pub use config::{Config, ConfigError};
pub use llm::client::{Generation, GenerationError, Generator, LlmClient};
pub use llm::orchestrator::{
    changed_files, run_test_generation, run_with_config, RunOptions, RunSummary,
};
