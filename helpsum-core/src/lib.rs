#![cfg_attr(feature = "strict", deny(warnings))]

//! Core pipeline for summarizing a command's `--help` output with a locally
//! hosted language model: capture the help text, resolve (and if necessary
//! download) a GGUF model, then stream a chat completion to the terminal.

pub mod download;
pub mod error;
pub mod help;
pub mod resolver;
pub mod runtime;
pub mod spinner;
pub mod summarize;

pub use error::Error;
pub use summarize::summarize_command;

use std::path::PathBuf;

/// Immutable per-run configuration assembled from the command line.
#[derive(Clone, Debug)]
pub struct Options {
    /// Command whose `--help` output is summarized.
    pub command: String,
    /// Explicit GGUF path, or a repository id to resolve from the cache.
    pub model: Option<String>,
    /// Cache filename/size variant of the model (e.g. `gemma-2b`).
    pub filename: Option<String>,
    /// Context window size passed to the model runtime.
    pub n_ctx: u32,
    /// Maximum number of characters captured from the help output.
    pub help_limit: usize,
    /// Directory holding cached model files.
    pub cache_dir: PathBuf,
}
