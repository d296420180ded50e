use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Top-level error for a single summarization run.
///
/// Each failure class maps to its own process exit code so callers (and
/// tests) can branch on the semantic kind rather than on magic numbers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Help(#[from] HelpError),

    /// The streaming chat completion failed mid-flight.
    #[error("Failed to stream completion: {0:#}")]
    Completion(anyhow::Error),

    /// Startup failures before the pipeline runs (home directory lookup,
    /// inference backend initialization).
    #[error("{0}")]
    Setup(anyhow::Error),
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Resolve(ResolveError::InvalidPath { .. }) => 2,
            Error::Resolve(ResolveError::DefaultUnavailable { .. }) => 3,
            Error::Resolve(ResolveError::RepositoryLoad { .. }) => 4,
            Error::Help(HelpError::CommandNotFound(_)) => 5,
            Error::Help(_) => 6,
            Error::Completion(_) | Error::Setup(_) => 1,
        }
    }
}

/// Errors that can occur while resolving and loading a model
#[derive(Debug, Error)]
pub enum ResolveError {
    /// An explicitly supplied model path could not be loaded (or does not
    /// exist and no cache filename was given to resolve it from)
    #[error("Invalid model path {}: {reason:#}", .path.display())]
    InvalidPath { path: PathBuf, reason: anyhow::Error },

    /// No usable model at the default cache location
    #[error("Default model unavailable at {}: {reason:#}", .path.display())]
    DefaultUnavailable { path: PathBuf, reason: anyhow::Error },

    /// A named model could not be fetched from the repository, or failed to
    /// load after download
    #[error("Failed to load model from repository: {reason:#}")]
    RepositoryLoad { reason: anyhow::Error },
}

/// Errors that can occur while capturing a command's --help output
#[derive(Debug, Error)]
pub enum HelpError {
    /// No executable by that name on the search path
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The --help invocation ran but exited non-zero
    #[error("`{command} --help` failed with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    /// The child process could not be launched for another reason
    #[error("Failed to run `{command} --help`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Errors that can occur during model download operations
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The artifact request failed (connection, status, or transfer error)
    #[error("Download failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to create or access the cache directory
    #[error("Failed to create cache directory: {0}")]
    CacheDir(std::io::Error),

    /// Failed to write downloaded files to disk
    #[error("Failed to write file: {0}")]
    FileWrite(std::io::Error),

    /// Invalid model repository reference
    #[error(transparent)]
    Repo(#[from] RepoIdError),
}

/// Errors that can occur while parsing model repository ids
#[derive(Debug, Error)]
pub enum RepoIdError {
    /// Missing or empty owner/name component (expected format: owner/model)
    #[error("Invalid model reference `{0}` (expected format: owner/model)")]
    Malformed(String),
}
