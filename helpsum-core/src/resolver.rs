//! Decides which model file to load, downloading it as a last resort.

use std::path::{Path, PathBuf};

use anyhow::anyhow;

use crate::Options;
use crate::download::Downloader;
use crate::error::ResolveError;
use crate::runtime::{ModelBackend, ModelConfig};

/// Model expected in the cache when no `--model` is given.
pub const DEFAULT_MODEL_FILE: &str = "llama-3.2-3b-instruct-q4_k_m.gguf";

/// Chat template applied to the default model.
pub const DEFAULT_CHAT_FORMAT: &str = "llama3";

/// `~/.helpsummarizer/models`, or None when the home directory cannot be
/// determined.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".helpsummarizer").join("models"))
}

/// Resolves `--model`/`--filename` to a loaded model handle.
///
/// Four one-shot states: default cache model, explicit existing path, cache
/// lookup by filename, and a single download-then-reload fallback. An
/// explicit path that exists but fails to load is a user-input error and
/// never triggers a download.
pub fn resolve_model<B: ModelBackend>(
    backend: &B,
    downloader: &dyn Downloader,
    options: &Options,
) -> Result<B::Model, ResolveError> {
    let Some(model) = &options.model else {
        let path = options.cache_dir.join(DEFAULT_MODEL_FILE);
        let config = ModelConfig {
            n_ctx: options.n_ctx,
            chat_format: Some(DEFAULT_CHAT_FORMAT.to_string()),
        };
        return backend
            .load_model(&path, &config)
            .map_err(|reason| ResolveError::DefaultUnavailable { path, reason });
    };

    let config = ModelConfig {
        n_ctx: options.n_ctx,
        chat_format: None,
    };

    let explicit = Path::new(model);
    if explicit.exists() {
        return backend
            .load_model(explicit, &config)
            .map_err(|reason| ResolveError::InvalidPath {
                path: explicit.to_path_buf(),
                reason,
            });
    }

    // Not a path on disk; treat it as a repository id resolved through the
    // cache, keyed by --filename.
    let Some(filename) = &options.filename else {
        return Err(ResolveError::InvalidPath {
            path: explicit.to_path_buf(),
            reason: anyhow!("no such file, and no --filename to resolve it from the cache"),
        });
    };

    let cached = options.cache_dir.join(filename);
    if let Ok(loaded) = backend.load_model(&cached, &config) {
        return Ok(loaded);
    }

    eprintln!("Model not found in cache. Downloading from {model}...");
    let downloaded = downloader
        .fetch(model, filename, &options.cache_dir)
        .map_err(|err| ResolveError::RepositoryLoad {
            reason: anyhow::Error::new(err),
        })?;

    backend
        .load_model(&downloaded, &config)
        .map_err(|reason| ResolveError::RepositoryLoad {
            reason: reason.context("model failed to load after download"),
        })
}
