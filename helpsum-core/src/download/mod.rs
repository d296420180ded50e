//! Fetches GGUF artifacts from a model repository into the local cache.

mod repo_id;

pub use crate::error::DownloadError;
pub use repo_id::RepoId;

use std::env;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;

const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
const USER_AGENT: &str = concat!("helpsum/", env!("CARGO_PKG_VERSION"));

/// Places a model artifact at `<cache_dir>/<filename>`.
///
/// `model` is the repository id the artifact lives in (`owner/model`).
pub trait Downloader {
    fn fetch(&self, model: &str, filename: &str, cache_dir: &Path)
    -> Result<PathBuf, DownloadError>;
}

/// Downloads GGUF files over HTTP from a HuggingFace-style endpoint.
///
/// A sidecar `<filename>.etag` records the remote `x-linked-etag`; when the
/// cached artifact exists and its etag still matches, the transfer is
/// skipped.
#[derive(Debug, Default)]
pub struct HfDownloader;

impl HfDownloader {
    pub fn new() -> Self {
        Self
    }
}

impl Downloader for HfDownloader {
    fn fetch(
        &self,
        model: &str,
        filename: &str,
        cache_dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        let repo: RepoId = model.parse()?;
        fs::create_dir_all(cache_dir).map_err(DownloadError::CacheDir)?;

        let url = format!("{}/{}/resolve/main/{}", model_endpoint(), repo, filename);
        let file_path = cache_dir.join(filename);

        let remote_etag = fetch_etag(&url)?;
        if file_path.exists() && etag_matches(cache_dir, filename, &remote_etag) {
            return Ok(file_path);
        }

        save_etag(cache_dir, filename, &remote_etag)?;
        download_file(&url, &file_path)?;

        Ok(file_path)
    }
}

/// Download endpoint, overridable through MODEL_ENDPOINT or HF_ENDPOINT
/// (in that order of precedence).
fn model_endpoint() -> String {
    env::var("MODEL_ENDPOINT")
        .or_else(|_| env::var("HF_ENDPOINT"))
        .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string())
}

fn fetch_etag(url: &str) -> Result<String, DownloadError> {
    let client = Client::builder().redirect(Policy::none()).build()?;

    let response = client.head(url).header("User-Agent", USER_AGENT).send()?;

    let etag = response
        .headers()
        .get("x-linked-etag")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    Ok(etag)
}

fn etag_matches(cache_dir: &Path, filename: &str, remote_etag: &str) -> bool {
    let etag_path = cache_dir.join(format!("{filename}.etag"));
    fs::read_to_string(etag_path)
        .map(|local_etag| local_etag == remote_etag)
        .unwrap_or(false)
}

fn save_etag(cache_dir: &Path, filename: &str, etag: &str) -> Result<(), DownloadError> {
    let etag_path = cache_dir.join(format!("{filename}.etag"));
    fs::write(&etag_path, etag).map_err(DownloadError::FileWrite)?;
    Ok(())
}

fn download_file(url: &str, path: &Path) -> Result<(), DownloadError> {
    let client = Client::new();
    let mut response = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()?
        .error_for_status()?;

    let total_size = response.content_length().unwrap_or(0);

    let progress_bar = ProgressBar::new(total_size);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let file = File::create(path).map_err(DownloadError::FileWrite)?;
    let mut sink = progress_bar.wrap_write(file);
    response.copy_to(&mut sink)?;

    progress_bar.finish_and_clear();

    Ok(())
}
