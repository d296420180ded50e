#![cfg_attr(feature = "strict", deny(warnings))]

pub mod banner;
pub mod cli;

use std::io::{self, Write};

use anyhow::anyhow;
use helpsum_core::download::HfDownloader;
use helpsum_core::spinner::Spinner;
use helpsum_core::{Error, Options, resolver, summarize_command};
use helpsum_llama::LlamaRuntime;

use cli::Cli;

pub fn run(cli: Cli) -> Result<(), Error> {
    let cache_dir = resolver::default_cache_dir()
        .ok_or_else(|| Error::Setup(anyhow!("could not determine the user home directory")))?;

    let options = Options {
        command: cli.command,
        model: cli.model,
        filename: cli.filename,
        n_ctx: cli.n_ctx,
        help_limit: cli.help_command_length_limit,
        cache_dir,
    };

    let backend = LlamaRuntime::init().map_err(Error::Setup)?;
    let downloader = HfDownloader::new();
    let spinner = Spinner::new("thinking");

    let mut stdout = io::stdout().lock();
    summarize_command(&backend, &downloader, &options, &spinner, &mut stdout)?;
    writeln!(stdout).map_err(|err| Error::Completion(err.into()))?;

    Ok(())
}
