#![cfg_attr(feature = "strict", deny(warnings))]

use clap::Parser;

use crate::banner::BANNER;

#[derive(Parser, Debug)]
#[command(name = "helpsum")]
#[command(author, version, before_help = BANNER)]
#[command(about = "Summarize the --help output of a given command using a local LLM", long_about = None)]
pub struct Cli {
    /// The command you want help with (e.g., ls)
    #[arg(long)]
    pub command: String,

    /// Path to the GGUF model file (e.g., /path/to/model.gguf), or a
    /// repository id to resolve from the cache
    #[arg(long)]
    pub model: Option<String>,

    /// Filename or size variant of the GGUF model (e.g., gemma-2b, gemma-7b)
    #[arg(long)]
    pub filename: Option<String>,

    /// The maximum number of context tokens the language model can handle in
    /// a single prompt
    #[arg(long = "n_ctx", default_value_t = 512)]
    pub n_ctx: u32,

    /// The maximum number of characters to capture from the output of the
    /// '--help' command
    #[arg(long = "help_command_length_limit", default_value_t = 400)]
    pub help_command_length_limit: usize,
}
