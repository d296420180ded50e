//! Captures the `--help` output of the target command.

use std::io;
use std::process::Command;

use crate::error::HelpError;

/// Runs `<command> --help`, swallowing stderr, and returns the first `limit`
/// characters of stdout.
pub fn capture_help(command: &str, limit: usize) -> Result<String, HelpError> {
    let output = Command::new(command)
        .arg("--help")
        .output()
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => HelpError::CommandNotFound(command.to_string()),
            _ => HelpError::Spawn {
                command: command.to_string(),
                source,
            },
        })?;

    if !output.status.success() {
        return Err(HelpError::CommandFailed {
            command: command.to_string(),
            status: output.status,
        });
    }

    let text = String::from_utf8_lossy(&output.stdout);
    Ok(truncate_chars(&text, limit).to_string())
}

/// First `limit` characters of `s`, never splitting a code point.
fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
