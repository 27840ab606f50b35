//! User input utilities for interactive command-line prompts.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use meshgen_core::ViewTag;

use crate::error::CliError;

fn prompt_string(prompt: &str) -> Result<String> {
    println!("{prompt}: ");

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read user input")?;

    Ok(input.trim().to_string())
}

/// Prompts the user for a yes/no confirmation.
///
/// Accepts 'y', 'yes', 'n', 'no' (case insensitive).
/// Empty input is treated as 'no'.
///
/// # Errors
///
/// Returns an error if reading from stdin fails.
pub fn prompt_confirmation(prompt: &str) -> Result<bool> {
    loop {
        let input = prompt_string(&format!("{prompt} (y/N)"))?;
        match input.to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" | "" => return Ok(false),
            _ => eprintln!("Please enter 'y' for yes or 'n' for no."),
        }
    }
}

/// Parse a `TAG=PATH` view argument.
pub fn parse_view(raw: &str) -> Result<(ViewTag, PathBuf), CliError> {
    let (tag, path) = raw
        .split_once('=')
        .ok_or_else(|| CliError::Arguments(format!("expected TAG=PATH, got '{raw}'")))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(CliError::Arguments(format!("view '{tag}' has no image path")));
    }
    Ok((tag.parse()?, PathBuf::from(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tag_and_path() {
        let (tag, path) = parse_view("Front=/tmp/a=b.png").unwrap();
        assert_eq!(tag, ViewTag::Front);
        assert_eq!(path, PathBuf::from("/tmp/a=b.png"));
    }

    #[test]
    fn rejects_malformed_views() {
        assert!(matches!(parse_view("front"), Err(CliError::Arguments(_))));
        assert!(matches!(parse_view("front= "), Err(CliError::Arguments(_))));
        assert!(matches!(parse_view("side=x.png"), Err(CliError::Arguments(_))));
    }
}
