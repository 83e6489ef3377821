//! Interactive input helpers for the search binaries.

use std::io::{self, BufRead, Write};

/// Parses a positive count, falling back to `default` for anything that is
/// not a run of digits (blank input included).
pub fn count_or_default(input: &str, default: usize) -> usize {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
        return default;
    }
    match trimmed.parse::<usize>() {
        Ok(0) | Err(_) => default,
        Ok(value) => value,
    }
}

/// Prints `prompt` and reads one line (without the trailing newline).
pub fn ask<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, prompt: &str) -> io::Result<String> {
    write!(writer, "{prompt}")?;
    writer.flush()?;
    let mut line = String::new();
    reader.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Reads lines until an empty line or EOF and joins them with spaces.
pub fn read_block<R: BufRead>(reader: &mut R) -> io::Result<String> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() {
            break;
        }
        lines.push(line.to_string());
    }
    Ok(lines.join(" "))
}
