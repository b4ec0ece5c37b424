//! Line-oriented input files.

use std::fs;
use std::io;
use std::path::Path;

/// Read `path` as trimmed lines, dropping empty ones.
pub fn read_lines(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
