use anyhow::{anyhow, Result};
use std::fs;
use std::path::Path;

/// One target per line; blank lines and `#` comments are skipped.
pub fn parse_targets(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Targets from the optional file first, then those given on the command
/// line, in order. Duplicates are kept.
pub fn collect_targets(file: Option<&Path>, extra: Vec<String>) -> Result<Vec<String>> {
    let mut targets = Vec::new();

    if let Some(path) = file {
        let contents = fs::read_to_string(path)
            .map_err(|err| anyhow!("failed to read targets file {:?}: {}", path, err))?;
        targets.extend(parse_targets(&contents));
    }

    targets.extend(extra);
    Ok(targets)
}
