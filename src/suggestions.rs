//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use muno::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("No workspace found at {}", dir.display());
//!
//! // Use:
//! return Err(suggestions::workspace_not_found(dir));
//! ```

use std::path::Path;

/// Generate an error for when no workspace configuration is found.
///
/// Includes hints about:
/// - Creating a new workspace
/// - Using the -C/--workspace flag
/// - Using the MUNO_WORKSPACE environment variable
pub fn workspace_not_found(start: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No muno workspace found at or above {start}\n\n\
         hint: Run 'muno init' to create a muno.yaml here\n\
         hint: Use -C/--workspace to point at an existing workspace\n\
         hint: Set the MUNO_WORKSPACE environment variable",
        start = start.display()
    )
}

/// Generate an error for a tree path segment that does not exist.
///
/// Suggests a sibling with a similar name when there is one.
pub fn node_not_found(path: &str, segment: &str, siblings: &[String]) -> anyhow::Error {
    let candidates: Vec<&str> = siblings.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(segment, &candidates)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Node not found: '{segment}' in path {path}{did_you_mean}\n\n\
         hint: Run 'muno list' to see the children of the current node\n\
         hint: Run 'muno tree' to see the whole workspace"
    )
}

/// Generate an error for configuration files that delegate in a circle.
pub fn circular_reference(chain: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Circular configuration reference: {chain}\n\n\
         hint: Remove or retarget one of the 'config:' nodes to break the cycle"
    )
}

/// Generate an error for a malformed `--config` override.
pub fn invalid_override(entry: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid config override: {entry}\n\n\
         hint: Use the form key.path=value, e.g. --config git.clone_timeout=600"
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = if a_chars[i - 1] == b_chars[j - 1] {
                0
            } else {
                1
            };
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
