//! Tree path and repository url utilities
//!
//! Tree paths are slash-separated node names rooted at `/`, e.g.
//! `/team/service`. They never touch the host filesystem; mapping a tree path
//! to a directory is the navigator's job.

use url::Url;

/// Resolve `input` against the current position `current` and return a
/// normalized absolute tree path.
///
/// Absolute inputs ignore `current`. `.` and empty segments are dropped, `..`
/// pops one segment and stops at the root.
pub fn normalize_tree_path(current: &str, input: &str) -> String {
    let mut segments: Vec<&str> = if input.starts_with('/') {
        Vec::new()
    } else {
        split_segments(current)
    };

    for segment in input.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => segments.push(name),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Split an absolute tree path into its node names.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".").collect()
}

/// Append a child name to a tree path.
pub fn join_tree_path(parent: &str, name: &str) -> String {
    if parent == "/" || parent.is_empty() {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent.trim_end_matches('/'), name)
    }
}

/// Split a normalized tree path into its parent path and final name.
///
/// Returns `None` for the root.
pub fn split_parent(path: &str) -> Option<(String, String)> {
    let mut segments = split_segments(path);
    let name = segments.pop()?.to_string();
    Some((format!("/{}", segments.join("/")), name))
}

/// Extract the repository name from a git url.
///
/// Strips a trailing `/` and `.git`, then takes the last `/` segment (or the
/// part after `:` for scp-style urls such as `git@host:repo.git`).
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    last.rsplit(':').next().unwrap_or(last).to_string()
}

/// Rewrite an `http(s)` clone url into scp-style SSH form.
///
/// `https://github.com/acme/api` becomes `git@github.com:acme/api.git`.
/// Returns `None` when the url is not http(s) or has no path.
pub fn to_ssh_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return None;
    }
    let host = parsed.host_str()?;
    let path = parsed.path().trim_matches('/');
    if path.is_empty() {
        return None;
    }
    let path = path.strip_suffix(".git").unwrap_or(path);
    Some(format!("git@{}:{}.git", host, path))
}
