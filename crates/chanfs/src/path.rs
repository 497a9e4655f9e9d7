// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Helpers for the namespace's absolute, `/`-separated paths.

use crate::error::{Error, Result};

pub const ROOT: &str = "/";

/// Canonical form of an absolute path: no empty or `.` segments, `..`
/// applied, no trailing slash. `"/"` is the root.
pub fn normalize(path: &str) -> Result<String> {
    if !path.starts_with('/') {
        return Err(Error::invalid_path(path));
    }
    let mut stack: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return Err(Error::invalid_path(path));
                }
            }
            name => stack.push(name),
        }
    }
    Ok(format!("/{}", stack.join("/")))
}

/// Segments of a normalized path; empty for the root
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Final segment of a normalized path; empty for the root
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Parent of a normalized path; the root is its own parent
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => ROOT,
        Some(pos) => &path[..pos],
    }
}

pub fn join(parent: &str, name: &str) -> String {
    if parent == ROOT {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

pub fn is_root(path: &str) -> bool {
    path == ROOT
}

/// True when `path` is `ancestor` or lies beneath it
pub fn is_within(path: &str, ancestor: &str) -> bool {
    if is_root(ancestor) {
        return true;
    }
    path == ancestor
        || (path.starts_with(ancestor) && path.as_bytes().get(ancestor.len()) == Some(&b'/'))
}

/// Replace the `old` prefix of `path` with `new`, if `path` is within `old`
pub fn rebase(path: &str, old: &str, new: &str) -> Option<String> {
    if !is_within(path, old) || is_root(old) {
        return None;
    }
    let rest = &path[old.len()..];
    if is_root(new) {
        Some(if rest.is_empty() { ROOT.into() } else { rest.into() })
    } else {
        Some(format!("{new}{rest}"))
    }
}
