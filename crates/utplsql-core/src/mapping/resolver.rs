//! Expands resource specs into project-root-relative file paths.
//!
//! Patterns follow Ant conventions: `**` spans any number of directories
//! (including none), `*` and `?` stay inside one path segment, matching is
//! case-sensitive and a trailing `/` selects everything below a directory.
//! Every other character, brackets and braces included, is literal.

use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{ResourceSpec, RoleDefaults};
use crate::error::MappingError;

/// Scans resource specs below a project root.
pub struct PathResolver<'a> {
    project_root: &'a Path,
}

impl<'a> PathResolver<'a> {
    pub fn new(project_root: &'a Path) -> Self {
        Self { project_root }
    }

    /// Resolve every spec in declaration order and concatenate the results.
    ///
    /// Specs are completed in place with `defaults` first. Duplicates across
    /// specs are kept.
    pub fn resolve(
        &self,
        specs: &mut [ResourceSpec],
        defaults: &RoleDefaults,
    ) -> Result<Vec<String>, MappingError> {
        let root = absolute_root(self.project_root)?;
        let mut files = Vec::new();
        for spec in specs.iter_mut() {
            spec.apply_defaults(defaults);
            files.extend(scan_spec(&root, spec)?);
        }
        Ok(files)
    }
}

fn scan_spec(root: &Path, spec: &ResourceSpec) -> Result<Vec<String>, MappingError> {
    let directory = spec.directory.clone().unwrap_or_default();
    let base = normalize_lexically(&root.join(&directory));

    let readable = fs::metadata(&base).map(|m| m.is_dir()).unwrap_or(false)
        && fs::read_dir(&base).is_ok();
    if !readable {
        return Err(MappingError::InvalidDirectory { directory });
    }

    let includes = compile_patterns(&spec.includes)?;
    let excludes = compile_patterns(&spec.excludes)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&base).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            // Unreadable or looping subdirectories are skipped; the base is not.
            Err(e) if e.depth() > 0 => {
                warn!(
                    directory = %directory,
                    path = %e.path().map(|p| p.display().to_string()).unwrap_or_default(),
                    error = %e,
                    "skipping unreadable entry"
                );
                continue;
            }
            Err(e) => {
                return Err(MappingError::Scan {
                    path: base.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&base) else {
            continue;
        };
        let candidate = to_slash(relative);
        if includes.is_match(&candidate) && !excludes.is_match(&candidate) {
            files.push(project_relative(root, entry.path()));
        }
    }

    debug!(directory = %directory, matched = files.len(), "scanned resource");
    Ok(files)
}

/// Compile Ant-style patterns into one set. An empty list never matches.
fn compile_patterns(patterns: &[String]) -> Result<GlobSet, MappingError> {
    let mut builder = GlobSetBuilder::new();
    for raw in patterns {
        let glob = GlobBuilder::new(&normalize_pattern(raw))
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|e| MappingError::InvalidPattern {
                pattern: raw.clone(),
                reason: e.to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| MappingError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

fn normalize_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        match c {
            '\\' => pattern.push('/'),
            '[' | ']' | '{' | '}' => {
                pattern.push('[');
                pattern.push(c);
                pattern.push(']');
            }
            c => pattern.push(c),
        }
    }
    while pattern.starts_with('/') {
        pattern.remove(0);
    }
    if pattern.ends_with('/') {
        pattern.push_str("**");
    }
    pattern
}

fn absolute_root(project_root: &Path) -> Result<PathBuf, MappingError> {
    let absolute = if project_root.is_absolute() {
        project_root.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| MappingError::Scan {
                path: project_root.display().to_string(),
                reason: e.to_string(),
            })?
            .join(project_root)
    };
    Ok(normalize_lexically(&absolute))
}

/// Drop `.` and fold `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path relative to the project root, `/`-separated. Files outside the
/// root keep their absolute path.
fn project_relative(root: &Path, file: &Path) -> String {
    match file.strip_prefix(root) {
        Ok(relative) => to_slash(relative),
        Err(_) => file.to_string_lossy().replace('\\', "/"),
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
