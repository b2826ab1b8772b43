//! Project loading: source-set resolution and per-file parsing

use crate::parser::{ParsedFile, parse_source, typescript_parser};
use epicenter_core::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Path segments skipped during enumeration.
pub const DEFAULT_EXCLUDED_DIRS: [&str; 6] =
    ["node_modules", "dist", "build", ".next", ".git", "coverage"];

pub const SOURCE_EXTENSIONS: [&str; 2] = ["ts", "tsx"];

#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub excluded_dirs: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A file that could not be loaded; downstream stages behave as if it were
/// absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub path: String,
    pub reason: String,
}

/// Stage-one output: parsed files in stable path order plus skipped paths.
pub struct ProjectSource {
    pub files: Vec<ParsedFile>,
    pub failures: Vec<ParseFailure>,
}

/// The subset of tsconfig.json that names the source set.
#[derive(Debug, Default, Deserialize)]
struct TsConfig {
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
}

/// Load every source file under `root`. The root must exist; individual
/// files that cannot be read or parsed are recorded and skipped.
pub fn load_project(root: &Path, config: &ParserConfig) -> Result<ProjectSource> {
    if !root.is_dir() {
        return Err(Error::ProjectRootNotFound(root.to_path_buf()));
    }

    let mut paths = enumerate_sources(root, config);
    if let Some(tsconfig) = read_tsconfig(root) {
        let matcher = SourceSetMatcher::new(&tsconfig);
        paths.retain(|path| matcher.declares(path));
    }
    paths.sort();

    let mut parser = typescript_parser()?;
    let mut files = Vec::new();
    let mut failures = Vec::new();
    for rel in paths {
        let absolute = root.join(&rel);
        match fs::read_to_string(&absolute) {
            Ok(source) => match parse_source(&mut parser, rel.clone(), source) {
                Some(parsed) => files.push(parsed),
                None => {
                    warn!(path = %rel, "parser produced no tree, skipping");
                    failures.push(ParseFailure {
                        path: rel,
                        reason: "parser produced no tree".to_string(),
                    });
                }
            },
            Err(e) => {
                warn!(path = %rel, error = %e, "unreadable source file, skipping");
                failures.push(ParseFailure {
                    path: rel,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(ProjectSource { files, failures })
}

fn enumerate_sources(root: &Path, config: &ParserConfig) -> Vec<String> {
    let excluded = config.excluded_dirs.clone();
    let mut builder = WalkBuilder::new(root);
    builder.standard_filters(false).filter_entry(move |entry| {
        if !entry.file_type().is_some_and(|t| t.is_dir()) {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !excluded.iter().any(|segment| segment == name.as_ref())
    });

    let mut paths = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "walker error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !SOURCE_EXTENSIONS.contains(&extension) {
            continue;
        }
        if let Ok(relative) = path.strip_prefix(root) {
            paths.push(rel_string(relative));
        }
    }
    paths
}

/// Project-relative path with `/` separators, the form used in identifiers.
fn rel_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_tsconfig(root: &Path) -> Option<TsConfig> {
    let path = root.join("tsconfig.json");
    if !path.is_file() {
        return None;
    }
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "unreadable tsconfig.json, falling back to extension scan");
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(config) => {
            debug!("loaded source set from tsconfig.json");
            Some(config)
        }
        Err(e) => {
            warn!(error = %e, "unparseable tsconfig.json, falling back to extension scan");
            None
        }
    }
}

/// The tsconfig source set: explicit files, include globs, exclude globs.
struct SourceSetMatcher {
    files: Vec<String>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl SourceSetMatcher {
    fn new(config: &TsConfig) -> Self {
        SourceSetMatcher {
            files: config
                .files
                .as_deref()
                .unwrap_or_default()
                .iter()
                .map(|f| f.trim_start_matches("./").to_string())
                .collect(),
            include: config.include.as_deref().and_then(build_globset),
            exclude: config.exclude.as_deref().and_then(build_globset),
        }
    }

    fn declares(&self, path: &str) -> bool {
        let declared = if self.files.is_empty() && self.include.is_none() {
            true
        } else {
            self.files.iter().any(|f| f == path)
                || self.include.as_ref().is_some_and(|set| set.is_match(path))
        };
        declared && !self.exclude.as_ref().is_some_and(|set| set.is_match(path))
    }
}

fn build_globset(patterns: &[String]) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;
    for pattern in patterns {
        // bare directory names in tsconfig mean "everything under"
        let pattern = if pattern.contains(['*', '?', '[', '{']) {
            pattern.clone()
        } else {
            format!("{}/**", pattern.trim_end_matches('/'))
        };
        match Glob::new(&pattern) {
            Ok(glob) => {
                builder.add(glob);
                added = true;
            }
            Err(e) => warn!(pattern = %pattern, error = %e, "invalid tsconfig glob"),
        }
    }
    if added { builder.build().ok() } else { None }
}
