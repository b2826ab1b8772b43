//! Error type shared across the pipeline crates

use std::path::PathBuf;
use thiserror::Error;

/// Fatal input errors. Per-file parse problems are not errors; the parser
/// records and skips them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("project root not found: {0}")]
    ProjectRootNotFound(PathBuf),

    #[error("unknown rule id: {0}")]
    UnknownRule(String),

    #[error("parser setup failed: {0}")]
    Language(String),
}

pub type Result<T> = std::result::Result<T, Error>;
