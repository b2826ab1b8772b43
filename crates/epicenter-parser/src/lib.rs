//! Epicenter Parser — source loading, TypeScript parsing, and semantic
//! enrichment

pub mod ast;
pub mod loader;
pub mod parser;
pub mod semantic;

pub use loader::{
    DEFAULT_EXCLUDED_DIRS, ParseFailure, ParserConfig, ProjectSource, SOURCE_EXTENSIONS,
    load_project,
};
pub use parser::{ParsedFile, parse_source, typescript_parser};
pub use semantic::{CallGraphEdge, SemanticModel, SemanticNode, enclosing_callable_id, enrich};
