//! Tree-sitter parsing of TypeScript sources

use epicenter_core::{Error, Result};
use tree_sitter::{Parser, Tree};

/// A source file with its syntax tree. Immutable once created; trees live
/// for the duration of one pipeline invocation and are dropped with it.
pub struct ParsedFile {
    /// Project-relative path with `/` separators.
    pub path: String,
    pub source: String,
    pub tree: Tree,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("path", &self.path)
            .field("bytes", &self.source.len())
            .finish()
    }
}

/// Build a parser configured for TypeScript.
pub fn typescript_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        .map_err(|e| Error::Language(e.to_string()))?;
    Ok(parser)
}

/// Parse one source file. Returns `None` when tree-sitter produces no tree;
/// error-recovered trees still count as parsed.
pub fn parse_source(parser: &mut Parser, path: String, source: String) -> Option<ParsedFile> {
    let tree = parser.parse(&source, None)?;
    Some(ParsedFile { path, source, tree })
}
