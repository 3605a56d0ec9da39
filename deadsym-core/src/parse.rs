//! JS/TS parsing front end.
//!
//! Wraps the `oxc` parser and the bits of source bookkeeping every
//! analysis pass needs:
//! - source type selection from the filename
//! - `<script>` extraction for Vue and Svelte components
//! - byte offset to 1-based line mapping
//!
//! A file with any syntax error is reported as a parse failure. Callers
//! recover by treating the file as having no declarations.

use std::path::Path;
use std::sync::OnceLock;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use regex::Regex;

use crate::error::{DeadsymError, DeadsymResult};

/// Maximum file size to parse (10 MB).
const MAX_FILE_SIZE: usize = 10_000_000;

/// Script block of a single-file component.
fn script_regex() -> Option<&'static Regex> {
    static SCRIPT: OnceLock<Option<Regex>> = OnceLock::new();
    SCRIPT
        .get_or_init(|| Regex::new(r#"<script[^>]*>([\s\S]*?)</script>"#).ok())
        .as_ref()
}

/// Component flavour of a file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    None,
    Vue,
    Svelte,
}

impl Component {
    pub fn of(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("vue") => Self::Vue,
            Some("svelte") => Self::Svelte,
            _ => Self::None,
        }
    }
}

/// The text that actually gets parsed for a file.
///
/// For plain scripts this is the whole content. For components it is the
/// first `<script>` block; a Vue file without one has nothing to analyze,
/// while a Svelte file without one is parsed whole.
pub fn script_text<'s>(filename: &str, content: &'s str) -> Option<&'s str> {
    let component = Component::of(filename);
    if component == Component::None {
        return Some(content);
    }

    let block = script_regex()
        .and_then(|re| re.captures(content))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    match (component, block) {
        (_, Some(script)) => Some(script),
        (Component::Vue, None) => None,
        _ => Some(content),
    }
}

/// Parser source type for a file. Components are parsed as TypeScript.
pub fn source_type_for(filename: &str) -> SourceType {
    if Component::of(filename) != Component::None {
        return SourceType::ts();
    }
    SourceType::from_path(Path::new(filename)).unwrap_or_default()
}

/// Sorted byte offsets of line starts, for O(log n) offset to line lookup.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = Vec::with_capacity(text.len() / 32 + 1);
        starts.push(0);
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                starts.push((i + 1) as u32);
            }
        }
        Self { starts }
    }

    /// 1-based line containing `offset`.
    pub fn line_of(&self, offset: u32) -> usize {
        self.starts.partition_point(|&start| start <= offset).max(1)
    }
}

/// Parsed text plus its line index.
#[derive(Debug, Clone)]
pub struct SourceText<'s> {
    pub text: &'s str,
    pub lines: LineIndex,
}

impl<'s> SourceText<'s> {
    pub fn new(text: &'s str) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
        }
    }

    /// 1-based line where `span` starts.
    pub fn line(&self, span: Span) -> usize {
        self.lines.line_of(span.start)
    }

    /// Source slice covered by `span`, empty if out of range.
    pub fn slice(&self, span: Span) -> &'s str {
        self.text
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }
}

/// Parse `text` into an AST allocated in `allocator`.
///
/// Fails on oversized input or on any syntax error, reporting the first
/// error's position.
pub fn parse_program<'a>(
    allocator: &'a Allocator,
    filename: &str,
    text: &'a str,
) -> DeadsymResult<Program<'a>> {
    if text.len() > MAX_FILE_SIZE {
        return Err(DeadsymError::parse(
            filename,
            format!("file exceeds {} bytes", MAX_FILE_SIZE),
        ));
    }

    let ret = Parser::new(allocator, text, source_type_for(filename)).parse();

    if ret.panicked || !ret.errors.is_empty() {
        let lines = LineIndex::new(text);
        let first = ret.errors.first();
        let message = first
            .map(|e| e.to_string())
            .unwrap_or_else(|| "parser aborted".to_string());
        let offset = first
            .and_then(|e| e.labels.as_ref())
            .and_then(|labels| labels.first())
            .map(|label| label.offset());
        return Err(match offset {
            Some(offset) => {
                let line = lines.line_of(offset as u32);
                let line_start = text[..offset.min(text.len())]
                    .rfind('\n')
                    .map(|i| i + 1)
                    .unwrap_or(0);
                DeadsymError::parse_at(filename, message, line, offset - line_start + 1)
            }
            None => DeadsymError::parse(filename, message),
        });
    }

    Ok(ret.program)
}

/// Parse a file's analyzable text and hand the AST to `f`.
///
/// Returns `Ok(None)` when the file has nothing to analyze (a component
/// without a script block). The AST does not outlive the call.
pub fn with_program<R>(
    filename: &str,
    content: &str,
    f: impl FnOnce(&Program<'_>, &SourceText<'_>) -> R,
) -> DeadsymResult<Option<R>> {
    let Some(text) = script_text(filename, content) else {
        return Ok(None);
    };

    let allocator = Allocator::default();
    let program = parse_program(&allocator, filename, text)?;
    let source = SourceText::new(text);
    Ok(Some(f(&program, &source)))
}
