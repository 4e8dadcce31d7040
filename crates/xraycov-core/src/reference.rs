//! Extraction of test-case references from test source files
//!
//! A test file references an Xray test case by calling a project-specific
//! method with a string argument, e.g. `xrayTest("PROJ-123")` or
//! `xrayTest("https://acme.atlassian.net/browse/PROJ-123")`. The call must
//! start the (trimmed) line.

use crate::catalog::last_dash_segment;
use crate::sources::Sources;
use eyre::Result;
use facet::Facet;
use std::path::{Path, PathBuf};

/// How the argument of the reference method identifies the test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Facet)]
#[repr(u8)]
pub enum RefStyle {
    /// The argument is the bare numeric ID (`"123"`)
    IdOnly,
    /// The argument is a browse URL or full key; the ID follows the last `-`
    #[default]
    Url,
}

impl RefStyle {
    pub fn from_id_only(id_only: bool) -> Self {
        if id_only { Self::IdOnly } else { Self::Url }
    }
}

/// Settings for recognizing reference calls
#[derive(Debug, Clone)]
pub struct Scanner {
    /// Name of the reference method
    pub method: String,
    pub style: RefStyle,
}

impl Scanner {
    pub fn new(method: impl Into<String>, style: RefStyle) -> Self {
        Self {
            method: method.into(),
            style,
        }
    }
}

/// A reference to a test case found in a test file
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct CoverageRef {
    /// Numeric test case ID, without the project key
    pub id: String,
    /// File where the reference was found
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
}

/// Collection of references extracted from test files
#[derive(Debug, Clone, Default, Facet)]
pub struct References {
    pub references: Vec<CoverageRef>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract references from the given sources
    pub fn extract(sources: impl Sources, scanner: &Scanner) -> Result<Self> {
        sources.extract(scanner)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn extend(&mut self, other: References) {
        self.references.extend(other.references);
    }

    /// Sort by file, then line, so parallel extraction yields a stable order
    pub fn sort(&mut self) {
        self.references
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
    }
}

/// Argument of `method("...")` in `text`, with quote characters stripped.
///
/// Returns `None` when the call is absent or its argument is empty.
pub fn method_argument(text: &str, method: &str) -> Option<String> {
    if method.is_empty() {
        return None;
    }
    let text = text.trim();
    let opener = format!("{method}(\"");

    let mut search_from = 0;
    while let Some(found) = text[search_from..].find(&opener) {
        let arg_start = search_from + found + opener.len();
        let rest = &text[arg_start..];
        if let Some(close) = rest.find('"') {
            let arg = &rest[..close];
            if close > 0 && rest[close + 1..].starts_with(')') {
                let cleaned: String = arg.chars().filter(|c| *c != '"' && *c != '\'').collect();
                return (!cleaned.is_empty()).then_some(cleaned);
            }
        }
        search_from = arg_start;
    }
    None
}

/// Test case ID carried by a reference argument
pub fn id_from_argument(arg: &str, style: RefStyle) -> &str {
    match style {
        RefStyle::IdOnly => arg,
        RefStyle::Url => last_dash_segment(arg),
    }
}

/// Scan one file's content and append its references to `out`
pub fn extract_from_content(path: &Path, content: &str, scanner: &Scanner, out: &mut References) {
    if scanner.method.is_empty() {
        return;
    }

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if !trimmed.starts_with(&scanner.method) {
            continue;
        }
        let Some(arg) = method_argument(trimmed, &scanner.method) else {
            continue;
        };
        let id = id_from_argument(&arg, scanner.style);
        if id.is_empty() {
            continue;
        }
        out.references.push(CoverageRef {
            id: id.to_string(),
            file: path.to_path_buf(),
            line: index + 1,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(content: &str, style: RefStyle) -> References {
        let mut refs = References::new();
        extract_from_content(
            Path::new("login.spec.ts"),
            content,
            &Scanner::new("xrayTest", style),
            &mut refs,
        );
        refs
    }

    #[test]
    fn argument_is_extracted() {
        assert_eq!(
            method_argument("  xrayTest(\"PROJ-12\");", "xrayTest"),
            Some("PROJ-12".to_string())
        );
        assert_eq!(method_argument("xrayTest('PROJ-12')", "xrayTest"), None);
        assert_eq!(method_argument("xrayTest(\"\")", "xrayTest"), None);
        assert_eq!(method_argument("xrayTest(\"12\"", "xrayTest"), None);
        assert_eq!(method_argument("other(\"12\")", "xrayTest"), None);
        assert_eq!(method_argument("xrayTest(\"12\")", ""), None);
    }

    #[test]
    fn single_quotes_inside_argument_are_stripped() {
        assert_eq!(
            method_argument("xrayTest(\"'12'\")", "xrayTest"),
            Some("12".to_string())
        );
    }

    #[test]
    fn url_style_takes_id_after_last_dash() {
        let refs = scan(
            "describe('x', () => {\n  xrayTest(\"https://acme.atlassian.net/browse/PROJ-42\");\n});\n",
            RefStyle::Url,
        );
        assert_eq!(refs.len(), 1);
        assert_eq!(refs.references[0].id, "42");
        assert_eq!(refs.references[0].line, 2);
        assert_eq!(refs.references[0].file, PathBuf::from("login.spec.ts"));
    }

    #[test]
    fn id_only_style_keeps_argument() {
        let refs = scan("xrayTest(\"42\")\nxrayTest(\"43\")", RefStyle::IdOnly);
        let ids: Vec<_> = refs.references.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["42", "43"]);
        assert_eq!(refs.references[1].line, 2);
    }

    #[test]
    fn call_must_start_the_line() {
        let refs = scan("it('a', () => xrayTest(\"PROJ-1\"))", RefStyle::Url);
        assert!(refs.is_empty());
    }

    #[test]
    fn references_with_empty_id_are_dropped() {
        let refs = scan("xrayTest(\"PROJ-\")", RefStyle::Url);
        assert!(refs.is_empty());
    }
}
