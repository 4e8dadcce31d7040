//! Test-case catalog model and title helpers

use facet::Facet;

/// An Xray test case as fetched from Jira
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct TestCase {
    /// Issue key, e.g. `PROJ-123`
    pub key: String,
    /// Summary line (already sanitized)
    pub summary: String,
    /// REST `self` link of the issue
    pub url: String,
    /// Flattened plain-text description
    #[facet(default)]
    pub description: String,
    /// Epics this test case is linked to
    #[facet(default)]
    pub parents: Vec<EpicLink>,
}

/// An outward link from a test case to an epic
#[derive(Debug, Clone, PartialEq, Eq, Facet)]
pub struct EpicLink {
    pub key: String,
    pub title: String,
    pub url: String,
}

impl TestCase {
    pub fn new(key: impl Into<String>, summary: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            url: url.into(),
            description: String::new(),
            parents: Vec::new(),
        }
    }

    /// The part of the key after the last `-` (`PROJ-123` -> `123`)
    pub fn numeric_id(&self) -> &str {
        last_dash_segment(&self.key)
    }
}

/// Returns everything after the last `-`, or the whole string if there is none.
pub fn last_dash_segment(s: &str) -> &str {
    s.rsplit('-').next().unwrap_or(s)
}

/// Remove the first literal occurrence of each pattern, in order.
pub fn sanitize_title(title: &str, patterns: &[String]) -> String {
    patterns.iter().fold(title.to_string(), |acc, pattern| {
        if pattern.is_empty() {
            acc
        } else {
            acc.replacen(pattern.as_str(), "", 1)
        }
    })
}

/// Epic name from a summary of the form `[Epic name] title`.
///
/// Takes the first bracket group anywhere in the summary.
pub fn epic_of(summary: &str) -> Option<&str> {
    let open = summary.find('[')?;
    let rest = &summary[open + 1..];
    let close = rest.find(']')?;
    let name = rest[..close].trim();
    (!name.is_empty()).then_some(name)
}

/// Unique epic names in first-seen order
pub fn epics(cases: &[TestCase]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for case in cases {
        if let Some(epic) = epic_of(&case.summary)
            && !seen.iter().any(|e| e == epic)
        {
            seen.push(epic.to_string());
        }
    }
    seen
}

/// Whether the summary starts with `[epic]` (whitespace around the name allowed)
pub fn summary_in_epic(summary: &str, epic: &str) -> bool {
    let Some(rest) = summary.trim_start().strip_prefix('[') else {
        return false;
    };
    let Some(rest) = rest.trim_start().strip_prefix(epic) else {
        return false;
    };
    rest.trim_start().starts_with(']')
}

/// Test cases that belong to the given epic
pub fn cases_in_epic<'a>(cases: &'a [TestCase], epic: &str) -> Vec<&'a TestCase> {
    cases
        .iter()
        .filter(|c| summary_in_epic(&c.summary, epic))
        .collect()
}

/// Summary with the leading `[epic]` tag stripped
pub fn display_title(summary: &str) -> &str {
    summary.rsplit(']').next().unwrap_or(summary).trim()
}
