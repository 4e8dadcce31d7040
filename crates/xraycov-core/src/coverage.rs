//! Correlation of the test-case catalog with references found in test files

use crate::catalog::{TestCase, cases_in_epic, epics};
use crate::reference::{CoverageRef, References};
use facet::Facet;
use std::collections::HashMap;

/// Coverage of one epic
#[derive(Debug, Clone, Facet)]
pub struct EpicCoverage {
    pub name: String,
    /// Keys of the test cases in this epic, in catalog order
    pub cases: Vec<String>,
    pub covered: usize,
    pub percent: u32,
}

/// Coverage analysis results for a project
#[derive(Debug, Facet)]
pub struct CoverageReport {
    /// Jira project key, e.g. `PROJ`
    pub project: String,

    /// The catalog the report was computed against, in fetch order
    pub cases: Vec<TestCase>,

    /// References per test-case key, in scan order
    pub references_by_key: HashMap<String, Vec<CoverageRef>>,

    /// References whose key is not in the catalog
    pub unknown_references: Vec<CoverageRef>,
}

impl CoverageReport {
    /// Match every reference against `{project}-{id}` keys of the catalog
    pub fn compute(project: impl Into<String>, cases: &[TestCase], refs: &References) -> Self {
        let project = project.into();
        let mut references_by_key: HashMap<String, Vec<CoverageRef>> = HashMap::new();
        let mut unknown_references = Vec::new();

        for reference in &refs.references {
            let key = format!("{}-{}", project, reference.id);
            if cases.iter().any(|c| c.key == key) {
                references_by_key
                    .entry(key)
                    .or_default()
                    .push(reference.clone());
            } else {
                unknown_references.push(reference.clone());
            }
        }

        CoverageReport {
            project,
            cases: cases.to_vec(),
            references_by_key,
            unknown_references,
        }
    }

    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn is_covered(&self, key: &str) -> bool {
        self.references_by_key
            .get(key)
            .is_some_and(|refs| !refs.is_empty())
    }

    /// References for a test case (empty when uncovered)
    pub fn references_for(&self, key: &str) -> &[CoverageRef] {
        self.references_by_key
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn covered_count(&self) -> usize {
        self.cases.iter().filter(|c| self.is_covered(&c.key)).count()
    }

    pub fn uncovered(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().filter(|c| !self.is_covered(&c.key))
    }

    /// Coverage percentage, rounded to a whole number
    pub fn coverage_percent(&self) -> u32 {
        percent(self.covered_count(), self.total())
    }

    /// Whether coverage meets the threshold
    pub fn is_passing(&self, threshold: u32) -> bool {
        self.coverage_percent() >= threshold
    }

    /// Per-epic coverage, epics in first-seen order
    ///
    /// Tags that no summary starts with (e.g. `Smoke: [Cart] add`) have no
    /// members and are left out.
    pub fn epic_breakdown(&self) -> Vec<EpicCoverage> {
        epics(&self.cases)
            .into_iter()
            .filter_map(|name| {
                let members = cases_in_epic(&self.cases, &name);
                if members.is_empty() {
                    return None;
                }
                let covered = members.iter().filter(|c| self.is_covered(&c.key)).count();
                Some(EpicCoverage {
                    percent: percent(covered, members.len()),
                    cases: members.iter().map(|c| c.key.clone()).collect(),
                    covered,
                    name,
                })
            })
            .collect()
    }
}

/// `round(covered / total * 100)`; an empty set counts as fully covered
fn percent(covered: usize, total: usize) -> u32 {
    if total == 0 {
        return 100;
    }
    ((covered as f64 / total as f64) * 100.0).round() as u32
}
