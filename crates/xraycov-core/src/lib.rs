//! xraycov-core - Core library for Xray test-case coverage analysis
//!
//! This crate provides the building blocks for:
//! - Modelling a Jira/Xray test-case catalog (keys, summaries, epic tags)
//! - Extracting test-case references from test source files
//! - Computing coverage of the catalog by those references
//!
//! It performs no network I/O; fetching the catalog lives in the `xraycov` crate.
//!
//! # Features
//!
//! - `walk` - Enable [`WalkSources`] for gitignore-aware directory walking (brings in `ignore` and `globset`)
//! - `parallel` - Enable parallel reads for [`PathSources`] (brings in `rayon`)
//!
//! # Extracting References
//!
//! A test references a test case by calling a project-specific method at the
//! start of a line:
//!
//! ```text
//! xrayTest("https://acme.atlassian.net/browse/PROJ-123");
//! xrayTest("123"); // when only IDs are used
//! ```
//!
//! ```
//! use xraycov_core::{CoverageReport, MemorySources, RefStyle, References, Scanner, TestCase};
//!
//! let refs = References::extract(
//!     MemorySources::new().add("login.spec.ts", "xrayTest(\"123\");"),
//!     &Scanner::new("xrayTest", RefStyle::IdOnly),
//! )
//! .unwrap();
//!
//! let cases = vec![TestCase::new("PROJ-123", "[Login] user logs in", "")];
//! let report = CoverageReport::compute("PROJ", &cases, &refs);
//! assert_eq!(report.coverage_percent(), 100);
//! ```

pub mod catalog;
mod coverage;
mod reference;
mod sources;

pub use catalog::{EpicLink, TestCase};
pub use coverage::{CoverageReport, EpicCoverage};
pub use reference::{
    CoverageRef, RefStyle, References, Scanner, extract_from_content, id_from_argument,
    method_argument,
};
pub use sources::{DEFAULT_EXCLUDES, DEFAULT_TEST_FILES, MemorySources, PathSources, Sources};

#[cfg(feature = "walk")]
pub use sources::WalkSources;
