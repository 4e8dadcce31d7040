//! Source providers for reference extraction

use crate::reference::{References, Scanner, extract_from_content};
use eyre::Result;
use std::path::PathBuf;
#[cfg(feature = "walk")]
use std::path::Path;

/// Default include pattern for test files
pub const DEFAULT_TEST_FILES: &str = "**/*.spec.{js,ts}";

/// Directories skipped unless the caller supplies its own excludes
pub const DEFAULT_EXCLUDES: &[&str] = &["**/node_modules/**"];

/// Trait for providing test files to extract references from
pub trait Sources {
    /// Extract references from all sources
    fn extract(self, scanner: &Scanner) -> Result<References>;
}

/// Sources from an explicit list of file paths
pub struct PathSources(Vec<PathBuf>);

impl PathSources {
    /// Create from an iterator of paths
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self(paths.into_iter().map(Into::into).collect())
    }
}

impl Sources for PathSources {
    fn extract(self, scanner: &Scanner) -> Result<References> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let per_file = self
                .0
                .par_iter()
                .map(|path| -> Result<References> {
                    let content = std::fs::read_to_string(path)?;
                    let mut file_refs = References::new();
                    extract_from_content(path, &content, scanner, &mut file_refs);
                    Ok(file_refs)
                })
                .collect::<Result<Vec<_>>>()?;

            let mut refs = References::new();
            for file_refs in per_file {
                refs.extend(file_refs);
            }
            Ok(refs)
        }

        #[cfg(not(feature = "parallel"))]
        {
            let mut refs = References::new();
            for path in self.0 {
                let content = std::fs::read_to_string(&path)?;
                extract_from_content(&path, &content, scanner, &mut refs);
            }
            Ok(refs)
        }
    }
}

/// In-memory sources (useful for testing)
pub struct MemorySources(Vec<(PathBuf, String)>);

impl MemorySources {
    /// Create empty memory sources
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a file with content
    pub fn add(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.0.push((path.into(), content.into()));
        self
    }
}

impl Default for MemorySources {
    fn default() -> Self {
        Self::new()
    }
}

impl Sources for MemorySources {
    fn extract(self, scanner: &Scanner) -> Result<References> {
        let mut refs = References::new();
        for (path, content) in self.0 {
            extract_from_content(&path, &content, scanner, &mut refs);
        }
        Ok(refs)
    }
}

/// Gitignore-aware directory walker
///
/// Reported file paths are relative to the root.
#[cfg(feature = "walk")]
pub struct WalkSources {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

#[cfg(feature = "walk")]
impl WalkSources {
    /// Create a walker for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    /// Add include patterns (e.g., `["**/*.spec.{js,ts}"]`)
    pub fn include(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add exclude patterns (e.g., `["**/node_modules/**"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }
}

#[cfg(feature = "walk")]
fn build_globset(patterns: &[String]) -> Result<globset::GlobSet> {
    use eyre::WrapErr;

    let mut builder = globset::GlobSetBuilder::new();
    for pattern in patterns {
        let glob = globset::GlobBuilder::new(&pattern.replace('\\', "/"))
            .literal_separator(true)
            .build()
            .wrap_err_with(|| format!("Invalid glob pattern '{}'", pattern))?;
        builder.add(glob);
    }
    builder.build().wrap_err("Failed to compile glob patterns")
}

#[cfg(feature = "walk")]
fn relative_slash_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

#[cfg(feature = "walk")]
impl Sources for WalkSources {
    fn extract(self, scanner: &Scanner) -> Result<References> {
        use ignore::WalkBuilder;

        let include = if self.include.is_empty() {
            vec![DEFAULT_TEST_FILES.to_string()]
        } else {
            self.include
        };
        let include = build_globset(&include)?;
        let exclude = build_globset(&self.exclude)?;

        let walker = WalkBuilder::new(&self.root)
            .follow_links(true)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        let mut refs = References::new();
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let relative = relative_slash_path(path, &self.root);
            if !include.is_match(&relative) || exclude.is_match(&relative) {
                continue;
            }

            // Non-UTF-8 files cannot contain a reference call we could parse
            let Ok(content) = std::fs::read_to_string(path) else {
                continue;
            };
            extract_from_content(Path::new(&relative), &content, scanner, &mut refs);
        }

        refs.sort();
        Ok(refs)
    }
}
