//! Configuration schema for xraycov
//!
//! Config lives at `.config/xraycov/config.yaml` relative to the project root.

use facet::Facet;
use xraycov_core::{DEFAULT_EXCLUDES, DEFAULT_TEST_FILES, RefStyle, Scanner};

/// Environment variable that supplies the API key when the config leaves it empty
pub const API_KEY_ENV: &str = "XRAYCOV_API_KEY";

/// Root configuration for xraycov
#[derive(Debug, Clone, Default, Facet)]
pub struct Config {
    /// Jira connection and catalog settings
    #[facet(default)]
    pub atlassian: AtlassianConfig,

    /// Glob pattern for test files to scan
    /// Defaults to `**/*.spec.{js,ts}`
    #[facet(default)]
    pub test_files: Option<String>,

    /// Glob patterns to skip while scanning
    /// Defaults to `["**/node_modules/**"]`
    #[facet(default)]
    pub exclude: Vec<String>,

    /// Editor help for the test-reference method
    #[facet(default)]
    pub autocompletion: AutocompletionConfig,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct AtlassianConfig {
    /// Base URL of the Jira site, e.g. `https://acme.atlassian.net`
    #[facet(default)]
    pub domain: String,

    #[facet(default)]
    pub username: String,

    /// API token for basic auth
    #[facet(default)]
    pub api_key: String,

    /// Project key, e.g. `PROJ`
    #[facet(default)]
    pub project: String,

    /// JQL override; empty means `project = {project} AND type=test`
    #[facet(default)]
    pub query: String,

    /// Group the HTML report by `[epic]` summary tags
    #[facet(default)]
    pub group_by_epic: bool,

    /// Literal fragments removed from fetched summaries
    #[facet(default)]
    pub sanitize_titles: Vec<String>,
}

#[derive(Debug, Clone, Default, Facet)]
pub struct AutocompletionConfig {
    #[facet(default)]
    pub enable: bool,

    /// Name of the method test files call with a test-case reference
    #[facet(default)]
    pub custom_method: String,

    /// The method argument is the bare numeric ID rather than a browse URL
    #[facet(default)]
    pub provide_id_only: bool,
}

impl Config {
    pub fn test_files(&self) -> &str {
        self.test_files
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(DEFAULT_TEST_FILES)
    }

    pub fn excludes(&self) -> Vec<String> {
        if self.exclude.is_empty() {
            DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
        } else {
            self.exclude.clone()
        }
    }

    pub fn ref_style(&self) -> RefStyle {
        RefStyle::from_id_only(self.autocompletion.provide_id_only)
    }

    pub fn scanner(&self) -> Scanner {
        Scanner::new(self.autocompletion.custom_method.clone(), self.ref_style())
    }

    /// Fill the API key from the environment when the file leaves it empty
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.atlassian.api_key.is_empty()
            && let Some(key) = lookup(API_KEY_ENV)
        {
            self.atlassian.api_key = key;
        }
    }
}

impl AtlassianConfig {
    /// Domain without a trailing slash
    pub fn base_url(&self) -> &str {
        self.domain.trim_end_matches('/')
    }

    /// Browser URL of an issue
    pub fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.base_url(), key)
    }

    /// Names of required settings that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("domain", &self.domain),
            ("username", &self.username),
            ("apiKey", &self.api_key),
            ("project", &self.project),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
atlassian:
  domain: https://acme.atlassian.net/
  username: qa@acme.io
  api_key: secret
  project: PROJ
  group_by_epic: true
  sanitize_titles:
    - "[auto] "
test_files: "e2e/**/*.test.ts"
autocompletion:
  enable: true
  custom_method: xrayTest
  provide_id_only: true
"#;
        let config: Config = facet_yaml::from_str(yaml).unwrap();

        assert_eq!(config.atlassian.base_url(), "https://acme.atlassian.net");
        assert_eq!(
            config.atlassian.browse_url("PROJ-1"),
            "https://acme.atlassian.net/browse/PROJ-1"
        );
        assert!(config.atlassian.group_by_epic);
        assert_eq!(config.atlassian.sanitize_titles, vec!["[auto] "]);
        assert_eq!(config.test_files(), "e2e/**/*.test.ts");
        assert!(config.autocompletion.enable);
        assert_eq!(config.ref_style(), RefStyle::IdOnly);
        assert!(config.atlassian.missing_fields().is_empty());
    }

    #[test]
    fn defaults_apply_to_sparse_config() {
        let config: Config = facet_yaml::from_str("atlassian:\n  project: PROJ\n").unwrap();

        assert_eq!(config.test_files(), "**/*.spec.{js,ts}");
        assert_eq!(config.excludes(), vec!["**/node_modules/**"]);
        assert!(!config.autocompletion.enable);
        assert_eq!(config.ref_style(), RefStyle::Url);
        assert_eq!(
            config.atlassian.missing_fields(),
            vec!["domain", "username", "apiKey"]
        );
    }

    #[test]
    fn env_fills_only_an_empty_api_key() {
        let lookup = |name: &str| (name == API_KEY_ENV).then(|| "from-env".to_string());

        let mut config: Config = facet_yaml::from_str("atlassian:\n  project: PROJ\n").unwrap();
        config.apply_env_from(lookup);
        assert_eq!(config.atlassian.api_key, "from-env");

        let mut config: Config =
            facet_yaml::from_str("atlassian:\n  api_key: from-file\n").unwrap();
        config.apply_env_from(lookup);
        assert_eq!(config.atlassian.api_key, "from-file");
    }
}
