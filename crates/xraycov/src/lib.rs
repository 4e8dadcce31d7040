//! xraycov library - Jira/Xray test coverage for local test suites
//!
//! This library exposes the pieces the `xraycov` binary is built from, for
//! testing and embedding purposes.

pub mod config;
pub mod jira;
pub mod lsp;
pub mod output;
pub mod store;

use config::Config;
use eyre::{Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::warn;
use xraycov_core::{References, WalkSources};

/// Config location relative to the project root
pub const CONFIG_PATH: &str = ".config/xraycov/config.yaml";

/// Nearest ancestor of the current directory that holds an xraycov config or a
/// git checkout; the current directory when there is none.
pub fn find_project_root() -> Result<PathBuf> {
    let start = std::env::current_dir().wrap_err("Failed to get current directory")?;
    Ok(project_root_from(&start))
}

fn project_root_from(start: &Path) -> PathBuf {
    let mut current = start.to_path_buf();

    loop {
        if current.join(".config/xraycov").is_dir() || current.join(".git").exists() {
            return current;
        }

        if !current.pop() {
            return start.to_path_buf();
        }
    }
}

/// Default config path for a project root
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_PATH)
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        eyre::bail!(
            "Config file not found at {}\n\n\
             Create a config file with your Jira settings:\n\n\
             atlassian:\n  \
                 domain: https://your-site.atlassian.net\n  \
                 username: you@example.com\n  \
                 api_key: <token>   # or set XRAYCOV_API_KEY\n  \
                 project: PROJ\n\
             autocompletion:\n  \
                 enable: true\n  \
                 custom_method: xrayTest",
            path.display()
        );
    }

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config = facet_yaml::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
    config.apply_env();

    Ok(config)
}

/// Load config if it exists, otherwise return the default config.
/// Lets the language server start before the project is configured.
pub fn load_config_or_default(path: &Path) -> Config {
    let mut config = if path.exists() {
        match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    config.apply_env();
    config
}

/// Scan the project's test files for test-case references
pub fn scan_coverage(project_root: &Path, config: &Config) -> Result<References> {
    if config.autocompletion.custom_method.trim().is_empty() {
        warn!("custom method name is not available in the settings");
        return Ok(References::new());
    }

    References::extract(
        WalkSources::new(project_root)
            .include([config.test_files()])
            .exclude(config.excludes()),
        &config.scanner(),
    )
    .wrap_err_with(|| format!("Failed to scan test files under {}", project_root.display()))
}

/// Route `tracing` output to stderr, filtered by `XRAYCOV_LOG` (default `warn`).
///
/// stdout stays free for reports and the LSP protocol.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("XRAYCOV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
