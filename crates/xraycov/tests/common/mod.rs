//! Common test utilities.

#![allow(dead_code)]

use std::path::PathBuf;

/// Get the path to the test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Fixture project with a config and a few test files.
pub fn workspace_dir() -> PathBuf {
    fixtures_dir().join("workspace")
}

/// Create a temporary project containing only the given config.
pub fn create_temp_project(config_yaml: &str) -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let config_dir = temp.path().join(".config/xraycov");
    std::fs::create_dir_all(&config_dir).expect("Failed to create config dir");
    std::fs::write(config_dir.join("config.yaml"), config_yaml).expect("Failed to write config");
    temp
}

/// Serve the fixture search page over HTTP on a local port.
///
/// Returns the base URL to use as the Jira domain.
pub fn serve_search_page() -> String {
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    let body = std::fs::read_to_string(workspace_dir().join("search_page.json"))
        .expect("Failed to read search page fixture");
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind mock Jira");
    let addr = listener.local_addr().expect("Failed to get mock Jira address");

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().expect("Failed to clone stream"));
            let mut line = String::new();
            while reader.read_line(&mut line).is_ok_and(|n| n > 0) && line != "\r\n" {
                line.clear();
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", addr)
}

/// Temporary copy of the fixture workspace whose config points at `domain`.
///
/// The API key is left out of the config so it must come from the environment.
pub fn create_fixture_project(domain: &str) -> tempfile::TempDir {
    let config = format!(
        "atlassian:\n  domain: {}\n  username: qa@acme.io\n  project: PROJ\n  group_by_epic: true\n  sanitize_titles:\n    - \"[auto] \"\nautocompletion:\n  enable: true\n  custom_method: xrayTest\n",
        domain
    );
    let temp = create_temp_project(&config);
    for rel in ["tests/login/login.spec.ts", "tests/cart/cart.spec.js"] {
        let target = temp.path().join(rel);
        std::fs::create_dir_all(target.parent().expect("fixture path has a parent"))
            .expect("Failed to create test dir");
        std::fs::copy(workspace_dir().join(rel), &target).expect("Failed to copy test file");
    }
    temp
}
