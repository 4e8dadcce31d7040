//! LSP server for xraycov
//!
//! Provides editor help for the test-reference method in test files:
//! - Completions: suggest test cases from the Jira catalog inside `method("`
//! - Hover: show the Jira browse URL of the referenced test case

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use eyre::Result;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, warn};
use xraycov_core::{TestCase, method_argument};

use crate::config::Config;
use crate::jira::JiraClient;
use crate::store::TestCaseStore;

/// Run the LSP server over stdio
pub async fn run(root: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let project_root = match root {
        Some(r) => r,
        None => crate::find_project_root()?,
    };
    let config_path = config_path.unwrap_or_else(|| crate::default_config_path(&project_root));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, config_path));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}

/// Settings and catalog, replaced together when the config changes
struct State {
    config: Config,
    /// `None` while the Jira settings are incomplete
    store: Option<Arc<TestCaseStore>>,
}

impl State {
    fn load(config_path: &std::path::Path) -> Self {
        let config = crate::load_config_or_default(config_path);
        let store = match JiraClient::new(&config.atlassian) {
            Ok(client) => Some(Arc::new(TestCaseStore::new(
                Arc::new(client),
                config.atlassian.sanitize_titles.clone(),
            ))),
            Err(e) => {
                debug!("catalog unavailable: {}", e);
                None
            }
        };
        Self { config, store }
    }
}

struct Backend {
    client: Client,
    config_path: PathBuf,
    state: RwLock<Arc<State>>,
    /// Document content cache: uri -> content
    documents: RwLock<HashMap<String, String>>,
}

impl Backend {
    fn new(client: Client, config_path: PathBuf) -> Self {
        let state = State::load(&config_path);
        Self {
            client,
            config_path,
            state: RwLock::new(Arc::new(state)),
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn state(&self) -> Arc<State> {
        self.state
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-read the config and replace the catalog store
    fn reload(&self) -> Arc<State> {
        let state = Arc::new(State::load(&self.config_path));
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = state.clone();
        state
    }

    fn line_at(&self, uri: &Url, line: u32) -> Option<String> {
        let docs = self.documents.read().ok()?;
        let content = docs.get(uri.as_str())?;
        content.lines().nth(line as usize).map(str::to_string)
    }

    /// Catalog from the store; empty while a download is running or on error
    async fn test_cases(&self, store: Arc<TestCaseStore>) -> Arc<Vec<TestCase>> {
        let result = tokio::task::spawn_blocking(move || store.get()).await;
        match result {
            Ok(Ok(cases)) => cases,
            Ok(Err(e)) => {
                warn!("{:#}", e);
                self.client
                    .show_message(MessageType::ERROR, format!("{:#}", e))
                    .await;
                Arc::new(Vec::new())
            }
            Err(e) => {
                warn!("catalog task failed: {}", e);
                Arc::new(Vec::new())
            }
        }
    }
}

/// Text of `line` before the UTF-16 `character` offset
fn line_prefix(line: &str, character: u32) -> &str {
    let mut units = 0u32;
    for (i, c) in line.char_indices() {
        if units >= character {
            return &line[..i];
        }
        units += c.len_utf16() as u32;
    }
    line
}

/// Whether completion is enabled and the cursor sits in a reference call
fn completion_applies(before_cursor: &str, config: &Config) -> bool {
    let method = &config.autocompletion.custom_method;
    config.autocompletion.enable
        && !method.is_empty()
        && before_cursor.trim().starts_with(method.as_str())
}

/// Completion items for the text before the cursor, or `None` when the line
/// is not a reference call, completion is disabled, or the catalog is empty.
fn completion_items(before_cursor: &str, cases: &[TestCase], config: &Config) -> Option<Vec<CompletionItem>> {
    if !completion_applies(before_cursor, config) || cases.is_empty() {
        return None;
    }

    let items = cases
        .iter()
        .enumerate()
        .map(|(index, case)| {
            let insert_text = if config.autocompletion.provide_id_only {
                case.numeric_id().to_string()
            } else {
                config.atlassian.browse_url(&case.key)
            };
            CompletionItem {
                label: format!("{} | {}", case.key, case.summary),
                kind: Some(CompletionItemKind::VALUE),
                insert_text: Some(insert_text),
                preselect: Some(index == 0),
                documentation: (!case.description.is_empty()).then(|| {
                    Documentation::MarkupContent(MarkupContent {
                        kind: MarkupKind::PlainText,
                        value: case.description.clone(),
                    })
                }),
                ..Default::default()
            }
        })
        .collect();

    Some(items)
}

/// Hover text for a reference call on `line`
fn hover_text(line: &str, config: &Config) -> Option<String> {
    let method = &config.autocompletion.custom_method;
    if !config.autocompletion.enable || method.is_empty() {
        return None;
    }
    if !line.trim().starts_with(method.as_str()) {
        return None;
    }

    let arg = method_argument(line, method)?;
    let url = if config.autocompletion.provide_id_only {
        config
            .atlassian
            .browse_url(&format!("{}-{}", config.atlassian.project, arg))
    } else {
        arg
    };
    (!url.is_empty()).then_some(url)
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, _: InitializeParams) -> LspResult<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["'".to_string(), "\"".to_string()]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "xraycov".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let state = self.state();
        if state.config.autocompletion.enable && state.store.is_none() {
            let missing = state.config.atlassian.missing_fields().join(", ");
            self.client
                .show_message(
                    MessageType::WARNING,
                    format!(
                        "Please provide all required fields in the configuration for atlassian - domain, username, apiKey, project (missing: {})",
                        missing
                    ),
                )
                .await;
        }
    }

    async fn shutdown(&self) -> LspResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        if let Ok(mut docs) = self.documents.write() {
            docs.insert(uri, params.text_document.text);
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        if let Some(change) = params.content_changes.into_iter().next()
            && let Ok(mut docs) = self.documents.write()
        {
            docs.insert(uri, change.text);
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        if let Ok(mut docs) = self.documents.write() {
            docs.remove(&uri);
        }
    }

    /// Settings changes take effect without restarting the server
    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {
        self.reload();
        self.client
            .show_message(MessageType::INFO, "xraycov settings reloaded")
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;

        let Some(line) = self.line_at(uri, position.line) else {
            return Ok(None);
        };
        let before_cursor = line_prefix(&line, position.character);

        let state = self.state();
        let Some(store) = state.store.clone() else {
            return Ok(None);
        };
        if !completion_applies(before_cursor, &state.config) {
            return Ok(None);
        }

        let cases = self.test_cases(store).await;
        Ok(completion_items(before_cursor, &cases, &state.config).map(CompletionResponse::Array))
    }

    async fn hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;

        let Some(line) = self.line_at(uri, position.line) else {
            return Ok(None);
        };

        let state = self.state();
        Ok(hover_text(&line, &state.config).map(|url| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: url,
            }),
            range: None,
        }))
    }
}
