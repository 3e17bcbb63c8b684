//! Shared test doubles and fixtures for engine tests.
//!
//! `ScriptedBrowser`, `StaticLlm`, and `RecordingShell` are canned
//! collaborators that record every call they receive; the `simple_engine`
//! family wires them into a ready-to-run engine around an in-memory
//! registry.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use weft_types::error::EngineError;
use weft_types::llm::LlmConfig;
use weft_types::workflow::{ScrollDirection, Step, WorkflowDefinition};

use crate::llm::LlmBackend;
use crate::registry::WorkflowRegistry;
use crate::shell::ShellRunner;
use crate::transport::BrowserTransport;

use super::context::ExecutionContext;
use super::{EngineConfig, WorkflowEngine};

// ---------------------------------------------------------------------------
// ScriptedBrowser
// ---------------------------------------------------------------------------

/// Browser transport double. Records one string per received call and can be
/// scripted to fail the first N operations or the focus call.
pub struct ScriptedBrowser {
    connected: bool,
    /// Remaining operation calls that fail with a retryable browser error.
    fail_ops: AtomicU32,
    focus_fails: bool,
    extracts: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBrowser {
    pub fn connected() -> Self {
        Self {
            connected: true,
            fail_ops: AtomicU32::new(0),
            focus_fails: false,
            extracts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::connected()
        }
    }

    /// Fail the first `n` operations with a retryable browser error.
    pub fn failing_ops(mut self, n: u32) -> Self {
        self.fail_ops = AtomicU32::new(n);
        self
    }

    /// Make the focus call fail (operations still succeed).
    pub fn failing_focus(mut self) -> Self {
        self.focus_fails = true;
        self
    }

    /// Script the text returned when `selector` is extracted.
    pub fn with_extract(mut self, selector: &str, text: &str) -> Self {
        self.extracts.insert(selector.to_string(), text.to_string());
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Record a call, then fail it if scripted failures remain.
    fn op(&self, call: String) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push(call);
        let failing = self
            .fail_ops
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            Err(EngineError::Browser("scripted failure".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BrowserTransport for ScriptedBrowser {
    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        self.op(format!("navigate {url}"))
    }

    async fn click(&self, selector: &str) -> Result<(), EngineError> {
        self.op(format!("click {selector}"))
    }

    async fn type_text(
        &self,
        selector: &str,
        text: &str,
        submit: bool,
    ) -> Result<(), EngineError> {
        self.op(format!("type {selector} '{text}' submit={submit}"))
    }

    async fn scroll(&self, direction: ScrollDirection, amount: u32) -> Result<(), EngineError> {
        self.op(format!("scroll {direction} {amount}"))
    }

    async fn extract(&self, selector: &str) -> Result<String, EngineError> {
        self.op(format!("extract {selector}"))?;
        Ok(self.extracts.get(selector).cloned().unwrap_or_default())
    }

    async fn extract_all(&self, selector: &str, separator: &str) -> Result<String, EngineError> {
        self.op(format!("extract_all {selector}"))?;
        let text = self.extracts.get(selector).cloned().unwrap_or_default();
        // Scripted value holds newline-separated items.
        Ok(text.split('\n').collect::<Vec<_>>().join(separator))
    }

    async fn wait_for_element(&self, selector: &str, _timeout_ms: u64) -> Result<(), EngineError> {
        self.op(format!("wait {selector}"))
    }

    async fn exists(&self, selector: &str, _timeout_ms: u64) -> Result<bool, EngineError> {
        self.op(format!("exists {selector}"))?;
        Ok(true)
    }

    async fn hover(&self, selector: &str) -> Result<(), EngineError> {
        self.op(format!("hover {selector}"))
    }

    async fn press_key(&self, key: &str, selector: Option<&str>) -> Result<(), EngineError> {
        self.op(format!("key {key} {}", selector.unwrap_or("-")))
    }

    async fn focus(&self) -> Result<(), EngineError> {
        self.calls.lock().unwrap().push("focus".to_string());
        if self.focus_fails {
            Err(EngineError::Browser("window manager busy".to_string()))
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// StaticLlm
// ---------------------------------------------------------------------------

/// LLM backend double returning one canned response, recording every prompt
/// and the model each call resolved to.
pub struct StaticLlm {
    response: String,
    prompts: Mutex<Vec<String>>,
    models: Mutex<Vec<String>>,
}

impl StaticLlm {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
            models: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// The `model` field of each call's config ("-" when unset).
    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmBackend for StaticLlm {
    async fn generate(&self, prompt: &str, config: &LlmConfig) -> Result<String, EngineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.models
            .lock()
            .unwrap()
            .push(config.model.clone().unwrap_or_else(|| "-".to_string()));
        Ok(self.response.clone())
    }
}

// ---------------------------------------------------------------------------
// RecordingShell
// ---------------------------------------------------------------------------

/// Shell runner double. Records commands, returns one canned output, and
/// only recognizes explicitly registered terminal sessions.
pub struct RecordingShell {
    output: String,
    sessions: HashSet<String>,
    commands: Mutex<Vec<String>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::with_output("ok")
    }

    pub fn with_output(output: &str) -> Self {
        Self {
            output: output.to_string(),
            sessions: HashSet::new(),
            commands: Mutex::new(Vec::new()),
        }
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.sessions.insert(session.to_string());
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellRunner for RecordingShell {
    async fn run(&self, command: &str) -> Result<String, EngineError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(self.output.clone())
    }

    async fn run_in_session(&self, session: &str, command: &str) -> Result<String, EngineError> {
        if !self.sessions.contains(session) {
            return Err(EngineError::TerminalUnavailable(session.to_string()));
        }
        self.commands
            .lock()
            .unwrap()
            .push(format!("[{session}] {command}"));
        Ok(self.output.clone())
    }
}

// ---------------------------------------------------------------------------
// Engine and fixture builders
// ---------------------------------------------------------------------------

fn build_engine(
    workflows: Vec<WorkflowDefinition>,
    browser: Option<Arc<dyn BrowserTransport>>,
    llm: Arc<dyn LlmBackend>,
    shell: Arc<dyn ShellRunner>,
) -> WorkflowEngine {
    let registry = Arc::new(WorkflowRegistry::new(workflows, Vec::new()));
    WorkflowEngine::new(registry, browser, llm, shell, EngineConfig::default())
}

/// Engine with no browser transport and default canned collaborators.
pub fn simple_engine(workflows: Vec<WorkflowDefinition>) -> WorkflowEngine {
    build_engine(
        workflows,
        None,
        Arc::new(StaticLlm::new("ok")),
        Arc::new(RecordingShell::new()),
    )
}

/// Engine around a scripted browser transport.
pub fn engine_with_browser(
    workflows: Vec<WorkflowDefinition>,
    browser: Arc<ScriptedBrowser>,
) -> WorkflowEngine {
    build_engine(
        workflows,
        Some(browser),
        Arc::new(StaticLlm::new("ok")),
        Arc::new(RecordingShell::new()),
    )
}

/// Engine around a specific LLM backend double.
pub fn engine_with_llm(
    workflows: Vec<WorkflowDefinition>,
    llm: Arc<StaticLlm>,
) -> WorkflowEngine {
    build_engine(workflows, None, llm, Arc::new(RecordingShell::new()))
}

/// Engine around a specific shell runner double.
pub fn engine_with_shell(
    workflows: Vec<WorkflowDefinition>,
    shell: Arc<RecordingShell>,
) -> WorkflowEngine {
    build_engine(workflows, None, Arc::new(StaticLlm::new("ok")), shell)
}

/// Minimal definition with the given id and steps.
pub fn workflow_with(id: &str, steps: Vec<Step>) -> WorkflowDefinition {
    WorkflowDefinition {
        id: id.to_string(),
        title: id.to_string(),
        description: None,
        params: HashMap::new(),
        allowed_domains: None,
        steps,
    }
}

/// Fresh top-level execution context.
pub fn root_context() -> ExecutionContext {
    root_context_with_token().0
}

/// Fresh top-level context plus a handle on its cancellation cell.
pub fn root_context_with_token() -> (ExecutionContext, CancellationToken) {
    let token = CancellationToken::new();
    let ctx = ExecutionContext::new(
        Uuid::now_v7(),
        LlmConfig::local(),
        Vec::new(),
        HashMap::new(),
        token.clone(),
        None,
    );
    (ctx, token)
}
