//! Per-run execution context.
//!
//! `ExecutionContext` is the mutable state that flows through one workflow
//! invocation level: variables, call parameters, nesting depth, the call
//! stack used for cycle detection, the shared cancellation cell, and the
//! captured event log with its optional push sink. A fresh child context is
//! derived for every nested workflow call and destroyed when the call
//! returns; only the cancellation cell and the event sink are shared across
//! the whole context tree.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use weft_types::event::{LogLevel, RunEvent};
use weft_types::llm::LlmConfig;

/// Parameters with this prefix flow automatically into child contexts, so
/// environment-style settings reach nested calls without explicit plumbing.
pub const ENV_PARAM_PREFIX: &str = "env.";

/// Synchronous push sink for run events. Invoked inline at emit time; the
/// observer owns any batching or persistence.
pub type EventSink = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Mutable state scoped to one workflow invocation level.
pub struct ExecutionContext {
    /// Top-level run identifier, shared by every context in the tree.
    pub run_id: Uuid,
    /// Variables produced by step handlers. Append/overwrite only.
    pub variables: HashMap<String, String>,
    /// Call parameters supplied by this level's caller. Read-only here.
    pub params: HashMap<String, String>,
    /// Nesting level; 0 for the top-level run.
    pub depth: u32,
    /// Identifiers of the workflows currently executing, outermost first.
    pub call_stack: Vec<String>,
    /// Hostname allow-list of the workflow currently executing at this level.
    pub allowed_domains: Option<Vec<String>>,
    /// LLM configuration, copied (not shared) into children.
    pub llm: LlmConfig,
    /// Free-form user context blocks prepended to LLM prompts.
    pub user_contexts: Vec<String>,
    /// Repo-path table for `{{_repo:org/repo}}` interpolation.
    pub repos: HashMap<String, String>,
    /// Shared cancellation cell. Cloning the token shares the cell, so a
    /// cancel request is visible at every depth regardless of when the
    /// context was created.
    cancellation: CancellationToken,
    /// Ordered event log captured at this level.
    events: Vec<RunEvent>,
    sink: Option<EventSink>,
    /// Set exactly once, by the stop step. First write wins.
    output_message: Option<String>,
}

impl ExecutionContext {
    /// Create the root context for a top-level run.
    pub fn new(
        run_id: Uuid,
        llm: LlmConfig,
        user_contexts: Vec<String>,
        repos: HashMap<String, String>,
        cancellation: CancellationToken,
        sink: Option<EventSink>,
    ) -> Self {
        Self {
            run_id,
            variables: HashMap::new(),
            params: HashMap::new(),
            depth: 0,
            call_stack: Vec::new(),
            allowed_domains: None,
            llm,
            user_contexts,
            repos,
            cancellation,
            events: Vec::new(),
            sink,
            output_message: None,
        }
    }

    /// Derive a child context for a nested workflow call.
    ///
    /// The child starts one level deeper with a copy of the call stack and
    /// of the read-mostly configuration. Only `env.`-prefixed parameters are
    /// inherited -- ordinary variables and params do not leak downward. The
    /// cancellation cell and event sink are shared, not copied.
    pub fn child(&self) -> Self {
        let env_params = self
            .params
            .iter()
            .filter(|(name, _)| name.starts_with(ENV_PARAM_PREFIX))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            run_id: self.run_id,
            variables: HashMap::new(),
            params: env_params,
            depth: self.depth + 1,
            call_stack: self.call_stack.clone(),
            allowed_domains: None,
            llm: self.llm.clone(),
            user_contexts: self.user_contexts.clone(),
            repos: self.repos.clone(),
            cancellation: self.cancellation.clone(),
            events: Vec::new(),
            sink: self.sink.clone(),
            output_message: None,
        }
    }

    /// Whether cancellation has been requested anywhere in the context tree.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Append an event to the capture log and forward it to the sink.
    ///
    /// Forwarding is synchronous and immediate -- never queued or batched.
    pub fn emit(&mut self, event: RunEvent) {
        if let Some(sink) = &self.sink {
            sink(&event);
        }
        self.events.push(event);
    }

    /// Emit a log-line event at this context's depth.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Info => tracing::info!(depth = self.depth, "{message}"),
            LogLevel::Warn => tracing::warn!(depth = self.depth, "{message}"),
            LogLevel::Error => tracing::error!(depth = self.depth, "{message}"),
        }
        self.emit(RunEvent::Log {
            level,
            message,
            depth: self.depth,
        });
    }

    /// Append a returned child's entire event log, preserving its relative
    /// order, contiguously at this point.
    ///
    /// Events are appended directly (not re-emitted) because the child
    /// already forwarded each one to the shared sink at emit time.
    pub fn merge_child_events(&mut self, child: ExecutionContext) {
        self.events.extend(child.events);
    }

    /// Record the stop step's output message. First write wins.
    pub fn set_output_message(&mut self, message: impl Into<String>) {
        if self.output_message.is_none() {
            self.output_message = Some(message.into());
        }
    }

    /// The output message, if a stop step set one.
    pub fn output_message(&self) -> Option<&str> {
        self.output_message.as_deref()
    }

    /// Interpolate a template against this context's variables, params, and
    /// repo table.
    pub fn interpolate(&self, text: &str) -> String {
        super::interpolate::interpolate(text, &self.variables, &self.params, &self.repos)
    }

    /// The captured event log.
    pub fn events(&self) -> &[RunEvent] {
        &self.events
    }

    /// Consume the context, yielding the captured event log.
    pub fn into_events(self) -> Vec<RunEvent> {
        self.events
    }

    /// Render the call chain for depth/cycle diagnostics, e.g.
    /// `digest -> fetch -> digest`.
    pub fn call_chain(&self, next: &str) -> String {
        let mut chain = self.call_stack.join(" -> ");
        if !chain.is_empty() {
            chain.push_str(" -> ");
        }
        chain.push_str(next);
        chain
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
