//! Workflow definition types.
//!
//! A `WorkflowDefinition` is the immutable, already-parsed form of a YAML
//! workflow file: identifier, title, declared parameters, optional domain
//! allow-list, and an ordered sequence of steps. Steps form a recursive
//! tagged union -- the `if` and `retry` kinds embed child step sequences.
//! Definitions are never mutated by the engine; all run state lives in the
//! execution context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Workflow Definition
// ---------------------------------------------------------------------------

/// An immutable workflow definition, loaded once per run invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    /// Workflow identifier. Exact-match lookup key in the registry.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared call parameters (name -> primitive type).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub params: HashMap<String, ParamType>,
    /// Optional hostname allow-list enforced by the navigate step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
    /// Ordered step sequence.
    pub steps: Vec<Step>,
}

/// Primitive type of a declared workflow parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

// ---------------------------------------------------------------------------
// Step
// ---------------------------------------------------------------------------

/// One unit of workflow execution.
///
/// Internally tagged by `type` to match the YAML structure:
/// ```yaml
/// steps:
///   - type: navigate
///     url: "https://example.com/{{path}}"
///   - type: extract
///     selector: "h1"
///     variable: title
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Navigate the browser to a URL.
    Navigate { url: String },
    /// Click the first element matching a selector.
    Click { selector: String },
    /// Type text into an element, optionally submitting afterwards.
    Type {
        selector: String,
        text: String,
        #[serde(default)]
        submit: bool,
    },
    /// Scroll the page.
    Scroll {
        #[serde(default)]
        direction: ScrollDirection,
        #[serde(default = "default_scroll_amount")]
        amount: u32,
    },
    /// Extract text from the first matching element into a variable.
    Extract { selector: String, variable: String },
    /// Extract text from all matching elements, joined by a separator.
    ExtractAll {
        selector: String,
        variable: String,
        #[serde(default = "default_separator")]
        separator: String,
    },
    /// Wait until an element appears (or the timeout elapses).
    Wait {
        selector: String,
        #[serde(default = "default_wait_timeout_ms")]
        timeout_ms: u64,
    },
    /// Probe for an element and store "true"/"false" into a variable.
    Exists {
        selector: String,
        variable: String,
        #[serde(default = "default_exists_timeout_ms")]
        timeout_ms: u64,
    },
    /// Hover over the first matching element.
    Hover { selector: String },
    /// Press a key, optionally scoped to an element.
    Key {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
    },

    /// Run a shell command, optionally capturing stdout into a variable.
    Shell {
        command: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
    },
    /// Run a command inside a named terminal session.
    Terminal {
        command: String,
        session: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
    },

    /// Generate text with the configured LLM backend.
    Generate {
        prompt: String,
        variable: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model: Option<String>,
    },
    /// Classify an input into one of a fixed set of labels via the LLM.
    Classify {
        input: String,
        classes: Vec<String>,
        variable: String,
    },

    /// Conditional branch over embedded step sequences.
    If {
        condition: String,
        then_steps: Vec<Step>,
        #[serde(default)]
        else_steps: Vec<Step>,
    },
    /// Re-run an embedded step sequence until it succeeds.
    Retry {
        steps: Vec<Step>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_attempts: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Terminate the workflow early -- a successful outcome, not a failure.
    Stop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Invoke another workflow by identifier.
    Call {
        workflow: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        params: HashMap<String, String>,
    },

    /// Assign an interpolated value to a variable.
    SetVariable { name: String, value: String },
    /// Store the first non-empty value from a list of candidates.
    First { from: Vec<String>, variable: String },
}

/// Direction for the scroll step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrollDirection::Up => write!(f, "up"),
            ScrollDirection::Down => write!(f, "down"),
        }
    }
}

fn default_scroll_amount() -> u32 {
    600
}

fn default_separator() -> String {
    "\n".to_string()
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

fn default_exists_timeout_ms() -> u64 {
    2_000
}

impl Step {
    /// Stable kind name, matching the YAML `type` tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Step::Navigate { .. } => "navigate",
            Step::Click { .. } => "click",
            Step::Type { .. } => "type",
            Step::Scroll { .. } => "scroll",
            Step::Extract { .. } => "extract",
            Step::ExtractAll { .. } => "extract_all",
            Step::Wait { .. } => "wait",
            Step::Exists { .. } => "exists",
            Step::Hover { .. } => "hover",
            Step::Key { .. } => "key",
            Step::Shell { .. } => "shell",
            Step::Terminal { .. } => "terminal",
            Step::Generate { .. } => "generate",
            Step::Classify { .. } => "classify",
            Step::If { .. } => "if",
            Step::Retry { .. } => "retry",
            Step::Stop { .. } => "stop",
            Step::Call { .. } => "call",
            Step::SetVariable { .. } => "set_variable",
            Step::First { .. } => "first",
        }
    }

    /// Short human-readable rendering of the step's primary argument.
    ///
    /// Used for step-start events so renderers can show what a step is about
    /// without reproducing the full definition.
    pub fn summary(&self) -> String {
        match self {
            Step::Navigate { url } => truncate(url),
            Step::Click { selector }
            | Step::Hover { selector }
            | Step::Extract { selector, .. }
            | Step::ExtractAll { selector, .. }
            | Step::Wait { selector, .. }
            | Step::Exists { selector, .. }
            | Step::Type { selector, .. } => truncate(selector),
            Step::Scroll { direction, amount } => format!("{direction} {amount}px"),
            Step::Key { key, .. } => key.clone(),
            Step::Shell { command, .. } | Step::Terminal { command, .. } => truncate(command),
            Step::Generate { prompt, .. } => truncate(prompt),
            Step::Classify { input, .. } => truncate(input),
            Step::If { condition, .. } => truncate(condition),
            Step::Retry { steps, .. } => format!("{} step(s)", steps.len()),
            Step::Stop { message } => message.as_deref().map(truncate).unwrap_or_default(),
            Step::Call { workflow, .. } => workflow.clone(),
            Step::SetVariable { name, .. } => name.clone(),
            Step::First { variable, .. } => variable.clone(),
        }
    }
}

/// Clip a summary string to a display-friendly length.
fn truncate(text: &str) -> String {
    const MAX: usize = 60;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(MAX).collect();
        format!("{clipped}...")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
