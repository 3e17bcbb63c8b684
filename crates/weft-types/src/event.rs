//! Run event protocol.
//!
//! The engine streams progress to observers as an ordered sequence of
//! `RunEvent` records. Every event carries its nesting depth so renderers
//! can indent nested workflow calls. Events are immutable and append-only;
//! step-start/step-end pairs for the same index never interleave with
//! another step's pair at the same depth.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity for log-line events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One progress record emitted during a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    /// A workflow (top-level or nested) began executing.
    ///
    /// `run_id` is present only at depth 0; nested calls are identified by
    /// the ancestor's run id.
    WorkflowStarted {
        workflow: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<Uuid>,
        depth: u32,
    },
    /// A workflow finished, successfully or not.
    WorkflowFinished {
        workflow: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        depth: u32,
    },
    /// A step is about to execute.
    StepStarted {
        index: usize,
        kind: String,
        detail: String,
        depth: u32,
    },
    /// A step finished. Exactly one per `StepStarted`, regardless of how
    /// many retry attempts happened inside.
    StepFinished {
        index: usize,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        last_result: Option<String>,
        depth: u32,
    },
    /// Free-form log line (retry notices, condition results, stop messages).
    Log {
        level: LogLevel,
        message: String,
        depth: u32,
    },
    /// An error surfaced outside the step-start/step-end protocol.
    Error { message: String, depth: u32 },
}

impl RunEvent {
    /// Nesting depth the event was emitted at.
    pub fn depth(&self) -> u32 {
        match self {
            RunEvent::WorkflowStarted { depth, .. }
            | RunEvent::WorkflowFinished { depth, .. }
            | RunEvent::StepStarted { depth, .. }
            | RunEvent::StepFinished { depth, .. }
            | RunEvent::Log { depth, .. }
            | RunEvent::Error { depth, .. } => *depth,
        }
    }
}
