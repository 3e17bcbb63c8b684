//! Workflow execution core for Weft.
//!
//! This crate is the "brain" of the engine: it takes already-parsed
//! [`weft_types::workflow::WorkflowDefinition`] values and drives them
//! through the step-execution state machine -- variable interpolation,
//! automatic retry with backoff, cancellation, nested workflow calls with
//! depth/cycle protection, and the ordered run-event protocol.
//!
//! External collaborators are abstracted behind traits and implemented
//! elsewhere (weft-infra or the embedding application):
//! - [`transport::BrowserTransport`] -- the remote browser automation client
//! - [`llm::LlmBackend`] -- the text-generation backend
//! - [`shell::ShellRunner`] -- shell and terminal command execution
//!
//! The core never parses YAML and never touches the filesystem or network
//! directly.

pub mod engine;
pub mod llm;
pub mod registry;
pub mod shell;
pub mod transport;
