//! Shared domain types for the Weft workflow engine.
//!
//! This crate contains the definition-side types (workflows, steps), the
//! run-event protocol, LLM backend configuration, and the engine error
//! taxonomy. Zero infrastructure dependencies -- only serde, uuid, secrecy,
//! thiserror.

pub mod error;
pub mod event;
pub mod llm;
pub mod workflow;
