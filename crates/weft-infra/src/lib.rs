//! Infrastructure adapters for the weft workflow engine.
//!
//! Everything here sits behind a `weft-core` collaborator trait or feeds
//! the registry: HTTP LLM backends, process-based shell execution, and the
//! YAML workflow loader. The core never performs I/O itself.

pub mod llm;
pub mod loader;
pub mod shell;
