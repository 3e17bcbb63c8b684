//! Browser automation transport contract.
//!
//! The engine drives a remote browser (typically an extension bridged over
//! a WebSocket) exclusively through this trait. Every call is expected to
//! fail if the transport is not connected; the engine additionally checks
//! [`BrowserTransport::is_connected`] before interpolating step arguments so
//! connectivity problems surface as `EngineError::BrowserNotConnected`
//! rather than a mid-step failure.

use async_trait::async_trait;

use weft_types::error::EngineError;
use weft_types::workflow::ScrollDirection;

/// Capability contract for the remote browser client.
#[async_trait]
pub trait BrowserTransport: Send + Sync {
    /// Whether the remote end is currently reachable.
    fn is_connected(&self) -> bool;

    /// Load a URL in the automation tab.
    async fn navigate(&self, url: &str) -> Result<(), EngineError>;

    /// Click the first element matching the selector.
    async fn click(&self, selector: &str) -> Result<(), EngineError>;

    /// Type text into the matching element, optionally submitting the form.
    async fn type_text(&self, selector: &str, text: &str, submit: bool)
    -> Result<(), EngineError>;

    /// Scroll the page by `amount` pixels.
    async fn scroll(&self, direction: ScrollDirection, amount: u32) -> Result<(), EngineError>;

    /// Extract text content from the first matching element.
    async fn extract(&self, selector: &str) -> Result<String, EngineError>;

    /// Extract text from every matching element, joined with `separator`.
    async fn extract_all(&self, selector: &str, separator: &str) -> Result<String, EngineError>;

    /// Block until the element appears or the timeout elapses.
    async fn wait_for_element(&self, selector: &str, timeout_ms: u64) -> Result<(), EngineError>;

    /// Probe for an element within the timeout. A missing element is a
    /// `false` result, not an error.
    async fn exists(&self, selector: &str, timeout_ms: u64) -> Result<bool, EngineError>;

    /// Hover over the first matching element.
    async fn hover(&self, selector: &str) -> Result<(), EngineError>;

    /// Press a key, optionally focused on a selector first.
    async fn press_key(&self, key: &str, selector: Option<&str>) -> Result<(), EngineError>;

    /// Bring the automation surface to the foreground. Called once per
    /// top-level run when the workflow contains browser steps; failure is
    /// logged, never fatal.
    async fn focus(&self) -> Result<(), EngineError>;
}
