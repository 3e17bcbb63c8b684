//! Browser operation handlers.
//!
//! Every handler checks transport connectivity before any
//! interpolation-dependent work, so a dead transport surfaces as the
//! non-retried `BrowserNotConnected` classification. Extraction results are
//! written into the context's variable map.

use std::sync::Arc;

use weft_types::error::EngineError;
use weft_types::workflow::ScrollDirection;

use crate::engine::WorkflowEngine;
use crate::engine::context::ExecutionContext;
use crate::transport::BrowserTransport;

use super::StepSuccess;

impl WorkflowEngine {
    /// The transport, or `BrowserNotConnected` if absent or disconnected.
    fn browser(&self) -> Result<&Arc<dyn BrowserTransport>, EngineError> {
        match &self.browser {
            Some(browser) if browser.is_connected() => Ok(browser),
            _ => Err(EngineError::BrowserNotConnected),
        }
    }

    pub(crate) async fn step_navigate(
        &self,
        url: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let url = ctx.interpolate(url);
        check_domain_policy(&url, ctx.allowed_domains.as_deref())?;
        browser.navigate(&url).await?;
        Ok(StepSuccess::with_message(format!("navigated to {url}")))
    }

    pub(crate) async fn step_click(
        &self,
        selector: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        browser.click(&selector).await?;
        Ok(StepSuccess::done())
    }

    pub(crate) async fn step_type(
        &self,
        selector: &str,
        text: &str,
        submit: bool,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        let text = ctx.interpolate(text);
        browser.type_text(&selector, &text, submit).await?;
        Ok(StepSuccess::done())
    }

    pub(crate) async fn step_scroll(
        &self,
        direction: ScrollDirection,
        amount: u32,
        _ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        browser.scroll(direction, amount).await?;
        Ok(StepSuccess::done())
    }

    pub(crate) async fn step_extract(
        &self,
        selector: &str,
        variable: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        let text = browser.extract(&selector).await?;
        ctx.variables.insert(variable.to_string(), text.clone());
        Ok(StepSuccess::with_result(text))
    }

    pub(crate) async fn step_extract_all(
        &self,
        selector: &str,
        variable: &str,
        separator: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        let text = browser.extract_all(&selector, separator).await?;
        ctx.variables.insert(variable.to_string(), text.clone());
        Ok(StepSuccess::with_result(text))
    }

    pub(crate) async fn step_wait(
        &self,
        selector: &str,
        timeout_ms: u64,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        browser.wait_for_element(&selector, timeout_ms).await?;
        Ok(StepSuccess::done())
    }

    pub(crate) async fn step_exists(
        &self,
        selector: &str,
        variable: &str,
        timeout_ms: u64,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        let present = browser.exists(&selector, timeout_ms).await?;
        let value = present.to_string();
        ctx.variables.insert(variable.to_string(), value.clone());
        Ok(StepSuccess::with_result(value))
    }

    pub(crate) async fn step_hover(
        &self,
        selector: &str,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = ctx.interpolate(selector);
        browser.hover(&selector).await?;
        Ok(StepSuccess::done())
    }

    pub(crate) async fn step_key(
        &self,
        key: &str,
        selector: Option<&str>,
        ctx: &mut ExecutionContext,
    ) -> Result<StepSuccess, EngineError> {
        let browser = self.browser()?;
        let selector = selector.map(|s| ctx.interpolate(s));
        browser.press_key(key, selector.as_deref()).await?;
        Ok(StepSuccess::done())
    }
}

/// Enforce a workflow's hostname allow-list on a navigation target.
///
/// Matching is by exact hostname or dot-separated suffix, so
/// `example.com` admits `news.example.com` but not `badexample.com`.
fn check_domain_policy(url: &str, allowed: Option<&[String]>) -> Result<(), EngineError> {
    let Some(allowed) = allowed else {
        return Ok(());
    };
    let host = host_of(url);
    let permitted = allowed
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")));
    if permitted {
        Ok(())
    } else {
        Err(EngineError::Validation(format!(
            "navigation to '{host}' is outside the workflow's allowed domains"
        )))
    }
}

/// Extract the hostname portion of a URL without a full parser.
fn host_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let host_port = without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    host_port
        .rsplit_once('@')
        .map_or(host_port, |(_, host)| host)
        .split(':')
        .next()
        .unwrap_or_default()
        .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use weft_types::workflow::Step;

    use crate::engine::testing::{
        ScriptedBrowser, engine_with_browser, simple_engine, workflow_with,
    };
    use crate::engine::{RunOptions, RunStatus};

    use super::*;

    #[test]
    fn host_extraction_handles_common_shapes() {
        assert_eq!(host_of("https://example.com/path?q=1"), "example.com");
        assert_eq!(host_of("http://example.com:8080/x"), "example.com");
        assert_eq!(host_of("example.com/x"), "example.com");
        assert_eq!(host_of("https://user@example.com/"), "example.com");
    }

    #[test]
    fn domain_policy_suffix_match() {
        let allowed = vec!["example.com".to_string()];
        assert!(check_domain_policy("https://example.com/a", Some(&allowed)).is_ok());
        assert!(check_domain_policy("https://news.example.com/a", Some(&allowed)).is_ok());
        assert!(check_domain_policy("https://badexample.com/a", Some(&allowed)).is_err());
        assert!(check_domain_policy("https://other.org/a", None).is_ok());
    }

    #[tokio::test]
    async fn extract_stores_variable_and_result() {
        let browser = Arc::new(
            ScriptedBrowser::connected().with_extract("h1", "Breaking News"),
        );
        let workflow = workflow_with("extractor", vec![
            Step::Extract {
                selector: "h1".to_string(),
                variable: "headline".to_string(),
            },
            Step::Stop {
                message: Some("got {{headline}}".to_string()),
            },
        ]);
        let engine = engine_with_browser(vec![workflow], browser);

        let report = engine.run("extractor", RunOptions::default()).await;
        assert_eq!(report.status, RunStatus::Success);
        assert_eq!(report.message.as_deref(), Some("got Breaking News"));
    }

    #[tokio::test]
    async fn navigate_interpolates_url() {
        let browser = Arc::new(ScriptedBrowser::connected());
        let workflow = workflow_with("nav", vec![Step::Navigate {
            url: "https://example.com/{{env.path}}".to_string(),
        }]);
        let engine = engine_with_browser(vec![workflow], Arc::clone(&browser));

        let mut options = RunOptions::default();
        options
            .params
            .insert("env.path".to_string(), "news".to_string());
        let report = engine.run("nav", options).await;

        assert_eq!(report.status, RunStatus::Success);
        assert!(
            browser
                .calls()
                .iter()
                .any(|c| c == "navigate https://example.com/news")
        );
    }

    #[tokio::test]
    async fn navigate_outside_allowed_domains_fails_without_retry() {
        let browser = Arc::new(ScriptedBrowser::connected());
        let mut workflow = workflow_with("fenced", vec![Step::Navigate {
            url: "https://evil.example.org".to_string(),
        }]);
        workflow.allowed_domains = Some(vec!["example.com".to_string()]);
        let engine = engine_with_browser(vec![workflow], Arc::clone(&browser));

        let report = engine.run("fenced", RunOptions::default()).await;
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.message.unwrap().contains("allowed domains"));
        assert!(!browser.calls().iter().any(|c| c.starts_with("navigate")));
    }

    #[tokio::test]
    async fn browser_step_without_transport_is_not_connected() {
        let workflow = workflow_with("no-transport", vec![Step::Hover {
            selector: "#x".to_string(),
        }]);
        let engine = simple_engine(vec![workflow]);

        let report = engine.run("no-transport", RunOptions::default()).await;
        assert_eq!(report.status, RunStatus::Failed);
        assert!(report.message.unwrap().contains("not connected"));
    }

    #[tokio::test]
    async fn exists_stores_boolean_text() {
        let browser = Arc::new(ScriptedBrowser::connected());
        let workflow = workflow_with("probe", vec![
            Step::Exists {
                selector: "#banner".to_string(),
                variable: "has_banner".to_string(),
                timeout_ms: 100,
            },
            Step::Stop {
                message: Some("present={{has_banner}}".to_string()),
            },
        ]);
        let engine = engine_with_browser(vec![workflow], browser);

        let report = engine.run("probe", RunOptions::default()).await;
        assert_eq!(report.message.as_deref(), Some("present=true"));
    }
}
