use crate::Result;
use async_trait::async_trait;
use serde_json::Value;

/// One cookie as reported by the browser's cookie store. Enumeration
/// order is whatever the browser returns and is treated as opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookiePair {
    pub name: String,
    pub value: String,
}

impl CookiePair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Capability interface over one live browser page.
///
/// The production implementation is [`crate::CdpSession`] (chromiumoxide
/// over the DevTools protocol); tests use an in-memory fake so the poller
/// and extractor run without a real browser.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load a URL and wait for the document body to be visible.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a script in page context and return its result. A runtime
    /// script error (e.g. a reference to a global that does not exist yet)
    /// surfaces as `Error::EvaluationFailed`, which callers must treat
    /// distinctly from a false/empty result.
    async fn evaluate(&self, script: &str) -> Result<Value>;

    /// Read the cookie jar scoped to a URL through the browser's cookie
    /// store, which includes HttpOnly cookies page scripts cannot see.
    async fn cookies_for(&self, url: &str) -> Result<Vec<CookiePair>>;

    /// URL the page is currently on, for diagnostics.
    async fn current_url(&self) -> Result<String>;

    /// Terminate the browser process.
    async fn close(&mut self) -> Result<()>;
}
