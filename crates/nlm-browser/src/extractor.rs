use crate::{BrowserDriver, CookiePair, Error, Result};
use nlm_core::AuthCredentials;

/// Client-side global NotebookLM populates once authentication completes.
pub(crate) const PRESENCE_SCRIPT: &str = "!!window.WIZ_global_data";

/// Field of the session global holding the request auth token.
pub(crate) const TOKEN_SCRIPT: &str = "window.WIZ_global_data.SNlM0e";

/// Outcome of one extraction attempt while the session global is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The global exists but its token field has not hydrated yet; the
    /// caller should keep polling within the same deadline.
    Pending,
    /// A complete token and cookie pair.
    Ready(AuthCredentials),
}

/// Reads the session token and cookie jar out of a live page.
pub struct AuthExtractor {
    origin: String,
}

impl AuthExtractor {
    /// Extractor scoped to the given origin's cookie jar.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    /// Check whether the session global exists in page context.
    pub async fn is_present(&self, driver: &dyn BrowserDriver) -> Result<bool> {
        let value = driver.evaluate(PRESENCE_SCRIPT).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Attempt extraction, assuming presence was already confirmed.
    ///
    /// An empty token reads as [`Extraction::Pending`]. A populated token
    /// with an empty cookie jar is `Error::ExtractionFailed`: a partial
    /// pair is never returned.
    pub async fn try_extract(&self, driver: &dyn BrowserDriver) -> Result<Extraction> {
        let token = driver
            .evaluate(TOKEN_SCRIPT)
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default();
        if token.is_empty() {
            tracing::debug!("Session global present but token not yet populated");
            return Ok(Extraction::Pending);
        }

        let cookies = driver.cookies_for(&self.origin).await?;
        let cookie_header = format_cookie_header(&cookies);
        if cookie_header.is_empty() {
            return Err(Error::ExtractionFailed);
        }

        tracing::debug!(
            "Extracted token ({} chars) and {} cookies",
            token.len(),
            cookies.len()
        );

        Ok(Extraction::Ready(AuthCredentials {
            auth_token: token,
            cookies: cookie_header,
        }))
    }

    /// Extraction as a single all-or-nothing step.
    pub async fn extract(&self, driver: &dyn BrowserDriver) -> Result<AuthCredentials> {
        match self.try_extract(driver).await? {
            Extraction::Ready(credentials) => Ok(credentials),
            Extraction::Pending => Err(Error::ExtractionFailed),
        }
    }
}

/// Serialize cookies as a Cookie header value, preserving store order.
fn format_cookie_header(cookies: &[CookiePair]) -> String {
    cookies
        .iter()
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;
    use crate::TARGET_URL;

    #[test]
    fn test_cookie_header_preserves_order() {
        let cookies = vec![
            CookiePair::new("a", "1"),
            CookiePair::new("b", "2"),
            CookiePair::new("SID", "xyz"),
        ];
        assert_eq!(format_cookie_header(&cookies), "a=1; b=2; SID=xyz");
    }

    #[test]
    fn test_cookie_header_empty_jar() {
        assert_eq!(format_cookie_header(&[]), "");
    }

    #[tokio::test]
    async fn test_extracts_token_and_cookies() {
        let driver = FakeDriver::new()
            .present_from_tick(1)
            .token_from_tick(1, "abc")
            .with_cookies(vec![CookiePair::new("a", "1"), CookiePair::new("b", "2")]);

        let extractor = AuthExtractor::new(TARGET_URL);
        assert!(extractor.is_present(&driver).await.unwrap());
        let credentials = extractor.extract(&driver).await.unwrap();

        assert_eq!(credentials.auth_token, "abc");
        assert_eq!(credentials.cookies, "a=1; b=2");
    }

    #[tokio::test]
    async fn test_empty_cookie_jar_is_extraction_failure() {
        let driver = FakeDriver::new()
            .present_from_tick(1)
            .token_from_tick(1, "abc");

        let extractor = AuthExtractor::new(TARGET_URL);
        assert!(extractor.is_present(&driver).await.unwrap());
        let err = extractor.extract(&driver).await.unwrap_err();

        assert!(matches!(err, Error::ExtractionFailed));
    }

    #[tokio::test]
    async fn test_unpopulated_token_is_pending() {
        let driver = FakeDriver::new()
            .present_from_tick(1)
            .with_cookies(vec![CookiePair::new("a", "1")]);

        let extractor = AuthExtractor::new(TARGET_URL);
        assert!(extractor.is_present(&driver).await.unwrap());
        let outcome = extractor.try_extract(&driver).await.unwrap();

        assert_eq!(outcome, Extraction::Pending);
    }
}
