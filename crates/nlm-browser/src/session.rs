use crate::{BrowserDriver, CookiePair, Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::GetCookiesParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Flags matching what a manually launched Chrome looks like, minus
/// first-run UI, background throttling, and OS keyring prompts.
const LAUNCH_ARGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-gpu",
    "--disable-extensions",
    "--disable-sync",
    "--disable-popup-blocking",
    "--disable-hang-monitor",
    "--disable-ipc-flooding-protection",
    "--disable-prompt-on-repost",
    "--disable-renderer-backgrounding",
    "--force-color-profile=srgb",
    "--metrics-recording-only",
    "--safebrowsing-disable-auto-update",
    "--password-store=basic",
];

/// The document body must have rendered with nonzero extent, not merely
/// exist in the DOM.
const BODY_VISIBLE_SCRIPT: &str =
    "!!(document.body && document.body.getBoundingClientRect().height > 0)";

/// How one browser session is launched.
pub struct LaunchOptions {
    /// Scratch user-data directory the browser is bound to.
    pub user_data_dir: PathBuf,
    /// Headless unless running in debug mode.
    pub headless: bool,
    /// Explicit Chrome binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    /// Wall-clock bound on the whole session, launch to close.
    pub session_timeout: Duration,
}

/// One Chrome process plus one page, driven over the DevTools protocol.
///
/// Every operation is bounded by the session deadline; once it elapses,
/// all further calls fail with `SessionTimeout` so the owning flow can
/// tear the process down.
pub struct CdpSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    deadline: Instant,
}

impl CdpSession {
    /// Launch Chrome against the given user-data directory.
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&options.user_data_dir)
            .window_size(1280, 800);

        for arg in LAUNCH_ARGS {
            builder = builder.arg(*arg);
        }
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(Error::Browser)?;

        tracing::debug!(
            "Launching Chrome (headless: {}, user-data-dir: {})",
            options.headless,
            options.user_data_dir.display()
        );

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("Failed to launch Chrome: {}", e)))?;

        // The handler task must run for any CDP command to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let deadline = Instant::now() + options.session_timeout;

        let page = match timeout_at(deadline, browser.new_page("about:blank")).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                handler_task.abort();
                return Err(Error::Browser(format!("Failed to open page: {}", e)));
            }
            Err(_) => {
                handler_task.abort();
                return Err(Error::SessionTimeout);
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task,
            deadline,
        })
    }

    /// Terminate the browser process and stop the protocol handler. Safe
    /// to call after a failed operation; errors are logged, not returned.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser wait failed: {}", e);
        }
        self.handler_task.abort();
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        match timeout_at(self.deadline, operation).await {
            Ok(result) => result,
            Err(_) => Err(Error::SessionTimeout),
        }
    }
}

#[async_trait]
impl BrowserDriver for CdpSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.bounded(async {
            self.page
                .goto(url)
                .await
                .map_err(|e| Error::NavigationFailed(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| Error::NavigationFailed(e.to_string()))?;
            loop {
                let visible = match self.page.evaluate(BODY_VISIBLE_SCRIPT.to_string()).await {
                    Ok(result) => result.value().and_then(Value::as_bool).unwrap_or(false),
                    // Evaluation can fail mid-load; retry until the deadline.
                    Err(_) => false,
                };
                if visible {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
            Ok(())
        })
        .await
    }

    async fn evaluate(&self, script: &str) -> Result<Value> {
        self.bounded(async {
            let result = self
                .page
                .evaluate(script.to_string())
                .await
                .map_err(|e| Error::EvaluationFailed(e.to_string()))?;
            Ok(result.value().cloned().unwrap_or(Value::Null))
        })
        .await
    }

    async fn cookies_for(&self, url: &str) -> Result<Vec<CookiePair>> {
        self.bounded(async {
            let params = GetCookiesParams {
                urls: Some(vec![url.to_string()]),
                ..Default::default()
            };
            let response = self
                .page
                .execute(params)
                .await
                .map_err(|e| Error::Browser(format!("Cookie read failed: {}", e)))?;

            Ok(response
                .result
                .cookies
                .iter()
                .map(|c| CookiePair::new(c.name.clone(), c.value.clone()))
                .collect())
        })
        .await
    }

    async fn current_url(&self) -> Result<String> {
        self.bounded(async {
            let url = self
                .page
                .url()
                .await
                .map_err(|e| Error::Browser(e.to_string()))?;
            Ok(url.unwrap_or_default())
        })
        .await
    }

    async fn close(&mut self) -> Result<()> {
        self.shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args_harden_the_session() {
        assert!(LAUNCH_ARGS.contains(&"--no-first-run"));
        assert!(LAUNCH_ARGS.contains(&"--no-default-browser-check"));
        assert!(LAUNCH_ARGS.contains(&"--disable-extensions"));
        assert!(LAUNCH_ARGS.contains(&"--disable-popup-blocking"));
        assert!(LAUNCH_ARGS.contains(&"--password-store=basic"));
    }

    #[test]
    fn test_body_check_requires_rendered_extent() {
        assert!(BODY_VISIBLE_SCRIPT.contains("document.body"));
        assert!(BODY_VISIBLE_SCRIPT.contains("getBoundingClientRect().height > 0"));
    }

    // Launch/navigate behavior against a real Chrome is exercised by
    // running `nlm auth` manually; everything above the driver seam is
    // covered with the in-memory fake.
}
