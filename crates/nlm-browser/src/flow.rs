use crate::{
    clone_profile, locator, AuthExtractor, AuthPoller, AuthProgress, BrowserDriver, CdpSession,
    LaunchOptions, Platform, Result, ScratchProfile, Stage, TARGET_URL,
};
use nlm_core::AuthCredentials;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one extraction run, threaded explicitly through
/// every component instead of living in process-wide state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Chrome profile to read credentials from. Case-sensitive.
    pub profile: String,
    /// Show the browser window and enable verbose protocol logging.
    pub debug: bool,
    /// Explicit Chrome binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    pub session_timeout: Duration,
    pub tick_interval: Duration,
    pub poll_deadline: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            profile: "Default".to_string(),
            debug: false,
            chrome_executable: None,
            session_timeout: Duration::from_secs(60),
            tick_interval: AuthPoller::DEFAULT_TICK_INTERVAL,
            poll_deadline: AuthPoller::DEFAULT_POLL_DEADLINE,
        }
    }
}

/// Extract a NotebookLM session from a logged-in local Chrome profile.
///
/// Clones the profile's credential files into a scratch directory,
/// drives a Chrome instance bound to it, and polls the page until the
/// session global yields a token/cookie pair. The browser process and
/// the scratch directory are released on every exit path, including
/// timeouts.
///
/// Runs are isolated from each other, but two concurrent runs against
/// the *same* source profile race on its credential files and are
/// unsupported; callers must serialize per profile name.
pub async fn extract_auth(
    config: &AuthConfig,
    progress: &mut dyn AuthProgress,
) -> Result<AuthCredentials> {
    let platform = Platform::current()?;
    let profile_dir = locator::profile_dir(platform, &config.profile)?;
    tracing::debug!("Source profile directory: {}", profile_dir.display());

    let scratch = ScratchProfile::create()?;

    progress.stage(Stage::CopyingProfile);
    clone_profile(&profile_dir, &scratch)?;

    progress.stage(Stage::LaunchingBrowser);
    let mut session = CdpSession::launch(LaunchOptions {
        user_data_dir: scratch.path().to_path_buf(),
        headless: !config.debug,
        chrome_executable: config.chrome_executable.clone(),
        session_timeout: config.session_timeout,
    })
    .await?;

    let result = drive(&session, config, progress).await;

    // Shutdown happens before the error (if any) surfaces; the scratch
    // directory follows when it drops at the end of this scope.
    session.shutdown().await;

    if result.is_ok() {
        progress.stage(Stage::Extracted);
    }
    result
}

/// The in-session part of the flow, generic over the driver so it can
/// run against the in-memory fake.
pub(crate) async fn drive(
    driver: &dyn BrowserDriver,
    config: &AuthConfig,
    progress: &mut dyn AuthProgress,
) -> Result<AuthCredentials> {
    progress.stage(Stage::Navigating);
    driver.navigate(TARGET_URL).await?;

    progress.stage(Stage::WaitingForLogin);
    let extractor = AuthExtractor::new(TARGET_URL);
    let poller = AuthPoller::new(config.tick_interval, config.poll_deadline);
    poller.wait_for_auth(driver, &extractor, progress).await
}
