use crate::extractor::{AuthExtractor, Extraction};
use crate::{AuthProgress, BrowserDriver, Error, Result};
use nlm_core::AuthCredentials;
use std::time::Duration;
use tokio::time::{interval_at, timeout_at, Instant};

/// Poller state. `Polling` is the only non-terminal state.
#[derive(Debug)]
enum PollState {
    Polling,
    Found(AuthCredentials),
    TimedOut,
    Failed(Error),
}

/// Waits for the login-success signal by periodically probing the page
/// for the session global, with a bounded deadline.
pub struct AuthPoller {
    tick_interval: Duration,
    poll_deadline: Duration,
}

impl AuthPoller {
    pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);
    pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(30);

    pub fn new(tick_interval: Duration, poll_deadline: Duration) -> Self {
        Self {
            tick_interval,
            poll_deadline,
        }
    }

    /// Poll until the session global yields a complete credential pair,
    /// the deadline elapses (`AuthNotFound`, carrying the page's current
    /// URL), or a non-recoverable error surfaces.
    pub async fn wait_for_auth(
        &self,
        driver: &dyn BrowserDriver,
        extractor: &AuthExtractor,
        progress: &mut dyn AuthProgress,
    ) -> Result<AuthCredentials> {
        let deadline = Instant::now() + self.poll_deadline;
        let mut ticker = interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        let mut ticks = 0u32;
        let mut state = PollState::Polling;

        loop {
            match state {
                PollState::Polling => {
                    if timeout_at(deadline, ticker.tick()).await.is_err() {
                        state = PollState::TimedOut;
                        continue;
                    }
                    ticks += 1;
                    progress.poll_tick(ticks);
                    state = self.tick(driver, extractor).await;
                }
                PollState::Found(credentials) => return Ok(credentials),
                PollState::TimedOut => {
                    // The URL commonly shows a login or consent redirect,
                    // which tells the operator why the signal never came.
                    let url = driver.current_url().await.unwrap_or_default();
                    tracing::warn!("No authentication data after {} ticks (URL: {})", ticks, url);
                    return Err(Error::AuthNotFound { url });
                }
                PollState::Failed(err) => return Err(err),
            }
        }
    }

    async fn tick(&self, driver: &dyn BrowserDriver, extractor: &AuthExtractor) -> PollState {
        let present = match extractor.is_present(driver).await {
            Ok(present) => present,
            Err(Error::EvaluationFailed(reason)) => {
                // Script errors here usually mean the page is mid-load.
                tracing::debug!("Presence check failed, still polling: {}", reason);
                return PollState::Polling;
            }
            Err(err) => return PollState::Failed(err),
        };

        if !present {
            return PollState::Polling;
        }

        match extractor.try_extract(driver).await {
            Ok(Extraction::Ready(credentials)) => PollState::Found(credentials),
            Ok(Extraction::Pending) => PollState::Polling,
            Err(err) => PollState::Failed(err),
        }
    }
}

impl Default for AuthPoller {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK_INTERVAL, Self::DEFAULT_POLL_DEADLINE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;
    use crate::{CookiePair, NoProgress, TARGET_URL};

    fn extractor() -> AuthExtractor {
        AuthExtractor::new(TARGET_URL)
    }

    fn short_poller() -> AuthPoller {
        // 2 s ticks against a 7 s deadline: ticks at 2/4/6, expiry at 7.
        AuthPoller::new(Duration::from_secs(2), Duration::from_secs(7))
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_with_page_url_when_global_never_appears() {
        let driver = FakeDriver::new().with_url("https://accounts.google.com/v3/signin");

        let err = short_poller()
            .wait_for_auth(&driver, &extractor(), &mut NoProgress)
            .await
            .unwrap_err();

        match err {
            Error::AuthNotFound { url } => {
                assert_eq!(url, "https://accounts.google.com/v3/signin")
            }
            other => panic!("expected AuthNotFound, got {other:?}"),
        }
        assert_eq!(driver.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_token_to_hydrate_after_global_appears() {
        let driver = FakeDriver::new()
            .present_from_tick(2)
            .token_from_tick(4, "abc")
            .with_cookies(vec![CookiePair::new("a", "1"), CookiePair::new("b", "2")]);

        let start = Instant::now();
        let credentials = AuthPoller::default()
            .wait_for_auth(&driver, &extractor(), &mut NoProgress)
            .await
            .unwrap();

        assert_eq!(credentials.auth_token, "abc");
        assert_eq!(credentials.cookies, "a=1; b=2");
        // Result only after the fourth tick, not when the global appeared.
        assert_eq!(driver.ticks(), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_evaluation_errors_keep_polling() {
        let driver = FakeDriver::new()
            .transient_errors(2)
            .present_from_tick(3)
            .token_from_tick(3, "tok")
            .with_cookies(vec![CookiePair::new("SID", "x")]);

        let credentials = AuthPoller::default()
            .wait_for_auth(&driver, &extractor(), &mut NoProgress)
            .await
            .unwrap();

        assert_eq!(credentials.auth_token, "tok");
        assert_eq!(driver.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dead_session_stops_polling_immediately() {
        let driver = FakeDriver::new().fatal_at_tick(2).present_from_tick(10);

        let err = AuthPoller::default()
            .wait_for_auth(&driver, &extractor(), &mut NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SessionTimeout));
        assert_eq!(driver.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_without_cookies_is_terminal() {
        let driver = FakeDriver::new()
            .present_from_tick(1)
            .token_from_tick(1, "abc");

        let err = AuthPoller::default()
            .wait_for_auth(&driver, &extractor(), &mut NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ExtractionFailed));
        assert_eq!(driver.ticks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_receives_one_callback_per_tick() {
        struct CountingProgress(Vec<u32>);
        impl AuthProgress for CountingProgress {
            fn poll_tick(&mut self, tick: u32) {
                self.0.push(tick);
            }
        }

        let driver = FakeDriver::new();
        let mut progress = CountingProgress(Vec::new());

        let _ = short_poller()
            .wait_for_auth(&driver, &extractor(), &mut progress)
            .await;

        assert_eq!(progress.0, vec![1, 2, 3]);
    }
}
