/// Stages an extraction run moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CopyingProfile,
    LaunchingBrowser,
    Navigating,
    WaitingForLogin,
    Extracted,
}

/// Incremental operator feedback. The CLI renders stages as status lines
/// and poll ticks as a rotating indicator; library consumers that do not
/// care pass [`NoProgress`].
pub trait AuthProgress: Send {
    fn stage(&mut self, stage: Stage) {
        let _ = stage;
    }

    /// Called once per poll tick while waiting for the login signal.
    fn poll_tick(&mut self, tick: u32) {
        let _ = tick;
    }
}

/// Progress sink that discards everything.
pub struct NoProgress;

impl AuthProgress for NoProgress {}
