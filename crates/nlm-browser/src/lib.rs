mod driver;
mod error;
mod extractor;
mod flow;
mod locator;
mod poller;
mod profile;
mod progress;
mod session;

pub use driver::{BrowserDriver, CookiePair};
pub use error::{Error, Result};
pub use extractor::{AuthExtractor, Extraction};
pub use flow::{extract_auth, AuthConfig};
pub use locator::{profile_dir, user_data_root, Platform};
pub use poller::AuthPoller;
pub use profile::{clone_profile, ScratchProfile, CREDENTIAL_FILES};
pub use progress::{AuthProgress, NoProgress, Stage};
pub use session::{CdpSession, LaunchOptions};

/// The application under automation. Fixed; not operator-configurable.
pub const TARGET_URL: &str = "https://notebooklm.google.com";
