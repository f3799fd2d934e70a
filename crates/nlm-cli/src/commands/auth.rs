use anyhow::Result;
use indicatif::ProgressBar;
use nlm_browser::{extract_auth, AuthConfig, AuthProgress, Stage};
use nlm_core::CredentialStore;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Renders extraction stages as status lines and the login wait as a
/// spinner, advanced once per poll tick.
struct CliProgress {
    spinner: Option<ProgressBar>,
}

impl CliProgress {
    fn new() -> Self {
        Self { spinner: None }
    }

    fn clear(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

impl AuthProgress for CliProgress {
    fn stage(&mut self, stage: Stage) {
        match stage {
            Stage::CopyingProfile => println!("📋 Copying profile data..."),
            Stage::LaunchingBrowser => println!("🚀 Launching Chrome..."),
            Stage::Navigating => println!("🌐 Opening NotebookLM..."),
            Stage::WaitingForLogin => {
                let spinner = ProgressBar::new_spinner();
                spinner.set_message("Waiting for authentication data...");
                self.spinner = Some(spinner);
            }
            Stage::Extracted => {
                self.clear();
                println!("🔍 Authentication data found");
            }
        }
    }

    fn poll_tick(&mut self, _tick: u32) {
        if let Some(spinner) = &self.spinner {
            spinner.tick();
        }
    }
}

pub fn execute(
    profile: String,
    debug: bool,
    output: Option<&Path>,
    no_save: bool,
    chrome_path: Option<PathBuf>,
) -> Result<()> {
    println!("🔐 Extracting NotebookLM authentication");
    println!("📂 Using Chrome profile: {}", profile);
    println!("🌐 Make sure you are logged into Google in that profile");
    println!("   (pick another profile with `nlm auth <PROFILE>` or NLM_BROWSER_PROFILE)");
    if debug {
        println!("🐛 Debug mode - the browser window will be visible");
    }

    let config = AuthConfig {
        profile: profile.clone(),
        debug,
        chrome_executable: chrome_path,
        ..AuthConfig::default()
    };
    tracing::debug!("Extraction config: {:?}", config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let mut progress = CliProgress::new();
    let result = runtime.block_on(extract_auth(&config, &mut progress));
    progress.clear();

    // Stop any blocking tasks left behind by the browser handler.
    runtime.shutdown_timeout(Duration::from_millis(100));

    let credentials = match result {
        Ok(credentials) => credentials,
        Err(e) => {
            println!("❌ Failed to extract authentication data");
            println!(
                "🔍 Check that Chrome profile '{}' is logged into Google",
                profile
            );
            return Err(e.into());
        }
    };

    println!("✅ Authentication extracted successfully");

    if !no_save {
        let store = CredentialStore::default_location()?;
        match store.save(&credentials, &profile) {
            Ok(()) => println!("📝 Credentials saved to {}", store.env_path().display()),
            Err(e) => println!("⚠️  Failed to save credentials: {}", e),
        }
    }

    let json = credentials.to_json()?;
    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))?;
            println!("📄 JSON written to {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}
