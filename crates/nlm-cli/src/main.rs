use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "nlm")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "Extract NotebookLM authentication from a logged-in Chrome profile",
    long_about = "nlm extracts an authenticated NotebookLM session (auth token plus cookies) \
                  by cloning a local Chrome profile's credential files into a throwaway \
                  profile and driving a controlled Chrome instance against it. The result \
                  can be written to stdout, a file, and ~/.nlm/env for later API calls."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract auth token and cookies from a Chrome profile
    Auth {
        /// Chrome profile name to read credentials from
        #[arg(value_name = "PROFILE", env = "NLM_BROWSER_PROFILE", default_value = "Default")]
        profile: String,

        /// Show the browser window and enable verbose protocol logging
        #[arg(long)]
        debug: bool,

        /// Write the JSON result to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Do not save the credentials to ~/.nlm/env
        #[arg(long)]
        no_save: bool,

        /// Path to the Chrome binary (auto-detected by default)
        #[arg(long, value_name = "PATH")]
        chrome_path: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let debug = matches!(cli.command, Commands::Auth { debug: true, .. });
    init_logging(cli.verbose, debug);

    match cli.command {
        Commands::Auth {
            profile,
            debug,
            output,
            no_save,
            chrome_path,
        } => commands::auth::execute(profile, debug, output.as_deref(), no_save, chrome_path),
        Commands::Completions { shell } => {
            commands::completions::execute(shell, &mut Cli::command())
        }
    }
}

fn init_logging(verbose: bool, debug: bool) {
    use tracing_subscriber::EnvFilter;

    // Debug mode additionally surfaces protocol-level chatter from the
    // CDP handler and chromiumoxide itself.
    let filter = if debug {
        EnvFilter::new("nlm_cli=debug,nlm_core=debug,nlm_browser=debug,chromiumoxide=debug")
    } else if verbose {
        EnvFilter::new("nlm_cli=debug,nlm_core=debug,nlm_browser=debug")
    } else {
        EnvFilter::new("nlm_cli=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
