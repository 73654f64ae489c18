use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use lectern_cli::{ReportStyle, commands};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lectern")]
#[command(author, version, long_about = None)]
#[command(
    about = "Sign in to a course portal and play its lessons unattended",
    long_about = "Lectern signs in to an e-learning portal, opens the first courses on the course list \
                  and walks every lesson page: it starts the video, waits out the lesson length and \
                  advances until the course ends."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Progress output style
    #[arg(short, long, global = true, value_enum, default_value = "workflow")]
    style: ReportStyle,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and play every lesson of the first courses on the list
    Run {
        /// Portal account email
        #[arg(long, env = "EMAIL", hide_env_values = true)]
        email: Option<String>,

        /// Portal account password
        #[arg(long, env = "PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Path to the Chrome/Chromium binary
        #[arg(long, value_name = "PATH")]
        chrome_path: Option<PathBuf>,

        /// Show the browser window instead of running headless
        #[arg(long)]
        headed: bool,

        /// Named browser profile kept under ~/.lectern/profiles (temporary profile if omitted)
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,

        /// JSON file overriding portal URLs, selectors and timings
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Seconds added to every parsed lesson length
        #[arg(long, value_name = "SECS")]
        buffer_secs: Option<u64>,

        /// Seconds to wait when the lesson length cannot be read
        #[arg(long, value_name = "SECS")]
        fallback_secs: Option<u64>,

        /// Directory for failure screenshots
        #[arg(long, value_name = "DIR", default_value = "screenshots")]
        screenshot_dir: PathBuf,
    },

    /// Show how long lectern would wait for a lesson length label
    ParseDuration {
        /// Label text, e.g. "12:30" or "1h 05m"
        #[arg(value_name = "TEXT")]
        text: String,

        /// JSON config whose duration policy applies
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the effective portal configuration as JSON
    ShowConfig {
        /// JSON file to merge over the defaults
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    #[command(after_help = "SUPPORTED SHELLS:\n  bash, zsh, fish, powershell, elvish\n\n\
        INSTALLATION:\n  bash: lectern completion --shell bash >> ~/.bashrc\n  \
        zsh:  lectern completion --shell zsh > ~/.zfunc/_lectern\n  \
        fish: lectern completion --shell fish > ~/.config/fish/completions/lectern.fish")]
    Completion {
        /// Target shell
        #[arg(long, value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            email,
            password,
            chrome_path,
            headed,
            profile,
            config,
            buffer_secs,
            fallback_secs,
            screenshot_dir,
        } => commands::run::execute(commands::run::RunOptions {
            email,
            password,
            chrome_path,
            headed,
            profile,
            config,
            buffer_secs,
            fallback_secs,
            screenshot_dir,
            style: cli.style,
        }),
        Commands::ParseDuration { text, config } => {
            commands::parse_duration::execute(&text, config.as_deref())
        }
        Commands::ShowConfig { config } => commands::show_config::execute(config.as_deref()),
        Commands::Completion { shell } => commands::completion::execute(shell, &mut Cli::command()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("lectern=debug")
    } else {
        // Report lines already reach stdout through the reporter
        EnvFilter::new("lectern=warn,lectern::report=off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
