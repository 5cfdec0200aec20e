mod history_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "swatchlog",
    about = "Bounded history of colour-theme search results"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List saved searches, oldest first
    List,
    /// Show the themes saved for a search
    Show {
        /// Request identifier as shown by `list`
        request_id: String,
        /// Print the stored colour columns instead of hex swatches
        #[arg(long)]
        raw: bool,
    },
    /// Save a JSON array of themes under a request identifier
    Save {
        request_id: String,
        /// Path to the JSON file
        file: PathBuf,
    },
    /// Print the effective history configuration
    Config,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("SWATCHLOG_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let exit_code = match &cli.command {
        Commands::List => history_cmd::cmd_list(),
        Commands::Show { request_id, raw } => history_cmd::cmd_show(request_id, *raw),
        Commands::Save { request_id, file } => history_cmd::cmd_save(request_id, file),
        Commands::Config => history_cmd::cmd_config(),
    };
    std::process::exit(exit_code);
}
