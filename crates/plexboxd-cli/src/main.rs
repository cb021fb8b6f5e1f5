use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use commands::{compare, config, export};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "plexboxd")]
#[command(about = "Plexboxd - Export Plex watch history to Letterboxd-ready CSV")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Config file path (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export watch history to a Letterboxd-compatible CSV
    #[command(long_about = "Fetch movie watch history from the configured Plex server, normalize it, and write a CSV ready for Letterboxd import. Without an explicit start date the fetch resumes from the newest previous export in the export directory.")]
    Export {
        /// Write to this exact file instead of a generated filename
        #[arg(long, value_name = "FILE")]
        output_file: Option<PathBuf>,

        /// Export history for this user only (username or display name)
        #[arg(long)]
        user: Option<String>,

        /// Inclusive start date: YYYY-MM-DD or YYYY-MM-DD-HH-MM
        #[arg(long, value_name = "DATE")]
        from_date: Option<String>,

        /// Inclusive end date: YYYY-MM-DD or YYYY-MM-DD-HH-MM
        #[arg(long, value_name = "DATE")]
        to_date: Option<String>,

        /// Directory holding generated exports
        #[arg(long, value_name = "DIR")]
        export_dir: Option<PathBuf>,

        /// Replay the newest previous export instead of contacting Plex
        #[arg(long, action = ArgAction::SetTrue)]
        cached: bool,

        /// List server users and exit
        #[arg(long, action = ArgAction::SetTrue)]
        list_users: bool,

        /// Ignore previous exports when choosing the fetch window
        #[arg(long, action = ArgAction::SetTrue)]
        no_checkpoint: bool,
    },
    /// Compare library contents against watch history
    #[command(long_about = "Show which movies in the configured library have been watched and which have not, optionally scoped to one user.")]
    Compare {
        /// Compare for this user only (username or display name)
        #[arg(long)]
        user: Option<String>,
    },
    /// Configure credentials and settings
    #[command(long_about = "View the effective configuration or store Plex credentials. Running without a subcommand shows the configuration with secrets masked.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show full configuration including masked secrets
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure Plex (token-based authentication)
    #[command(long_about = "Store the Plex API token and optional server URL in the credentials file. You can find your token in your Plex account settings or by inspecting requests in Plex Web.")]
    Plex {
        /// Plex API Token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Plex Server URL (e.g. http://localhost:32400)
        #[arg(long)]
        server_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging(cli.verbose, cli.quiet).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Export {
            output_file,
            user,
            from_date,
            to_date,
            export_dir,
            cached,
            list_users,
            no_checkpoint,
        } => {
            let args = export::ExportArgs {
                output_file,
                user,
                from_date,
                to_date,
                export_dir,
                cached,
                list_users,
                no_checkpoint,
            };
            export::run_export(args, cli.config, &output).await
        }
        Commands::Compare { user } => compare::run_compare(user, cli.config, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, cli.config, &output).await
        }
    }
}
