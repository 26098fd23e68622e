//! Warden CLI.
//!
//! Compile, inspect, and check declarative authorization policies.
//!
//! # Quick Start
//!
//! ```bash
//! # Write a starter warden.toml
//! warden init ./policies
//!
//! # List the compiled policies
//! warden --project ./policies policies
//!
//! # Ask whether a principal passes a policy
//! warden --project ./policies check reports --user ann --role analyst --claim dept=finance
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use warden_config::ConfigLoader;

/// Warden - declarative authorization policies, compiled.
#[derive(Parser)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project directory containing warden.toml.
    #[arg(short, long, global = true, default_value = ".")]
    pub project: PathBuf,

    /// Extra config file layered over every other source.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalArgs {
    /// Config loader for the selected project and file.
    pub fn loader(&self) -> ConfigLoader {
        let loader = ConfigLoader::new().with_project_dir(&self.project);
        match &self.config {
            Some(file) => loader.with_file(file),
            None => loader,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Write a starter warden.toml.
    Init {
        /// Directory to initialize.
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List the compiled policies.
    Policies,

    /// Check whether a principal passes a policy.
    Check {
        /// Policy name.
        policy: String,

        /// User identifier of the principal.
        #[arg(short, long)]
        user: Option<String>,

        /// Role held by the principal (repeatable).
        #[arg(short, long = "role")]
        roles: Vec<String>,

        /// Claim held by the principal, as type=value (repeatable).
        #[arg(long = "claim")]
        claims: Vec<String>,

        /// Treat the principal as unauthenticated.
        #[arg(long)]
        anonymous: bool,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the merged configuration.
    Show {
        /// Output format (text, toml, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate configuration files and the declared policy set.
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    style::set_no_color(cli.global.no_color);

    // RUST_LOG wins over the configured level
    let settings = cli.global.loader().load();
    let level = settings
        .as_ref()
        .map_or("warn", |config| config.logging.level.as_str());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = &settings {
        tracing::warn!(error = %format!("{e:#}"), "Configuration failed to load, using default log level");
    }

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Init { path } => commands::init::run(&path),
        Commands::Policies => commands::policies::run(&cli.global),
        Commands::Check {
            policy,
            user,
            roles,
            claims,
            anonymous,
        } => commands::check::run(
            &cli.global,
            &policy,
            &commands::check::PrincipalArgs {
                user,
                roles,
                claims,
                anonymous,
            },
        ),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { format } => commands::config::show(&cli.global, &format),
            ConfigCommands::Validate => commands::config::validate(&cli.global),
        },
    }
}
