// src/main.rs
//! Zoi Package Engine - CLI Entry Point

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use zoi::commands;
use zoi::forge::Provider;

// =============================================================================
// CLI Definitions
// =============================================================================

#[derive(Parser)]
#[command(name = "zoi")]
#[command(author = "Zoi Contributors")]
#[command(version)]
#[command(about = "Universal package manager driven by Git-hosted recipes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage packages
    #[command(subcommand)]
    Pkg(PkgCommands),
}

/// Forge provider hint, for repositories on self-hosted forges.
#[derive(Args, Default)]
struct ProviderFlags {
    /// Treat the URL as a GitHub-style repository
    #[arg(long)]
    github: bool,

    /// Treat the URL as a GitLab-style repository
    #[arg(long)]
    gitlab: bool,

    /// Treat the URL as a Gitea-style repository (e.g. Codeberg)
    #[arg(long)]
    gitea: bool,

    /// Treat the URL as a Forgejo-style repository
    #[arg(long)]
    forgejo: bool,
}

impl ProviderFlags {
    fn hint(&self) -> Option<Provider> {
        if self.github {
            Some(Provider::GitHub)
        } else if self.gitlab {
            Some(Provider::GitLab)
        } else if self.gitea {
            Some(Provider::Gitea)
        } else if self.forgejo {
            Some(Provider::Forgejo)
        } else {
            None
        }
    }
}

#[derive(Subcommand)]
enum PkgCommands {
    /// Sync the local package database from the remote endpoint
    #[command(visible_alias = "s")]
    Sync,

    /// Install a package from the database or a git repository URL
    #[command(visible_alias = "i")]
    Install {
        /// Package handle or repository URL
        target: String,

        /// Remove source code after building (source builds only)
        #[arg(short, long)]
        no_cache: bool,

        #[command(flatten)]
        provider: ProviderFlags,
    },

    /// Uninstall a package
    #[command(visible_aliases = ["ui", "remove", "rm"])]
    Uninstall {
        /// Package handle
        handle: String,
    },

    /// Update installed packages to their latest versions
    #[command(visible_aliases = ["u", "upgrade"])]
    Update {
        /// Package handle (updates all if omitted)
        handle: Option<String>,

        /// Remove source code after building (source builds only)
        #[arg(long)]
        no_cache: bool,
    },

    /// List all available packages in the local database
    #[command(visible_alias = "ls")]
    List {
        /// Only show installed packages
        #[arg(short = 'I', long)]
        installed: bool,
    },

    /// Search for packages by handle or description
    Search {
        /// Case-insensitive keyword
        keyword: String,
    },

    /// Display information about a package recipe
    #[command(visible_alias = "v")]
    View {
        /// Package handle or repository URL
        target: String,

        /// Remote database URL to fetch the recipe from
        endpoint: Option<String>,

        /// Print the raw zoi.yaml instead of a formatted summary
        #[arg(long)]
        raw: bool,

        #[command(flatten)]
        provider: ProviderFlags,
    },

    /// Import the official signing key used to verify packages
    Trust,

    /// Check for issues and clean up the package installation
    #[command(visible_alias = "doc")]
    Doctor,

    /// Clone a package's source code repository
    #[command(visible_alias = "c")]
    Clone {
        /// Package handle or repository URL
        target: String,

        #[command(flatten)]
        provider: ProviderFlags,
    },

    /// Build a package from source using its recipe
    #[command(visible_alias = "b")]
    Build {
        /// Package handle or repository URL
        target: String,

        /// Remove source code after building
        #[arg(short, long)]
        no_cache: bool,

        #[command(flatten)]
        provider: ProviderFlags,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let Commands::Pkg(command) = cli.command;
    match command {
        PkgCommands::Sync => commands::cmd_sync()?,

        PkgCommands::Install {
            target,
            no_cache,
            provider,
        } => commands::cmd_install(&target, no_cache, provider.hint())?,

        PkgCommands::Uninstall { handle } => commands::cmd_uninstall(&handle)?,

        PkgCommands::Update { handle, no_cache } => {
            commands::cmd_update(handle.as_deref(), no_cache)?
        }

        PkgCommands::List { installed } => commands::cmd_list(installed)?,

        PkgCommands::Search { keyword } => commands::cmd_search(&keyword)?,

        PkgCommands::View {
            target,
            endpoint,
            raw,
            provider,
        } => commands::cmd_view(&target, endpoint.as_deref(), raw, provider.hint())?,

        PkgCommands::Trust => commands::cmd_trust()?,

        PkgCommands::Doctor => commands::cmd_doctor()?,

        PkgCommands::Clone { target, provider } => {
            commands::cmd_clone(&target, provider.hint())?
        }

        PkgCommands::Build {
            target,
            no_cache,
            provider,
        } => commands::cmd_build(&target, no_cache, provider.hint())?,
    }

    Ok(())
}
