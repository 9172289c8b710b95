// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: source cache removal
fn no_cache_arg() -> Arg {
    Arg::new("no_cache")
        .short('n')
        .long("no-cache")
        .action(clap::ArgAction::SetTrue)
        .help("Remove source code after building")
}

/// Common arguments: forge provider hints
fn provider_args() -> Vec<Arg> {
    vec![
        Arg::new("github")
            .long("github")
            .action(clap::ArgAction::SetTrue)
            .help("Treat the URL as a GitHub-style repository"),
        Arg::new("gitlab")
            .long("gitlab")
            .action(clap::ArgAction::SetTrue)
            .help("Treat the URL as a GitLab-style repository"),
        Arg::new("gitea")
            .long("gitea")
            .action(clap::ArgAction::SetTrue)
            .help("Treat the URL as a Gitea-style repository"),
        Arg::new("forgejo")
            .long("forgejo")
            .action(clap::ArgAction::SetTrue)
            .help("Treat the URL as a Forgejo-style repository"),
    ]
}

fn build_cli() -> Command {
    Command::new("zoi")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Zoi Contributors")
        .about("Universal package manager driven by Git-hosted recipes")
        .subcommand(
            Command::new("pkg")
                .about("Manage packages")
                .subcommand(Command::new("sync").about("Sync the local package database"))
                .subcommand(
                    Command::new("install")
                        .about("Install a package from the database or a git repository URL")
                        .arg(Arg::new("target").required(true).help("Package handle or repository URL"))
                        .arg(no_cache_arg())
                        .args(provider_args()),
                )
                .subcommand(
                    Command::new("uninstall")
                        .about("Uninstall a package")
                        .arg(Arg::new("handle").required(true).help("Package handle")),
                )
                .subcommand(
                    Command::new("update")
                        .about("Update installed packages to their latest versions")
                        .arg(Arg::new("handle").help("Package handle (updates all if omitted)"))
                        .arg(no_cache_arg()),
                )
                .subcommand(
                    Command::new("list")
                        .about("List all available packages")
                        .arg(
                            Arg::new("installed")
                                .short('I')
                                .long("installed")
                                .action(clap::ArgAction::SetTrue)
                                .help("Only show installed packages"),
                        ),
                )
                .subcommand(
                    Command::new("search")
                        .about("Search for packages by handle or description")
                        .arg(Arg::new("keyword").required(true).help("Case-insensitive keyword")),
                )
                .subcommand(
                    Command::new("view")
                        .about("Display information about a package recipe")
                        .arg(Arg::new("target").required(true).help("Package handle or repository URL"))
                        .arg(Arg::new("endpoint").help("Remote database URL"))
                        .arg(
                            Arg::new("raw")
                                .long("raw")
                                .action(clap::ArgAction::SetTrue)
                                .help("Print the raw zoi.yaml"),
                        )
                        .args(provider_args()),
                )
                .subcommand(Command::new("trust").about("Import the official signing key"))
                .subcommand(Command::new("doctor").about("Check for issues and clean up"))
                .subcommand(
                    Command::new("clone")
                        .about("Clone a package's source code repository")
                        .arg(Arg::new("target").required(true).help("Package handle or repository URL"))
                        .args(provider_args()),
                )
                .subcommand(
                    Command::new("build")
                        .about("Build a package from source using its recipe")
                        .arg(Arg::new("target").required(true).help("Package handle or repository URL"))
                        .arg(no_cache_arg())
                        .args(provider_args()),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("zoi.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
