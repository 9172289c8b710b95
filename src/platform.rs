// src/platform.rs

//! Host platform facts and subprocess execution
//!
//! Centralizes everything the engine needs to know about the machine it is
//! running on: OS/architecture identifiers as they appear in recipe URL
//! templates, the platform shell, archive and script extensions, and the
//! host package manager used for delegated dependencies.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Shell used for command strings on this target.
#[cfg(windows)]
pub const SHELL: (&str, &str) = ("powershell", "-Command");
#[cfg(not(windows))]
pub const SHELL: (&str, &str) = ("sh", "-c");

/// Host OS identifier as used in `{os}` URL templates.
pub fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Host architecture identifier as used in `{arch}` URL templates.
pub fn arch_name() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    }
}

/// Archive extension for pre-built binary downloads on this platform.
pub fn archive_extension() -> &'static str {
    if cfg!(windows) {
        ".zip"
    } else {
        ".tar.xz"
    }
}

/// Script extension substituted for `{shellExt}`.
pub fn shell_extension() -> &'static str {
    if cfg!(windows) {
        "ps1"
    } else {
        "sh"
    }
}

/// Expand the recognized placeholders of a binary URL template.
///
/// `{version}`, `{os}`, `{arch}`, and `{ext}` are the complete set; any
/// other `{...}` token is left literal and will surface downstream as a
/// failed download.
pub fn expand_bin_template(template: &str, version: &str) -> String {
    template
        .replace("{version}", version)
        .replace("{os}", os_name())
        .replace("{arch}", arch_name())
        .replace("{ext}", archive_extension())
}

/// Expand `{shellExt}` in installer URLs and build commands.
pub fn expand_shell_ext(template: &str) -> String {
    template.replace("{shellExt}", shell_extension())
}

/// Run a command string through the platform shell, inheriting stdio.
pub fn run_command(command: &str) -> Result<()> {
    run_command_in(command, None)
}

/// Run a command string through the platform shell with an optional
/// working directory.
pub fn run_command_in(command: &str, cwd: Option<&Path>) -> Result<()> {
    debug!("Running shell command: {}", command);

    let mut cmd = Command::new(SHELL.0);
    cmd.arg(SHELL.1).arg(command);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let status = cmd
        .status()
        .map_err(|e| Error::Io(std::io::Error::other(format!("failed to spawn shell: {e}"))))?;

    if !status.success() {
        return Err(Error::BuildFailed(format!(
            "'{}' exited with {}",
            command,
            status
                .code()
                .map_or_else(|| "signal".to_string(), |c| c.to_string())
        )));
    }
    Ok(())
}

/// Check whether a command is resolvable on `PATH`.
pub fn command_exists(name: &str) -> bool {
    let probe = if cfg!(windows) {
        format!("Get-Command {name}")
    } else {
        format!("command -v {name}")
    };

    Command::new(SHELL.0)
        .arg(SHELL.1)
        .arg(&probe)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

/// Known host package managers a recipe dependency can delegate to.
pub const KNOWN_PACKAGE_MANAGERS: &[&str] =
    &["apt", "pacman", "brew", "scoop", "dnf", "yum", "apk", "zypper"];

/// Detect the host's native package manager.
///
/// Linux consults `/etc/os-release` for a known distribution family and
/// falls back to probing `PATH`; macOS and Windows map to `brew` and
/// `scoop` respectively. Returns `None` when nothing is found.
pub fn detect_host_package_manager() -> Option<String> {
    match std::env::consts::OS {
        "macos" => Some("brew".to_string()),
        "windows" => Some("scoop".to_string()),
        "linux" => detect_linux_package_manager(),
        _ => None,
    }
}

fn detect_linux_package_manager() -> Option<String> {
    let distro = linux_distro_id();

    let from_distro = match distro.as_deref() {
        Some("arch") | Some("manjaro") | Some("cachyos") => Some("pacman"),
        Some("debian") | Some("ubuntu") | Some("mint") | Some("pop") | Some("raspbian")
        | Some("kali") => Some("apt"),
        Some("alpine") => Some("apk"),
        Some("fedora") | Some("centos") | Some("rhel") | Some("almalinux") => Some("dnf"),
        Some("opensuse") | Some("opensuse-tumbleweed") | Some("opensuse-leap") => Some("zypper"),
        _ => None,
    };

    if let Some(pm) = from_distro {
        // Older Red Hat family systems ship yum without dnf.
        if pm == "dnf" && !command_exists("dnf") && command_exists("yum") {
            return Some("yum".to_string());
        }
        return Some(pm.to_string());
    }

    match &distro {
        Some(id) => info!(
            "Distribution '{}' not in the known list; probing for a package manager",
            id
        ),
        None => info!("Could not determine distribution ID; probing for a package manager"),
    }

    for pm in ["apt", "pacman", "yum", "dnf", "apk", "zypper"] {
        if command_exists(pm) {
            info!("Detected package manager: {}", pm);
            return Some(pm.to_string());
        }
    }
    None
}

/// The `ID=` field of `/etc/os-release`, unquoted.
fn linux_distro_id() -> Option<String> {
    let content = fs::read_to_string("/etc/os-release").ok()?;
    parse_os_release_id(&content)
}

fn parse_os_release_id(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix("ID="))
        .map(|id| id.trim_matches('"').to_string())
        .filter(|id| !id.is_empty())
}

/// Install a package through the host package manager.
///
/// Linux managers run under `sudo`; `brew` and `scoop` manage a
/// user-writable prefix and do not.
pub fn host_pm_install(pm: &str, package: &str) -> Result<()> {
    let command = match pm {
        "apt" => format!("sudo apt-get install -y {package}"),
        "pacman" => format!("sudo pacman -S --noconfirm {package}"),
        "dnf" => format!("sudo dnf install -y {package}"),
        "yum" => format!("sudo yum install -y {package}"),
        "apk" => format!("sudo apk add {package}"),
        "zypper" => format!("sudo zypper install -y {package}"),
        "brew" => format!("brew install {package}"),
        "scoop" => format!("scoop install {package}"),
        other => {
            return Err(Error::HostPmFailed {
                pm: other.to_string(),
                package: package.to_string(),
            })
        }
    };

    info!("Installing '{}' via {}", package, pm);
    run_command(&command).map_err(|_| Error::HostPmFailed {
        pm: pm.to_string(),
        package: package.to_string(),
    })
}
