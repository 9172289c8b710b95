// src/install/script.rs

//! Signed-installer strategy
//!
//! Downloads the installer script and its detached signature, verifies the
//! signature against the user's keyring, and only then writes the script to
//! an executable temporary file and runs it through the platform shell.
//! Verification failure is fatal: an unverified script is never executed.
//!
//! The script owns its own on-disk layout; the engine does not create a
//! bin link for this strategy.

use super::InstallContext;
use crate::error::{Error, Result};
use crate::platform;
use crate::recipe::Recipe;
use crate::verify;
use std::io::Write;
use tracing::info;

pub fn install(ctx: &InstallContext<'_>, recipe: &Recipe) -> Result<()> {
    let installer_url = platform::expand_shell_ext(
        recipe.package.installer.as_deref().unwrap_or_default(),
    );
    let signature_url = platform::expand_shell_ext(
        recipe
            .package
            .installer_sig
            .as_deref()
            .ok_or_else(|| {
                Error::InvalidRecipe(format!(
                    "'{}' has an 'installer' url but no 'installer_sig'",
                    recipe.package.handle
                ))
            })?,
    );

    info!("Downloading installer from {}", installer_url);
    let script = ctx.client.get_bytes(&installer_url)?;
    info!("Downloading signature from {}", signature_url);
    let signature = ctx.client.get_bytes(&signature_url)?;

    let signer = verify::verify_detached(&script, &signature).map_err(|e| match e {
        Error::NoKeyring => Error::NoKeyring,
        other => Error::SignatureInvalid(format!(
            "installer script signature verification failed: {other}"
        )),
    })?;
    info!("Installer script signature verified by: {}", signer.name);

    // The temp file is only created once the signature checks out, and is
    // removed on every exit path when it drops.
    let mut file = tempfile::Builder::new()
        .prefix("zoi-installer-")
        .suffix(&format!(".{}", platform::shell_extension()))
        .tempfile()?;
    file.write_all(&script)?;
    file.flush()?;
    make_executable(file.path())?;

    info!("Executing verified installer script");
    let command = file.path().display().to_string();
    platform::run_command(&command)
}

#[cfg(unix)]
fn make_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
