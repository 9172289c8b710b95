// src/verify.rs

//! OpenPGP detached-signature verification
//!
//! Signatures are checked against the user's GnuPG keyring
//! (`~/.gnupg/pubring.kbx`, falling back to `~/.gnupg/pubring.gpg`) using
//! sequoia-openpgp. The `trust` operation imports the bundled official
//! signing key through the host's `gpg` so that the keyring the user
//! already maintains stays the single source of trust.

use crate::error::{Error, Result};
use sequoia_openpgp as openpgp;

use openpgp::cert::prelude::*;
use openpgp::parse::Parse;
use openpgp::policy::StandardPolicy;
use openpgp::{Packet, PacketPile};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// Official recipe-database signing key shipped with the engine.
const OFFICIAL_SIGNING_KEY: &[u8] = include_bytes!("../keys/zoi-signing.asc");

/// Identity of the key that produced a valid signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerIdentity {
    /// Primary user ID of the signing certificate, if any.
    pub name: String,
    pub fingerprint: String,
}

/// Locate the user's GnuPG public keyring.
fn keyring_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or(Error::NoKeyring)?;
    let gnupg = home.join(".gnupg");

    let kbx = gnupg.join("pubring.kbx");
    if kbx.exists() {
        return Ok(kbx);
    }
    let gpg = gnupg.join("pubring.gpg");
    if gpg.exists() {
        return Ok(gpg);
    }
    Err(Error::NoKeyring)
}

/// Verify a detached signature over `payload` against the user's keyring.
pub fn verify_detached(payload: &[u8], signature: &[u8]) -> Result<SignerIdentity> {
    let keyring = keyring_path()?;
    debug!("Loading keyring from {}", keyring.display());

    let keyring_data = fs::read(&keyring)?;
    let certs = parse_keyring(&keyring_data)?;
    if certs.is_empty() {
        return Err(Error::NoKeyring);
    }

    verify_with_certs(payload, signature, &certs)
}

/// Verify against an explicit certificate set. Split out so tests can
/// supply a keyring without touching `~/.gnupg`.
pub fn verify_with_certs(
    payload: &[u8],
    signature: &[u8],
    certs: &[Cert],
) -> Result<SignerIdentity> {
    let policy = StandardPolicy::new();

    let pile = PacketPile::from_bytes(signature)
        .map_err(|e| Error::SignatureInvalid(format!("failed to parse signature: {e}")))?;

    let mut saw_signature = false;
    for packet in pile.descendants() {
        let Packet::Signature(sig) = packet else {
            continue;
        };
        saw_signature = true;

        for cert in certs {
            for key in cert.keys().with_policy(&policy, None).for_signing() {
                let mut sig = sig.clone();
                if sig.verify_message(key.key(), payload).is_ok() {
                    let name = cert
                        .userids()
                        .next()
                        .map(|uid| String::from_utf8_lossy(uid.userid().value()).into_owned())
                        .unwrap_or_default();
                    info!("Signature verified by: {}", name);
                    return Ok(SignerIdentity {
                        name,
                        fingerprint: cert.fingerprint().to_string(),
                    });
                }
            }
        }
    }

    if !saw_signature {
        return Err(Error::SignatureInvalid(
            "no signature packet in signature data".to_string(),
        ));
    }
    Err(Error::UntrustedSigner)
}

/// Parse every certificate out of a keyring blob, skipping damaged ones.
pub fn parse_keyring(data: &[u8]) -> Result<Vec<Cert>> {
    let parser = CertParser::from_bytes(data)
        .map_err(|e| Error::SignatureInvalid(format!("failed to parse keyring: {e}")))?;

    let mut certs = Vec::new();
    for cert in parser {
        match cert {
            Ok(cert) => certs.push(cert),
            Err(e) => debug!("Skipping unparseable keyring entry: {}", e),
        }
    }
    Ok(certs)
}

/// Import the bundled official signing key into the user's GPG keyring.
///
/// Re-importing a known key is success: the command is idempotent.
pub fn import_official_key() -> Result<()> {
    let mut keyfile = tempfile::Builder::new()
        .prefix("zoi-signing-")
        .suffix(".asc")
        .tempfile()?;
    keyfile.write_all(OFFICIAL_SIGNING_KEY)?;
    keyfile.flush()?;

    let output = Command::new("gpg")
        .arg("--import")
        .arg(keyfile.path())
        .output()
        .map_err(|e| Error::Io(std::io::Error::other(format!("failed to run gpg: {e}"))))?;

    if output.status.success() {
        info!("Official signing key imported");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    // gpg exits zero on re-import of a known key, but be defensive about
    // wrappers that do not.
    if stderr.contains("not changed") || stderr.contains("already in keyring") {
        info!("Official signing key already present");
        return Ok(());
    }

    Err(Error::SignatureInvalid(format!(
        "gpg --import failed: {}",
        stderr.trim()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use openpgp::cert::CertBuilder;
    use openpgp::crypto::KeyPair;
    use openpgp::serialize::stream::{Message, Signer};
    use openpgp::serialize::SerializeInto;

    fn signing_cert() -> (Cert, KeyPair) {
        let (cert, _rev) = CertBuilder::new()
            .add_userid("Test Signer <signer@example.com>")
            .add_signing_subkey()
            .generate()
            .unwrap();
        let policy = StandardPolicy::new();
        let keypair = cert
            .keys()
            .unencrypted_secret()
            .with_policy(&policy, None)
            .for_signing()
            .next()
            .unwrap()
            .key()
            .clone()
            .into_keypair()
            .unwrap();
        (cert, keypair)
    }

    fn detached_signature(keypair: KeyPair, payload: &[u8]) -> Vec<u8> {
        let mut sink = Vec::new();
        let message = Message::new(&mut sink);
        let mut signer = Signer::new(message, keypair).detached().build().unwrap();
        signer.write_all(payload).unwrap();
        signer.finalize().unwrap();
        sink
    }

    #[test]
    fn test_valid_signature_verifies() {
        let (cert, keypair) = signing_cert();
        let payload = b"#!/bin/sh\necho install\n";
        let signature = detached_signature(keypair, payload);

        let identity = verify_with_certs(payload, &signature, &[cert]).unwrap();
        assert_eq!(identity.name, "Test Signer <signer@example.com>");
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let (cert, keypair) = signing_cert();
        let signature = detached_signature(keypair, b"original payload");

        let err = verify_with_certs(b"tampered payload", &signature, &[cert]).unwrap_err();
        assert!(matches!(err, Error::UntrustedSigner));
    }

    #[test]
    fn test_unknown_signer_rejected() {
        let (_signer_cert, keypair) = signing_cert();
        let (other_cert, _) = signing_cert();
        let payload = b"payload";
        let signature = detached_signature(keypair, payload);

        let err = verify_with_certs(payload, &signature, &[other_cert]).unwrap_err();
        assert!(matches!(err, Error::UntrustedSigner));
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let (cert, _) = signing_cert();
        let err = verify_with_certs(b"payload", b"not a signature", &[cert]).unwrap_err();
        assert!(matches!(err, Error::SignatureInvalid(_)));
    }

    #[test]
    fn test_bundled_key_parses() {
        let certs = parse_keyring(OFFICIAL_SIGNING_KEY).unwrap();
        assert_eq!(certs.len(), 1);
        assert!(certs[0].userids().next().is_some());
    }

    #[test]
    fn test_keyring_roundtrip() {
        let (cert, _) = signing_cert();
        let data = cert.armored().to_vec().unwrap();
        let certs = parse_keyring(&data).unwrap();
        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].fingerprint(), cert.fingerprint());
    }
}
