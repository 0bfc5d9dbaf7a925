//! Server keys for the sending side of Web Push (RFC 8292).
//!
//! Subscribers only ever see the public half. `pushsub keys generate` mints a
//! pair, `pushsub keys check` confirms a private key belongs to the public
//! key subscribers are configured with, and `pushsub config set-key` refuses
//! keys that `subscribe` could not use.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use p256::elliptic_curve::rand_core::OsRng;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};

use crate::codec;

/// A P-256 key pair in the base64url text form servers and clients exchange.
pub struct VapidKeyPair {
    public_key: String,
    private_key: String,
}

impl std::fmt::Debug for VapidKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidKeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl VapidKeyPair {
    /// Mint a new pair from the OS RNG.
    pub fn generate() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let point = secret.public_key().to_encoded_point(false);

        Self {
            public_key: URL_SAFE_NO_PAD.encode(point.as_bytes()),
            private_key: URL_SAFE_NO_PAD.encode(secret.to_bytes()),
        }
    }

    /// Uncompressed SEC1 point, what subscribers pass as `applicationServerKey`.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Raw 32-byte scalar. Belongs on the sending server only.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }
}

/// Decode a configured server key exactly as `subscribe` will, and require
/// an uncompressed point on P-256.
pub fn decode_public_key(public_key: &str) -> Result<PublicKey> {
    let bytes = codec::base64_url_decode(public_key).context("Server key is not base64url")?;
    anyhow::ensure!(
        bytes.len() == 65 && bytes[0] == 0x04,
        "Server key must be a 65-byte uncompressed P-256 point, got {} bytes",
        bytes.len()
    );
    PublicKey::from_sec1_bytes(&bytes).context("Server key is not a point on P-256")
}

/// Check that `private_key` is the signing half of `public_key`.
pub fn check_pair(public_key: &str, private_key: &str) -> Result<()> {
    let public = decode_public_key(public_key)?;

    let scalar = codec::base64_url_decode(private_key).context("Private key is not base64url")?;
    anyhow::ensure!(
        scalar.len() == 32,
        "Private key must be a 32-byte P-256 scalar, got {} bytes",
        scalar.len()
    );
    let secret = SecretKey::from_bytes(scalar.as_slice().into())
        .context("Private key is not a valid P-256 scalar")?;

    anyhow::ensure!(
        secret.public_key() == public,
        "Private key does not belong to this server key"
    );
    Ok(())
}
