//! Base64 conversions for push key material.
//!
//! The server key arrives base64url-encoded without padding, while the
//! backend stores subscription keys in standard base64 with padding.

use base64::{
    alphabet,
    engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD as BASE64},
    DecodeError, Engine,
};

/// Standard alphabet decoder that, like `atob`, ignores non-zero trailing bits.
const FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode a URL-safe base64 server key into raw bytes.
///
/// Drops ASCII whitespace, pads with `=` to a multiple of 4, maps `-` to `+`
/// and `_` to `/`, then decodes with the standard alphabet. Callers check
/// for an empty key before calling this.
pub fn base64_url_decode(key: &str) -> Result<Vec<u8>, DecodeError> {
    let mut standard: String = key
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padding = (4 - standard.len() % 4) % 4;
    standard.extend(std::iter::repeat('=').take(padding));

    FORGIVING.decode(standard)
}

/// Encode key material as standard base64, or `""` when the key is absent.
pub fn base64_std_encode(buffer: Option<&[u8]>) -> String {
    buffer.map(|bytes| BASE64.encode(bytes)).unwrap_or_default()
}
