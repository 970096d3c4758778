//! Randomness and binary-safe text encoding.
//!
//! Everything that lands in the key-value store is text, so keys, salts,
//! nonces and ciphertext all go through standard base64 (with padding).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{Error, Result};

/// Fill a fixed-size array from the operating system's CSPRNG
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Encode bytes as standard base64
pub fn to_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode standard base64 into a byte vector
pub fn from_base64(text: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(text.trim())?)
}

/// Decode standard base64 into an exact-length array
///
/// `what` names the field in the error message.
pub fn from_base64_array<const N: usize>(text: &str, what: &str) -> Result<[u8; N]> {
    let bytes = from_base64(text)?;
    bytes.as_slice().try_into().map_err(|_| {
        Error::DeserializationError(format!(
            "{} must be {} bytes, got {}",
            what,
            N,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_bytes_differ() {
        let a: [u8; 32] = random_bytes();
        let b: [u8; 32] = random_bytes();
        assert_ne!(a, b);
    }

    #[test]
    fn test_base64_known_value() {
        assert_eq!(to_base64(b"hotel"), "aG90ZWw=");
        assert_eq!(from_base64("aG90ZWw=").unwrap(), b"hotel");
    }

    #[test]
    fn test_base64_array_length_checked() {
        let text = to_base64(&[7u8; 12]);
        let nonce: [u8; 12] = from_base64_array(&text, "iv").unwrap();
        assert_eq!(nonce, [7u8; 12]);

        let err = from_base64_array::<16>(&text, "salt").unwrap_err();
        assert!(err.to_string().contains("salt must be 16 bytes"));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(from_base64("not*base64").is_err());
    }
}
