//! The [`SecurityPolicy`] identifier and the [`CryptoProvider`] capability
//! interface the channel consumes. Concrete cryptography lives behind the
//! trait; this crate only ships the pass-through provider used for
//! unsecured channels.

use std::fmt;
use std::str::FromStr;

use uaserve_types::{EncodingResult, Error, StatusCode};

/// Base URI of the OPC UA security policies.
const SECURITY_POLICY_URI_BASE: &str = "http://opcfoundation.org/UA/SecurityPolicy#";

/// URI of the None security policy.
pub const SECURITY_POLICY_NONE_URI: &str = "http://opcfoundation.org/UA/SecurityPolicy#None";

/// Identifies a security policy by its URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityPolicy {
    /// Unrecognized policy.
    Unknown,
    /// No security.
    #[default]
    None,
    /// Basic256Sha256.
    Basic256Sha256,
    /// Aes128-Sha256-RsaOaep.
    Aes128Sha256RsaOaep,
    /// Aes256-Sha256-RsaPss.
    Aes256Sha256RsaPss,
}

impl fmt::Display for SecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SecurityPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_uri(s))
    }
}

impl SecurityPolicy {
    /// The short name of the policy.
    pub fn name(&self) -> &'static str {
        match self {
            SecurityPolicy::Unknown => "Unknown",
            SecurityPolicy::None => "None",
            SecurityPolicy::Basic256Sha256 => "Basic256Sha256",
            SecurityPolicy::Aes128Sha256RsaOaep => "Aes128-Sha256-RsaOaep",
            SecurityPolicy::Aes256Sha256RsaPss => "Aes256-Sha256-RsaPss",
        }
    }

    /// The URI of the policy. Panics on `Unknown`, which must never be
    /// written to the wire.
    pub fn to_uri(&self) -> &'static str {
        match self {
            SecurityPolicy::None => SECURITY_POLICY_NONE_URI,
            SecurityPolicy::Basic256Sha256 => {
                "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256"
            }
            SecurityPolicy::Aes128Sha256RsaOaep => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep"
            }
            SecurityPolicy::Aes256Sha256RsaPss => {
                "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss"
            }
            SecurityPolicy::Unknown => {
                panic!("Unknown security policy has no URI")
            }
        }
    }

    /// Parse a policy from its URI. Unrecognized URIs map to `Unknown`.
    pub fn from_uri(uri: &str) -> SecurityPolicy {
        match uri {
            SECURITY_POLICY_NONE_URI => SecurityPolicy::None,
            "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256" => {
                SecurityPolicy::Basic256Sha256
            }
            "http://opcfoundation.org/UA/SecurityPolicy#Aes128_Sha256_RsaOaep" => {
                SecurityPolicy::Aes128Sha256RsaOaep
            }
            "http://opcfoundation.org/UA/SecurityPolicy#Aes256_Sha256_RsaPss" => {
                SecurityPolicy::Aes256Sha256RsaPss
            }
            _ => {
                if uri.starts_with(SECURITY_POLICY_URI_BASE) {
                    log::warn!("Unsupported security policy {uri}");
                }
                SecurityPolicy::Unknown
            }
        }
    }

    /// The length of channel nonces under this policy.
    pub fn nonce_length(&self) -> usize {
        32
    }
}

/// The cryptographic capability a secure channel consumes. A real
/// implementation wraps certificates and keys; the [`NoSecurity`] provider
/// passes data through untouched.
///
/// Nonce generation goes through the provider so tests can install a
/// deterministic variant.
pub trait CryptoProvider: Send + Sync {
    /// Encrypt with the peer public key.
    fn asym_encrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>>;
    /// Decrypt with the own private key.
    fn asym_decrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>>;
    /// Sign with the own private key.
    fn asym_sign(&self, src: &[u8]) -> EncodingResult<Vec<u8>>;
    /// Verify a signature against the peer public key.
    fn asym_verify(&self, src: &[u8], signature: &[u8]) -> EncodingResult<()>;
    /// Encrypt with the derived symmetric keys.
    fn sym_encrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>>;
    /// Decrypt with the derived symmetric keys.
    fn sym_decrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>>;
    /// Sign with the derived symmetric keys.
    fn sym_sign(&self, src: &[u8]) -> EncodingResult<Vec<u8>>;
    /// Verify a symmetric signature.
    fn sym_verify(&self, src: &[u8], signature: &[u8]) -> EncodingResult<()>;
    /// Derive the symmetric keys from the exchanged nonces.
    fn derive_keys(&self, client_nonce: &[u8], server_nonce: &[u8]) -> EncodingResult<()>;
    /// Generate a nonce of the given length.
    fn generate_nonce(&self, len: usize) -> Vec<u8>;
    /// Size in bytes of signatures produced by this provider.
    fn signature_size(&self) -> usize;
    /// Plain text block size for encryption, 0 when not encrypting.
    fn plain_text_block_size(&self) -> usize;
    /// Minimum padding per encrypted block, 0 when not encrypting.
    fn min_padding(&self) -> usize;
}

/// Provider for [`SecurityPolicy::None`]: no signatures, no encryption,
/// random nonces.
#[derive(Debug, Default)]
pub struct NoSecurity;

impl CryptoProvider for NoSecurity {
    fn asym_encrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }

    fn asym_decrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }

    fn asym_sign(&self, _src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn asym_verify(&self, _src: &[u8], signature: &[u8]) -> EncodingResult<()> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(Error::new(
                StatusCode::BadSecurityChecksFailed,
                "Signature present on an unsecured channel",
            ))
        }
    }

    fn sym_encrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }

    fn sym_decrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }

    fn sym_sign(&self, _src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn sym_verify(&self, _src: &[u8], signature: &[u8]) -> EncodingResult<()> {
        if signature.is_empty() {
            Ok(())
        } else {
            Err(Error::new(
                StatusCode::BadSecurityChecksFailed,
                "Signature present on an unsecured channel",
            ))
        }
    }

    fn derive_keys(&self, _client_nonce: &[u8], _server_nonce: &[u8]) -> EncodingResult<()> {
        Ok(())
    }

    fn generate_nonce(&self, len: usize) -> Vec<u8> {
        use rand::RngCore;
        let mut nonce = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }

    fn signature_size(&self) -> usize {
        0
    }

    fn plain_text_block_size(&self) -> usize {
        0
    }

    fn min_padding(&self) -> usize {
        0
    }
}

#[cfg(test)]
/// Provider with a deterministic nonce sequence, for tests that need to
/// predict channel nonces.
pub struct DeterministicCrypto;

#[cfg(test)]
impl CryptoProvider for DeterministicCrypto {
    fn asym_encrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }
    fn asym_decrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }
    fn asym_sign(&self, _src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(Vec::new())
    }
    fn asym_verify(&self, _src: &[u8], _signature: &[u8]) -> EncodingResult<()> {
        Ok(())
    }
    fn sym_encrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }
    fn sym_decrypt(&self, src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(src.to_vec())
    }
    fn sym_sign(&self, _src: &[u8]) -> EncodingResult<Vec<u8>> {
        Ok(Vec::new())
    }
    fn sym_verify(&self, _src: &[u8], _signature: &[u8]) -> EncodingResult<()> {
        Ok(())
    }
    fn derive_keys(&self, _client_nonce: &[u8], _server_nonce: &[u8]) -> EncodingResult<()> {
        Ok(())
    }
    fn generate_nonce(&self, len: usize) -> Vec<u8> {
        (0..len).map(|i| i as u8).collect()
    }
    fn signature_size(&self) -> usize {
        0
    }
    fn plain_text_block_size(&self) -> usize {
        0
    }
    fn min_padding(&self) -> usize {
        0
    }
}
