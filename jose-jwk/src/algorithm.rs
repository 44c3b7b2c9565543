use serde::{Deserialize, Serialize};

// RFC 7518 - JSON Web Algorithms (JWA)
// RFC 8037 - CFRG ECDH and Signatures in JOSE

/// Signature algorithm, RFC 7518 section 3 and RFC 8037.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// HMAC with SHA-2
    HS256,
    HS384,
    HS512,
    /// RSASSA-PKCS1-v1_5
    RS256,
    RS384,
    RS512,
    /// RSASSA-PSS, salt length equal to the digest size
    PS256,
    PS384,
    PS512,
    /// ECDSA over P-256, P-384 and P-521
    ES256,
    ES384,
    ES512,
    /// Ed25519
    EdDSA,
    /// No signature
    #[default]
    #[serde(rename = "none")]
    None,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::EdDSA => "EdDSA",
            Self::None => "none",
        }
    }
}

/// Key management algorithm, RFC 7518 section 4.
///
/// Recognized so that keys designated for encryption round-trip; no JWE
/// operations are implemented here.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Hash, Eq)]
pub enum EncryptionAlgorithm {
    #[serde(rename = "RSA1_5")]
    Rsa1_5,
    #[serde(rename = "RSA-OAEP")]
    RsaOaep,
    #[serde(rename = "RSA-OAEP-256")]
    RsaOaep256,
    A128KW,
    A192KW,
    A256KW,
    #[serde(rename = "dir")]
    Dir,
    #[serde(rename = "ECDH-ES")]
    EcdhEs,
    #[serde(rename = "ECDH-ES+A128KW")]
    EcdhEsA128Kw,
    #[serde(rename = "ECDH-ES+A192KW")]
    EcdhEsA192Kw,
    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256Kw,
    A128GCMKW,
    A192GCMKW,
    A256GCMKW,
    #[serde(rename = "PBES2-HS256+A128KW")]
    Pbes2Hs256A128Kw,
    #[serde(rename = "PBES2-HS384+A192KW")]
    Pbes2Hs384A192Kw,
    #[serde(rename = "PBES2-HS512+A256KW")]
    Pbes2Hs512A256Kw,
}

/// Value of the JWK `alg` member: either a signature algorithm or a key
/// management algorithm. Serialized untagged, as a bare identifier string.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Hash, Eq)]
#[serde(untagged)]
pub enum KeyAlgorithm {
    Signing(Algorithm),
    Encryption(EncryptionAlgorithm),
}

impl KeyAlgorithm {
    /// The signature algorithm, if this is one.
    pub fn as_signing(&self) -> Option<Algorithm> {
        match self {
            Self::Signing(alg) => Some(*alg),
            Self::Encryption(_) => None,
        }
    }
}

impl From<Algorithm> for KeyAlgorithm {
    fn from(alg: Algorithm) -> Self {
        Self::Signing(alg)
    }
}
