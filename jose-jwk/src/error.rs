//! Error types for `jose-jwk`.
use base64::DecodeError as Base64Error;
use thiserror::Error;

/// Error type for `jose-jwk`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The key cannot be used for the requested operation
    #[error("Key mismatch: {0}")]
    KeyMismatch(&'static str),
    /// Key material below the minimum acceptable strength
    #[error("Key size too small")]
    KeySizeTooSmall,
    /// RSA key using multi-prime form (`oth`)
    #[error("RSA keys with additional prime info are not supported")]
    OtherPrimesNotSupported,
    /// A fixed-width field did not match the width required by its curve
    #[error("Invalid field size: expected {expected} bytes, found {actual}")]
    InvalidSize {
        /// Required byte width
        expected: usize,
        /// Byte width found in the key
        actual: usize,
    },
    /// EC or OKP key without a `crv` member
    #[error("key has no crv member")]
    MissingCurve,
    /// EC key without its `x`/`y` coordinates
    #[error("EC key has no public point")]
    MissingPoint,
    /// oct key without its `k` member
    #[error("symmetric key has no k member")]
    MissingKeyValue,
    /// RSA key without its `n` member
    #[error("RSA key has no modulus")]
    MissingModulus,
    /// RSA key without its `e` member
    #[error("RSA key has no public exponent")]
    MissingExponent,
    /// Named curve outside the supported set
    #[error("unsupported curve: {0}")]
    CurveNotImplemented(String),
    /// Error decoding Base64
    #[error(transparent)]
    Base64(#[from] Base64Error),
    /// Error from the `rsa` crate
    #[error(transparent)]
    Rsa(#[from] rsa::errors::Error),
    /// Errors from p256, p384, p521 and ed25519-dalek
    #[error(transparent)]
    CryptoErr(#[from] p256::ecdsa::Error),
    /// Error from the `elliptic-curve` crate
    #[error(transparent)]
    EC(#[from] p256::elliptic_curve::Error),
}
