use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The requested algorithm is not usable with this key type
    #[error("Algorithm mismatch: {0}")]
    AlgorithmMismatch(&'static str),
    #[error(transparent)]
    JWK(#[from] jose_jwk::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    HmacKey(#[from] hmac::digest::InvalidLength),
    /// Invalid `crit` property in JWS header
    #[error("Invalid crit property in JWS header")]
    InvalidCriticalHeader,
    /// Unknown `crit` header name in JWS header
    #[error("Unknown critical header name in JWS header")]
    UnknownCriticalHeader,
    /// Invalid JWS
    #[error("Invalid JWS")]
    InvalidJWS,
    /// Signature did not verify
    #[error("Invalid signature")]
    InvalidSignature,
}
