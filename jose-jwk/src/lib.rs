use num_bigint_dig::{BigUint, Sign};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub mod error;
pub use error::Error;

mod algorithm;
pub use algorithm::{Algorithm, EncryptionAlgorithm, KeyAlgorithm};

mod set;
pub use set::JWKSet;

// RFC 7517 - JSON Web Key (JWK)
// RFC 7518 - JSON Web Algorithms (JWA)
// RFC 7638 - JSON Web Key (JWK) Thumbprint
// RFC 8037 - CFRG ECDH and Signatures in JOSE

/// Byte string carried in JSON as base64url text.
///
/// Decoding tolerates padding; encoding never emits it, per RFC 7515
/// section 2. Doubles as the unsigned big-endian integer representation of
/// the JWK integer members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Zeroize)]
pub struct Base64urlBytes(pub Vec<u8>);

impl Base64urlBytes {
    pub fn from_base64url(text: &str) -> Result<Self, base64::DecodeError> {
        Ok(Self(base64::decode_config(text, base64::URL_SAFE)?))
    }

    pub fn to_base64url(&self) -> String {
        base64::encode_config(&self.0, base64::URL_SAFE_NO_PAD)
    }
}

impl Serialize for Base64urlBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base64url())
    }
}

impl<'de> Deserialize<'de> for Base64urlBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::from_base64url(&text).map_err(serde::de::Error::custom)
    }
}

/// A JSON Web Key, RFC 7517 section 4: key material plus optional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JWK {
    /// Key material, discriminated by the `kty` member.
    #[serde(flatten)]
    pub params: KeyParams,
    /// Intended use of the public key, `sig` or `enc`.
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Operations the key is meant for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    /// Algorithm the key is meant for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<KeyAlgorithm>,
    /// Key identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    /// URI of an X.509 certificate or chain for this key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5u: Option<String>,
    /// X.509 certificate chain, each entry base64 DER.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
    /// SHA-1 thumbprint of the leaf certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5t: Option<Base64urlBytes>,
    /// SHA-256 thumbprint of the leaf certificate.
    #[serde(rename = "x5t#S256", skip_serializing_if = "Option::is_none")]
    pub x5t_s256: Option<Base64urlBytes>,
}

/// Key material for the registered key types of RFC 7518 section 6 and
/// RFC 8037.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize)]
#[serde(tag = "kty")]
pub enum KeyParams {
    EC(ECParams),
    RSA(RSAParams),
    #[serde(rename = "oct")]
    Oct(OctParams),
    OKP(OkpParams),
}

/// Elliptic curve key members, RFC 7518 section 6.2. Coordinates and the
/// private scalar are fixed-width for their curve: 32 bytes on P-256, 48 on
/// P-384, 66 on P-521.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ECParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Base64urlBytes>,
    /// Private scalar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Base64urlBytes>,
}

/// RSA key members, RFC 7518 section 6.3. A private key may carry `d` alone
/// or `d` together with the five CRT members; `oth` holds any further
/// primes of a multi-prime key.
#[derive(
    Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize, ZeroizeOnDrop,
)]
pub struct RSAParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dp: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dq: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qi: Option<Base64urlBytes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oth: Option<Vec<OtherPrimeInfo>>,
}

/// Symmetric key member, RFC 7518 section 6.4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct OctParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub k: Option<Base64urlBytes>,
}

/// Octet key pair members, RFC 8037 section 2.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct OkpParams {
    pub crv: String,
    /// Public key bytes.
    pub x: Base64urlBytes,
    /// Private key: the seed for Ed25519, the scalar for X25519.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Base64urlBytes>,
}

/// One entry of the RSA `oth` array, RFC 7518 section 6.3.2.7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct OtherPrimeInfo {
    pub r: Base64urlBytes,
    pub d: Base64urlBytes,
    pub t: Base64urlBytes,
}

/// Parameters for generating a key with [`JWK::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyGenParam {
    /// ECDSA keypair on the named curve (`P-256`, `P-384` or `P-521`).
    Ec { curve: String },
    /// RSA keypair with the given modulus length in bytes and e = 65537.
    Rsa { modulus_bytes: usize },
    /// Symmetric key of the given length in bytes.
    Oct { length: usize },
    /// Octet key pair on the named curve (`Ed25519` or `X25519`).
    Okp { curve: String },
}

/// Coordinate width in bytes for a named EC curve. The same width applies to
/// the private scalar `d`.
fn ec_coordinate_size(curve: &str) -> Option<usize> {
    match curve {
        "P-256" => Some(32),
        "P-384" => Some(48),
        "P-521" => Some(66),
        _ => None,
    }
}

fn check_size(expected: usize, value: &Base64urlBytes) -> Result<(), Error> {
    if value.0.len() != expected {
        return Err(Error::InvalidSize {
            expected,
            actual: value.0.len(),
        });
    }
    Ok(())
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    const ZERO: [u8; 1] = [0];
    match bytes.iter().position(|&byte| byte != 0) {
        Some(i) => &bytes[i..],
        None => &ZERO,
    }
}

impl KeyParams {
    /// Key material with every secret member removed. Symmetric keys have no
    /// shareable half, so `Oct` projects to `None`.
    pub fn to_public(&self) -> Option<Self> {
        match self {
            Self::EC(ec) => Some(Self::EC(ECParams {
                crv: ec.crv.clone(),
                x: ec.x.clone(),
                y: ec.y.clone(),
                d: None,
            })),
            Self::RSA(rsa) => {
                let mut public = RSAParams::default();
                public.n = rsa.n.clone();
                public.e = rsa.e.clone();
                Some(Self::RSA(public))
            }
            Self::Oct(_) => None,
            Self::OKP(okp) => Some(Self::OKP(OkpParams {
                crv: okp.crv.clone(),
                x: okp.x.clone(),
                d: None,
            })),
        }
    }

    /// The members hashed for an RFC 7638 thumbprint, as (name, JSON text)
    /// pairs in lexicographic order of name.
    fn thumbprint_members(&self) -> Result<Vec<(&'static str, String)>, Error> {
        let mut members = match self {
            Self::EC(ec) => {
                let crv = ec.crv.clone().ok_or(Error::MissingCurve)?;
                let x = ec.x.as_ref().ok_or(Error::MissingPoint)?;
                let y = ec.y.as_ref().ok_or(Error::MissingPoint)?;
                vec![
                    ("kty", "EC".to_string()),
                    ("crv", crv),
                    ("x", x.to_base64url()),
                    ("y", y.to_base64url()),
                ]
            }
            Self::RSA(rsa) => {
                let n = rsa.n.as_ref().ok_or(Error::MissingModulus)?;
                let e = rsa.e.as_ref().ok_or(Error::MissingExponent)?;
                vec![
                    ("kty", "RSA".to_string()),
                    ("n", n.to_base64url()),
                    ("e", e.to_base64url()),
                ]
            }
            Self::Oct(oct) => {
                let k = oct.k.as_ref().ok_or(Error::MissingKeyValue)?;
                vec![("kty", "oct".to_string()), ("k", k.to_base64url())]
            }
            Self::OKP(okp) => vec![
                ("kty", "OKP".to_string()),
                ("crv", okp.crv.clone()),
                ("x", okp.x.to_base64url()),
            ],
        };
        members.sort_unstable_by_key(|&(name, _)| name);
        Ok(members)
    }

    /// Strongest signature algorithm this material admits.
    pub fn best_jws_alg(&self) -> Result<Algorithm, Error> {
        match self {
            Self::RSA(rsa) => {
                rsa.validate_modulus_size()?;
                Ok(Algorithm::PS512)
            }
            Self::EC(ec) => match ec.crv.as_deref() {
                Some("P-256") => Ok(Algorithm::ES256),
                Some("P-384") => Ok(Algorithm::ES384),
                Some("P-521") => Ok(Algorithm::ES512),
                Some(other) => Err(Error::CurveNotImplemented(other.to_string())),
                None => Err(Error::MissingCurve),
            },
            Self::Oct(oct) => {
                let k = oct.k.as_ref().ok_or(Error::MissingKeyValue)?;
                match k.0.len() {
                    len if len >= 64 => Ok(Algorithm::HS512),
                    len if len >= 48 => Ok(Algorithm::HS384),
                    len if len >= 32 => Ok(Algorithm::HS256),
                    _ => Err(Error::KeySizeTooSmall),
                }
            }
            Self::OKP(okp) => match okp.crv.as_str() {
                "Ed25519" => Ok(Algorithm::EdDSA),
                "X25519" => Err(Error::KeyMismatch("cannot sign with ECDH key")),
                other => Err(Error::CurveNotImplemented(other.to_string())),
            },
        }
    }

    /// Acceptable-key rules usable across any JOSE algorithm, with
    /// structural checks on EC points and the RSA public exponent.
    pub fn check(&self) -> Result<(), Error> {
        match self {
            Self::EC(ec) => {
                let crv = ec.crv.as_deref().ok_or(Error::MissingCurve)?;
                match crv {
                    "P-256" => {
                        p256::PublicKey::try_from(ec)?;
                    }
                    "P-384" => {
                        p384::PublicKey::try_from(ec)?;
                    }
                    "P-521" => {
                        p521::PublicKey::try_from(ec)?;
                    }
                    other => return Err(Error::CurveNotImplemented(other.to_string())),
                }
                if let (Some(d), Some(size)) = (&ec.d, ec_coordinate_size(crv)) {
                    check_size(size, d)?;
                }
                Ok(())
            }
            Self::RSA(rsa) => {
                rsa.validate_modulus_size()?;
                let e = rsa.e.as_ref().ok_or(Error::MissingExponent)?;
                let magnitude = trim_leading_zeros(&e.0);
                if magnitude.last().map_or(true, |byte| byte & 1 == 0) {
                    return Err(Error::KeyMismatch("RSA public exponent must be odd"));
                }
                if magnitude == [1] {
                    return Err(Error::KeyMismatch(
                        "RSA public exponent must be greater than 1",
                    ));
                }
                Ok(())
            }
            Self::Oct(oct) => {
                let k = oct.k.as_ref().ok_or(Error::MissingKeyValue)?;
                if k.0.len() < 32 {
                    return Err(Error::KeySizeTooSmall);
                }
                Ok(())
            }
            Self::OKP(okp) => {
                // Only the curve25519 pair has a fixed width to enforce;
                // other CFRG curves are carried opaquely.
                if matches!(okp.crv.as_str(), "Ed25519" | "X25519") {
                    check_size(32, &okp.x)?;
                    if let Some(d) = &okp.d {
                        check_size(32, d)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl JWK {
    pub fn generate(param: &KeyGenParam) -> Result<JWK, Error> {
        match param {
            KeyGenParam::Ec { curve } => match curve.as_str() {
                "P-256" => Self::generate_p256(),
                "P-384" => Self::generate_p384(),
                "P-521" => Self::generate_p521(),
                other => Err(Error::CurveNotImplemented(other.to_string())),
            },
            KeyGenParam::Rsa { modulus_bytes } => Self::generate_rsa(*modulus_bytes),
            KeyGenParam::Oct { length } => Ok(Self::generate_oct(*length)),
            KeyGenParam::Okp { curve } => match curve.as_str() {
                "Ed25519" => Self::generate_ed25519(),
                "X25519" => Self::generate_x25519(),
                other => Err(Error::CurveNotImplemented(other.to_string())),
            },
        }
    }

    pub fn generate_p256() -> Result<JWK, Error> {
        let mut rng = rand::rngs::OsRng {};
        loop {
            let secret_key = p256::SecretKey::random(&mut rng);
            match ECParams::try_from(&secret_key) {
                Ok(params) => return Ok(JWK::from(KeyParams::EC(params))),
                // The identity element has no affine coordinates; draw again.
                Err(Error::MissingPoint) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    pub fn generate_p384() -> Result<JWK, Error> {
        let mut rng = rand::rngs::OsRng {};
        loop {
            let secret_key = p384::SecretKey::random(&mut rng);
            match ECParams::try_from(&secret_key) {
                Ok(params) => return Ok(JWK::from(KeyParams::EC(params))),
                Err(Error::MissingPoint) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    pub fn generate_p521() -> Result<JWK, Error> {
        let mut rng = rand::rngs::OsRng {};
        loop {
            let secret_key = p521::SecretKey::random(&mut rng);
            match ECParams::try_from(&secret_key) {
                Ok(params) => return Ok(JWK::from(KeyParams::EC(params))),
                Err(Error::MissingPoint) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    pub fn generate_ed25519() -> Result<JWK, Error> {
        let mut csprng = rand::rngs::OsRng {};
        let secret = ed25519_dalek::SigningKey::generate(&mut csprng);
        let public = secret.verifying_key();
        Ok(JWK::from(KeyParams::OKP(OkpParams {
            crv: "Ed25519".to_string(),
            x: Base64urlBytes(public.as_bytes().to_vec()),
            d: Some(Base64urlBytes(secret.to_bytes().to_vec())),
        })))
    }

    pub fn generate_x25519() -> Result<JWK, Error> {
        let secret = x25519_dalek::StaticSecret::random_from_rng(rand::rngs::OsRng);
        let public = x25519_dalek::PublicKey::from(&secret);
        Ok(JWK::from(KeyParams::OKP(OkpParams {
            crv: "X25519".to_string(),
            x: Base64urlBytes(public.as_bytes().to_vec()),
            d: Some(Base64urlBytes(secret.to_bytes().to_vec())),
        })))
    }

    pub fn generate_rsa(modulus_bytes: usize) -> Result<JWK, Error> {
        let mut rng = rand::rngs::OsRng {};
        let private_key = rsa::RsaPrivateKey::new(&mut rng, modulus_bytes * 8)?;
        let params = RSAParams::try_from(&private_key)?;
        Ok(JWK::from(KeyParams::RSA(params)))
    }

    pub fn generate_oct(length: usize) -> JWK {
        use rand::RngCore;
        let mut key = vec![0u8; length];
        rand::rngs::OsRng.fill_bytes(&mut key);
        JWK::from(KeyParams::Oct(OctParams {
            k: Some(Base64urlBytes(key)),
        }))
    }

    /// Strongest signature algorithm the key material admits. The key's own
    /// `alg` member is not consulted.
    pub fn best_jws_alg(&self) -> Result<Algorithm, Error> {
        self.params.best_jws_alg()
    }

    /// Acceptable-key rules usable across any JOSE algorithm, with
    /// structural checks on EC points and the RSA public exponent.
    pub fn check(&self) -> Result<(), Error> {
        self.params.check()
    }

    /// The key with secret members removed and metadata kept. `None` for
    /// symmetric keys, which have no public half.
    pub fn to_public(&self) -> Option<Self> {
        let params = self.params.to_public()?;
        let mut key = self.clone();
        key.params = params;
        Some(key)
    }

    /// Whether two keys share their public components, which is exactly the
    /// RFC 7638 thumbprint subset. Keys missing required members compare
    /// unequal to everything.
    pub fn equals_public(&self, other: &JWK) -> bool {
        match (
            self.params.thumbprint_members(),
            other.params.thumbprint_members(),
        ) {
            (Ok(mine), Ok(theirs)) => mine == theirs,
            _ => false,
        }
    }

    /// RFC 7638 thumbprint under a caller-chosen digest, as raw bytes.
    ///
    /// The hash input is written by a dedicated emitter: the required
    /// members only, lexicographic, no whitespace. The generic JSON
    /// serializer guarantees neither ordering nor byte layout, so it is
    /// never used here.
    pub fn thumbprint_bytes<D: Digest>(&self) -> Result<Vec<u8>, Error> {
        let members = self.params.thumbprint_members()?;
        let mut json = String::from("{");
        for (i, (name, value)) in members.iter().enumerate() {
            if i > 0 {
                json.push(',');
            }
            json.push('"');
            json.push_str(name);
            json.push_str("\":\"");
            json.push_str(value);
            json.push('"');
        }
        json.push('}');
        Ok(D::digest(json.as_bytes()).to_vec())
    }

    /// RFC 7638 SHA-256 thumbprint in base64url form, the usual `kid`
    /// derivation.
    pub fn thumbprint(&self) -> Result<String, Error> {
        let hash = self.thumbprint_bytes::<sha2::Sha256>()?;
        Ok(base64::encode_config(hash, base64::URL_SAFE_NO_PAD))
    }
}

impl From<KeyParams> for JWK {
    fn from(params: KeyParams) -> Self {
        Self {
            params,
            key_use: None,
            key_ops: None,
            alg: None,
            kid: None,
            x5u: None,
            x5c: None,
            x5t: None,
            x5t_s256: None,
        }
    }
}

impl RSAParams {
    /// Require a modulus of at least 2048 bits, per
    /// [RFC 7518 section 3.3](https://www.rfc-editor.org/rfc/rfc7518#section-3.3).
    pub fn validate_modulus_size(&self) -> Result<(), Error> {
        let n = self.n.as_ref().ok_or(Error::MissingModulus)?;
        if trim_leading_zeros(&n.0).len() < 256 {
            return Err(Error::KeySizeTooSmall);
        }
        Ok(())
    }
}

impl From<&Base64urlBytes> for BigUint {
    fn from(bytes: &Base64urlBytes) -> Self {
        Self::from_bytes_be(&bytes.0)
    }
}

impl TryFrom<&RSAParams> for rsa::RsaPublicKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        let n = params.n.as_ref().ok_or(Error::MissingModulus)?;
        let e = params.e.as_ref().ok_or(Error::MissingExponent)?;
        Ok(Self::new(n.into(), e.into())?)
    }
}

impl TryFrom<&RSAParams> for rsa::RsaPrivateKey {
    type Error = Error;
    fn try_from(params: &RSAParams) -> Result<Self, Self::Error> {
        if params.oth.is_some() {
            return Err(Error::OtherPrimesNotSupported);
        }
        let n = params.n.as_ref().ok_or(Error::MissingModulus)?;
        let e = params.e.as_ref().ok_or(Error::MissingExponent)?;
        let d = params
            .d
            .as_ref()
            .ok_or(Error::KeyMismatch("missing RSA private exponent"))?;
        let crt_present = [
            params.p.is_some(),
            params.q.is_some(),
            params.dp.is_some(),
            params.dq.is_some(),
            params.qi.is_some(),
        ];
        let primes = if crt_present.iter().all(|&present| present) {
            vec![
                params.p.as_ref().map(BigUint::from),
                params.q.as_ref().map(BigUint::from),
            ]
            .into_iter()
            .flatten()
            .collect()
        } else if crt_present.iter().all(|&present| !present) {
            // Only (n, e, d) given: the factors are recovered on construction.
            Vec::new()
        } else {
            return Err(Error::KeyMismatch("incomplete RSA CRT parameters"));
        };
        Ok(Self::from_components(n.into(), e.into(), d.into(), primes)?)
    }
}

impl TryFrom<&rsa::RsaPrivateKey> for RSAParams {
    type Error = Error;
    fn try_from(key: &rsa::RsaPrivateKey) -> Result<Self, Self::Error> {
        use rsa::traits::{PrivateKeyParts, PublicKeyParts};
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(Error::OtherPrimesNotSupported);
        }
        // The CRT values are precomputed on construction
        let dp = key
            .dp()
            .ok_or(Error::KeyMismatch("RSA CRT exponents are unavailable"))?;
        let dq = key
            .dq()
            .ok_or(Error::KeyMismatch("RSA CRT exponents are unavailable"))?;
        let (sign, qi) = key
            .qinv()
            .ok_or(Error::KeyMismatch("RSA CRT coefficient is unavailable"))?
            .to_bytes_be();
        if sign != Sign::Plus {
            return Err(Error::KeyMismatch("expected positive RSA CRT coefficient"));
        }
        Ok(RSAParams {
            n: Some(Base64urlBytes(key.n().to_bytes_be())),
            e: Some(Base64urlBytes(key.e().to_bytes_be())),
            d: Some(Base64urlBytes(key.d().to_bytes_be())),
            p: Some(Base64urlBytes(primes[0].to_bytes_be())),
            q: Some(Base64urlBytes(primes[1].to_bytes_be())),
            dp: Some(Base64urlBytes(dp.to_bytes_be())),
            dq: Some(Base64urlBytes(dq.to_bytes_be())),
            qi: Some(Base64urlBytes(qi)),
            oth: None,
        })
    }
}

impl OkpParams {
    fn expect_ed25519(&self) -> Result<(), Error> {
        if self.crv == "Ed25519" {
            Ok(())
        } else {
            Err(Error::CurveNotImplemented(self.crv.clone()))
        }
    }
}

impl TryFrom<&OkpParams> for ed25519_dalek::VerifyingKey {
    type Error = Error;
    fn try_from(params: &OkpParams) -> Result<Self, Self::Error> {
        params.expect_ed25519()?;
        check_size(32, &params.x)?;
        Ok(Self::try_from(params.x.0.as_slice())?)
    }
}

impl TryFrom<&OkpParams> for ed25519_dalek::SigningKey {
    type Error = Error;
    fn try_from(params: &OkpParams) -> Result<Self, Self::Error> {
        params.expect_ed25519()?;
        let d = params
            .d
            .as_ref()
            .ok_or(Error::KeyMismatch("missing OKP private key member"))?;
        check_size(32, d)?;
        Ok(Self::try_from(d.0.as_slice())?)
    }
}

impl ECParams {
    fn expect_curve(&self, name: &str) -> Result<(), Error> {
        match self.crv.as_deref() {
            Some(crv) if crv == name => Ok(()),
            Some(_) => Err(Error::KeyMismatch("key is on a different curve")),
            None => Err(Error::MissingCurve),
        }
    }

    /// Width-checked affine coordinates.
    fn point(&self, curve: &str, size: usize) -> Result<(&[u8], &[u8]), Error> {
        self.expect_curve(curve)?;
        let x = self.x.as_ref().ok_or(Error::MissingPoint)?;
        let y = self.y.as_ref().ok_or(Error::MissingPoint)?;
        check_size(size, x)?;
        check_size(size, y)?;
        Ok((&x.0, &y.0))
    }

    /// Width-checked private scalar.
    fn scalar(&self, curve: &str, size: usize) -> Result<&[u8], Error> {
        self.expect_curve(curve)?;
        let d = self
            .d
            .as_ref()
            .ok_or(Error::KeyMismatch("missing EC private key member"))?;
        check_size(size, d)?;
        Ok(&d.0)
    }
}

// Conversions between ECParams and the backend key types, one instantiation
// per supported curve. SEC1 parsing rejects points that are not on the
// curve.
macro_rules! ec_curve_conversions {
    ($curve:ident, $name:literal, $size:expr) => {
        impl TryFrom<&ECParams> for $curve::PublicKey {
            type Error = Error;
            fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
                let (x, y) = params.point($name, $size)?;
                let mut sec1 = Vec::with_capacity(1 + 2 * $size);
                sec1.push(0x04);
                sec1.extend_from_slice(x);
                sec1.extend_from_slice(y);
                Ok($curve::PublicKey::from_sec1_bytes(&sec1)?)
            }
        }

        impl TryFrom<&ECParams> for $curve::SecretKey {
            type Error = Error;
            fn try_from(params: &ECParams) -> Result<Self, Self::Error> {
                let d = params.scalar($name, $size)?;
                Ok($curve::SecretKey::from_bytes(d.into())?)
            }
        }

        impl TryFrom<&$curve::PublicKey> for ECParams {
            type Error = Error;
            fn try_from(pk: &$curve::PublicKey) -> Result<Self, Self::Error> {
                use $curve::elliptic_curve::sec1::ToEncodedPoint;
                let point = pk.to_encoded_point(false);
                match (point.x(), point.y()) {
                    (Some(x), Some(y)) => Ok(ECParams {
                        crv: Some($name.to_string()),
                        x: Some(Base64urlBytes(x.to_vec())),
                        y: Some(Base64urlBytes(y.to_vec())),
                        d: None,
                    }),
                    _ => Err(Error::MissingPoint),
                }
            }
        }

        impl TryFrom<&$curve::SecretKey> for ECParams {
            type Error = Error;
            fn try_from(sk: &$curve::SecretKey) -> Result<Self, Self::Error> {
                let mut params = ECParams::try_from(&sk.public_key())?;
                params.d = Some(Base64urlBytes(sk.to_bytes().to_vec()));
                Ok(params)
            }
        }
    };
}

ec_curve_conversions!(p256, "P-256", 32);
ec_curve_conversions!(p384, "P-384", 48);
ec_curve_conversions!(p521, "P-521", 66);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64url_bytes_round_trip() {
        let value = Base64urlBytes::from_base64url("AQID").unwrap();
        assert_eq!(value.0, vec![1, 2, 3]);
        assert_eq!(value.to_base64url(), "AQID");
        // Padding is tolerated on decode and never emitted
        assert_eq!(Base64urlBytes::from_base64url("AQ==").unwrap().0, vec![1]);
    }

    #[test]
    fn p256_generate() {
        let jwk = JWK::generate_p256().unwrap();
        jwk.check().unwrap();
        match &jwk.params {
            KeyParams::EC(params) => {
                assert_eq!(params.x.as_ref().unwrap().0.len(), 32);
                assert_eq!(params.y.as_ref().unwrap().0.len(), 32);
                assert_eq!(params.d.as_ref().unwrap().0.len(), 32);
            }
            _ => panic!("expected EC key"),
        }
    }

    #[test]
    fn p384_generate() {
        let jwk = JWK::generate_p384().unwrap();
        jwk.check().unwrap();
        match &jwk.params {
            KeyParams::EC(params) => {
                assert_eq!(params.x.as_ref().unwrap().0.len(), 48);
                assert_eq!(params.d.as_ref().unwrap().0.len(), 48);
            }
            _ => panic!("expected EC key"),
        }
    }

    #[test]
    fn p521_generate() {
        let jwk = JWK::generate_p521().unwrap();
        jwk.check().unwrap();
        match &jwk.params {
            KeyParams::EC(params) => {
                assert_eq!(params.x.as_ref().unwrap().0.len(), 66);
                assert_eq!(params.y.as_ref().unwrap().0.len(), 66);
                assert_eq!(params.d.as_ref().unwrap().0.len(), 66);
            }
            _ => panic!("expected EC key"),
        }
    }

    #[test]
    fn generate_ed25519() {
        let jwk = JWK::generate_ed25519().unwrap();
        jwk.check().unwrap();
        assert_eq!(jwk.best_jws_alg().unwrap(), Algorithm::EdDSA);
    }

    #[test]
    fn generate_x25519() {
        let jwk = JWK::generate_x25519().unwrap();
        jwk.check().unwrap();
        match jwk.best_jws_alg() {
            Err(Error::KeyMismatch(_)) => {}
            other => panic!("expected key mismatch, got {other:?}"),
        }
    }

    #[test]
    fn generate_oct() {
        let jwk = JWK::generate_oct(32);
        jwk.check().unwrap();
        assert_eq!(jwk.best_jws_alg().unwrap(), Algorithm::HS256);
    }

    #[test]
    fn generate_with_params() {
        let jwk = JWK::generate(&KeyGenParam::Ec {
            curve: "P-256".to_string(),
        })
        .unwrap();
        assert!(matches!(jwk.params, KeyParams::EC(_)));
        assert!(jwk.kid.is_none());
        assert!(jwk.alg.is_none());

        let err = JWK::generate(&KeyGenParam::Ec {
            curve: "P-123".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::CurveNotImplemented(_)));

        let err = JWK::generate(&KeyGenParam::Okp {
            curve: "Ed448".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, Error::CurveNotImplemented(_)));
    }

    #[test]
    fn generate_rsa_1024_is_too_small() {
        let jwk = JWK::generate_rsa(128).unwrap();
        match &jwk.params {
            KeyParams::RSA(params) => {
                assert!(params.d.is_some());
                assert!(params.p.is_some());
                assert!(params.q.is_some());
                assert!(params.dp.is_some());
                assert!(params.dq.is_some());
                assert!(params.qi.is_some());
                assert!(params.oth.is_none());
            }
            _ => panic!("expected RSA key"),
        }
        assert!(matches!(jwk.best_jws_alg(), Err(Error::KeySizeTooSmall)));
        assert!(matches!(jwk.check(), Err(Error::KeySizeTooSmall)));
    }

    #[test]
    fn jwk_thumbprint() {
        #[track_caller]
        fn expect_thumbprint(key: serde_json::Value, expected: &str) {
            let key: JWK = serde_json::from_value(key).unwrap();
            assert_eq!(key.thumbprint().unwrap(), expected);
        }

        // https://tools.ietf.org/html/rfc7638#section-3.1
        expect_thumbprint(
            serde_json::json!({
                "kty": "RSA",
                "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
                "e": "AQAB",
                "alg": "RS256",
                "kid": "2011-04-29"
            }),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs",
        );

        // https://tools.ietf.org/html/rfc8037#appendix-A.3
        expect_thumbprint(
            serde_json::json!({
                "crv": "Ed25519",
                "kty": "OKP",
                "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
            }),
            "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k",
        );

        // EC key from RFC 7518 appendix C; the expected hash is computed,
        // the RFC itself gives no thumbprint for it.
        expect_thumbprint(
            serde_json::json!({
                "kty": "EC",
                "crv": "P-256",
                "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
                "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
            }),
            "Vy57XrArUrW0NbpI12tEzDHABxMwrTh6HHXRenSpnCo",
        );

        // oct key reusing the Ed25519 public bytes as the secret
        expect_thumbprint(
            serde_json::json!({
                "kty": "oct",
                "k": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
            }),
            "kcfv_I8tB4KY_ljAlRa1ip-y7jzbPdH0sUlCGb-1Jx8",
        );
    }

    #[test]
    fn thumbprint_ignores_metadata() {
        let bare: JWK = serde_json::from_value(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
            "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
        }))
        .unwrap();
        let annotated: JWK = serde_json::from_value(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
            "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
            "use": "sig",
            "alg": "ES256",
            "kid": "some-key",
        }))
        .unwrap();
        assert_eq!(bare.thumbprint().unwrap(), annotated.thumbprint().unwrap());
        assert_eq!(
            bare.thumbprint_bytes::<sha2::Sha512>().unwrap(),
            annotated.thumbprint_bytes::<sha2::Sha512>().unwrap()
        );
        assert_eq!(bare.thumbprint_bytes::<sha2::Sha512>().unwrap().len(), 64);
    }

    #[test]
    fn round_trip_with_x5t_s256() {
        let json = r#"{"kty":"oct","k":"AQID","x5t#S256":"AAAA"}"#;
        let key: JWK = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&key).unwrap();
        assert_eq!(value["x5t#S256"], "AAAA");
        assert_eq!(value["k"], "AQID");
        let reparsed: JWK = serde_json::from_value(value).unwrap();
        assert_eq!(reparsed, key);
    }

    #[test]
    fn unknown_fields_are_dropped() {
        let json = r#"{"kty":"oct","k":"AQID","x-vendor":"yes"}"#;
        let key: JWK = serde_json::from_str(json).unwrap();
        let value = serde_json::to_value(&key).unwrap();
        assert!(value.get("x-vendor").is_none());
    }

    #[test]
    fn to_public_strips_secrets() {
        let key = JWK::generate_p256().unwrap();
        let public = key.to_public().unwrap();
        let value = serde_json::to_value(&public).unwrap();
        assert!(value.get("d").is_none());
        assert!(value.get("x").is_some());
        // Projection is idempotent
        assert_eq!(public.to_public().unwrap(), public);
        assert!(key.equals_public(&public));

        let key = JWK::generate_rsa(128).unwrap();
        let public = key.to_public().unwrap();
        let value = serde_json::to_value(&public).unwrap();
        for member in ["d", "p", "q", "dp", "dq", "qi", "oth"] {
            assert!(value.get(member).is_none(), "unexpected member {member}");
        }

        let key = JWK::generate_ed25519().unwrap();
        let public = key.to_public().unwrap();
        let value = serde_json::to_value(&public).unwrap();
        assert!(value.get("d").is_none());

        // Symmetric keys have no public half
        let key = JWK::generate_oct(32);
        assert!(key.to_public().is_none());
    }

    #[test]
    fn to_public_preserves_metadata() {
        let mut key = JWK::generate_ed25519().unwrap();
        key.kid = Some("signer-1".to_string());
        key.key_use = Some("sig".to_string());
        let public = key.to_public().unwrap();
        assert_eq!(public.kid.as_deref(), Some("signer-1"));
        assert_eq!(public.key_use.as_deref(), Some("sig"));
    }

    #[test]
    fn best_jws_alg_by_key() {
        let key = JWK::generate_p256().unwrap();
        assert_eq!(key.best_jws_alg().unwrap(), Algorithm::ES256);
        let key = JWK::generate_p384().unwrap();
        assert_eq!(key.best_jws_alg().unwrap(), Algorithm::ES384);
        let key = JWK::generate_p521().unwrap();
        assert_eq!(key.best_jws_alg().unwrap(), Algorithm::ES512);

        assert_eq!(JWK::generate_oct(64).best_jws_alg().unwrap(), Algorithm::HS512);
        assert_eq!(JWK::generate_oct(48).best_jws_alg().unwrap(), Algorithm::HS384);
        assert_eq!(JWK::generate_oct(32).best_jws_alg().unwrap(), Algorithm::HS256);
        assert!(matches!(
            JWK::generate_oct(31).best_jws_alg(),
            Err(Error::KeySizeTooSmall)
        ));

        // 2048-bit RSA public key from RFC 7638 section 3.1
        let key: JWK = serde_json::from_value(serde_json::json!({
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            "e": "AQAB"
        }))
        .unwrap();
        assert_eq!(key.best_jws_alg().unwrap(), Algorithm::PS512);

        // The alg member is disregarded
        let mut key = JWK::generate_p256().unwrap();
        key.alg = Some(KeyAlgorithm::Signing(Algorithm::HS256));
        assert_eq!(key.best_jws_alg().unwrap(), Algorithm::ES256);
    }

    #[test]
    fn check_rejects_bad_keys() {
        // Coordinate width must match the curve
        let key: JWK = serde_json::from_value(serde_json::json!({
            "kty": "EC",
            "crv": "P-384",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
            "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
        }))
        .unwrap();
        assert!(matches!(
            key.check(),
            Err(Error::InvalidSize {
                expected: 48,
                actual: 32
            })
        ));

        // Point must lie on the curve
        let mut key: JWK = serde_json::from_value(serde_json::json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "weNJy2HscCSM6AEDTDg04biOvhFhyyWvOHQfeF_PxMQ",
            "y": "e8lnCO-AlStT-NJVX-crhB7QRYhiix03illJOVAOyck",
        }))
        .unwrap();
        if let KeyParams::EC(ref mut params) = key.params {
            params.y.as_mut().unwrap().0[0] ^= 1;
        }
        assert!(key.check().is_err());

        // Symmetric keys need at least 256 bits
        let key = JWK::generate_oct(16);
        assert!(matches!(key.check(), Err(Error::KeySizeTooSmall)));

        // Even RSA public exponent
        let key: JWK = serde_json::from_value(serde_json::json!({
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            "e": "AQAC"
        }))
        .unwrap();
        assert!(matches!(key.check(), Err(Error::KeyMismatch(_))));
    }

    #[test]
    fn okp_ed448_is_carried_opaquely() {
        // 57-byte Ed448 public key round-trips but cannot sign here
        let key: JWK = serde_json::from_value(serde_json::json!({
            "kty": "OKP",
            "crv": "Ed448",
            "x": "fk26pcxfXvGSnPbHVz0k7lJraT3728-ngkxvLRC1n_NLr-LXfbYY-GUXipfQAJTrCNVnipOE74IA"
        }))
        .unwrap();
        key.check().unwrap();
        assert!(matches!(
            key.best_jws_alg(),
            Err(Error::CurveNotImplemented(_))
        ));
    }

    #[test]
    fn rsa_private_key_conversion_requires_complete_crt() {
        let key: JWK = serde_json::from_value(serde_json::json!({
            "kty": "RSA",
            "n": "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
            "e": "AQAB",
            "d": "AQAB",
            "p": "AQAB"
        }))
        .unwrap();
        match &key.params {
            KeyParams::RSA(params) => {
                assert!(matches!(
                    rsa::RsaPrivateKey::try_from(params),
                    Err(Error::KeyMismatch(_))
                ));
            }
            _ => panic!("expected RSA key"),
        }
    }
}
