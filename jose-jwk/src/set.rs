use serde::{Deserialize, Serialize};

use crate::JWK;

/// A set of JWKs: the `{"keys": [...]}` document of RFC 7517 section 5,
/// the shape served from `jwks_uri` endpoints.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JWKSet {
    pub keys: Vec<JWK>,
}

impl JWKSet {
    /// Look up a key by its `kid` member.
    pub fn find_kid(&self, kid: &str) -> Option<&JWK> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}
