//! Caller identity.
//!
//! Every mutating operation receives the caller's [`OwnerId`], resolved
//! from a verified credential by an [`IdentityVerifier`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{CdnError, CdnResult};

/// Stable owner identifier of a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new<S: Into<String>>(owner: S) -> Self {
        Self(owner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Resolves a credential into the caller's owner id.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> CdnResult<OwnerId>;
}

/// Extract the token from an `Authorization` header value.
///
/// Accepts `Bearer <token>`, `JWT <token>` or a bare token.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    if header.is_empty() {
        return None;
    }

    match header.split_once(' ') {
        Some((scheme, token)) => {
            let token = token.trim();
            let allowed = ["Bearer", "JWT"]
                .iter()
                .any(|s| s.eq_ignore_ascii_case(scheme.trim()));
            (allowed && !token.is_empty()).then_some(token)
        }
        None => Some(header),
    }
}

/// HS256 JWT verification; the owner id is read from `owner_claim`.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    secret: String,
    owner_claim: String,
    issuer: Option<String>,
    audience: Vec<String>,
}

impl JwtIdentityVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            owner_claim: "sub".to_string(),
            issuer: None,
            audience: Vec::new(),
        }
    }

    pub fn with_owner_claim(mut self, claim: impl Into<String>) -> Self {
        self.owner_claim = claim.into();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    fn decode(&self, token: &str) -> CdnResult<Value> {
        use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        if self.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.audience);
        }

        let decoded = decode::<Value>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| CdnError::not_authenticated(format!("Invalid authorization token provided: {}", e)))?;

        Ok(decoded.claims)
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> CdnResult<OwnerId> {
        if token.trim().is_empty() {
            return Err(CdnError::not_authenticated("No authorization token provided."));
        }

        let claims = self.decode(token)?;
        claims
            .get(&self.owner_claim)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(OwnerId::new)
            .ok_or_else(|| CdnError::not_authenticated("Could not resolve owner from token"))
    }
}

/// A single shared token mapped to a fixed owner.
#[derive(Debug, Clone)]
pub struct StaticTokenVerifier {
    token: String,
    owner: OwnerId,
}

impl StaticTokenVerifier {
    pub fn new(token: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner: OwnerId::new(owner),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> CdnResult<OwnerId> {
        if token.is_empty() {
            return Err(CdnError::not_authenticated("No authorization token provided."));
        }
        if token != self.token {
            return Err(CdnError::not_authenticated("Invalid authorization token provided."));
        }
        Ok(self.owner.clone())
    }
}
