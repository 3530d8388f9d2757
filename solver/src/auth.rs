//! Bearer-credential verification for the paid formats.
//!
//! The router only sees the [`IdentityVerifier`] trait, so tests and local runs
//! can swap in a fixed verifier. [`GoogleTokenVerifier`] checks Google ID tokens
//! against the token-info endpoint and the configured client id.

use axum::http::{header, HeaderMap};
use futures::future::BoxFuture;
use serde::Deserialize;

use crate::error::AuthError;

const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Identity attached to a verified credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

pub trait IdentityVerifier: Send + Sync {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<VerifiedIdentity, AuthError>>;
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingCredential)
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifies Google ID tokens. Single attempt per request.
pub struct GoogleTokenVerifier {
    client: reqwest::Client,
    client_id: Option<String>,
    endpoint: String,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
            endpoint: GOOGLE_TOKENINFO_URL.to_string(),
        }
    }

    async fn verify_inner(&self, token: &str) -> Result<VerifiedIdentity, AuthError> {
        let client_id = self.client_id.as_deref().ok_or(AuthError::NotConfigured)?;
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(AuthError::Rejected(format!("status {}", response.status())));
        }
        let info: TokenInfo = response.json().await?;
        if info.aud != client_id {
            return Err(AuthError::AudienceMismatch);
        }
        let email = info
            .email
            .ok_or_else(|| AuthError::Rejected("token carries no email".to_string()))?;
        Ok(VerifiedIdentity {
            subject_id: info.sub,
            email,
            name: info.name,
            picture_url: info.picture,
        })
    }
}

impl IdentityVerifier for GoogleTokenVerifier {
    fn verify<'a>(&'a self, token: &'a str) -> BoxFuture<'a, Result<VerifiedIdentity, AuthError>> {
        Box::pin(self.verify_inner(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn test_bearer_token_extracted() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert!(matches!(
            bearer_token(&HeaderMap::new()),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_token(&headers("Basic abc")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_token(&headers("Bearer ")),
            Err(AuthError::MissingCredential)
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_verifier_rejects() {
        let verifier = GoogleTokenVerifier::new(None);
        assert!(matches!(
            verifier.verify("token").await,
            Err(AuthError::NotConfigured)
        ));
    }
}
