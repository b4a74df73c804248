// SPDX-License-Identifier: MIT

//! Identity provider boundary and the email-domain gate.
//!
//! The provider itself is external: it either yields an authenticated
//! principal or fails. The core only adds the closed-community check on
//! top.

use crate::error::{AppError, Result};
use crate::models::Principal;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// External identity provider contract.
pub trait IdentityProvider: Send + Sync {
    /// Verify a credential and return the authenticated principal, or
    /// fail with an authentication error.
    fn verify(&self, credential: &str) -> Result<Principal>;
}

/// Claims carried by a provider assertion token.
#[derive(Debug, Deserialize)]
struct AssertionClaims {
    sub: String,
    name: String,
    email: String,
    #[serde(default)]
    picture: Option<String>,
    #[allow(dead_code)]
    exp: usize,
}

/// Identity provider that accepts HS256-signed principal assertions,
/// verified against a shared secret. Suitable for closed deployments
/// where the sign-in frontend and backend share the secret.
pub struct TokenIdentityProvider {
    decoding_key: DecodingKey,
}

impl TokenIdentityProvider {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
        }
    }
}

impl IdentityProvider for TokenIdentityProvider {
    fn verify(&self, credential: &str) -> Result<Principal> {
        let validation = Validation::new(Algorithm::HS256);
        let token = decode::<AssertionClaims>(credential, &self.decoding_key, &validation)
            .map_err(|_| AppError::InvalidToken)?;

        Ok(Principal {
            id: token.claims.sub,
            display_name: token.claims.name,
            email: token.claims.email,
            avatar_url: token.claims.picture,
        })
    }
}

/// Enforce the closed-community email gate. A principal outside the
/// allowed domain gets no session.
pub fn check_domain(principal: &Principal, allowed_domain: &str) -> Result<()> {
    let suffix = format!("@{}", allowed_domain.to_ascii_lowercase());
    if principal.email.to_ascii_lowercase().ends_with(&suffix) {
        Ok(())
    } else {
        Err(AppError::AccessDenied(format!(
            "Only {} accounts may sign in",
            allowed_domain
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(email: &str) -> Principal {
        Principal {
            id: "m1".into(),
            display_name: "Asha".into(),
            email: email.into(),
            avatar_url: None,
        }
    }

    #[test]
    fn domain_gate_accepts_member_emails() {
        assert!(check_domain(&principal("asha@campus.edu"), "campus.edu").is_ok());
        // Case-insensitive on both sides.
        assert!(check_domain(&principal("Asha@Campus.EDU"), "campus.edu").is_ok());
    }

    #[test]
    fn domain_gate_rejects_outsiders() {
        let err = check_domain(&principal("asha@gmail.com"), "campus.edu").unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));

        // A lookalike suffix is not the domain.
        let err = check_domain(&principal("asha@notcampus.edu"), "campus.edu").unwrap_err();
        assert!(matches!(err, AppError::AccessDenied(_)));
    }

    #[test]
    fn token_provider_round_trips_principal() {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let secret = b"shared-secret";
        let claims = serde_json::json!({
            "sub": "m1",
            "name": "Asha",
            "email": "asha@campus.edu",
            "picture": "https://img.example/a.png",
            "exp": chrono::Utc::now().timestamp() + 3600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();

        let provider = TokenIdentityProvider::new(secret);
        let principal = provider.verify(&token).unwrap();
        assert_eq!(principal.id, "m1");
        assert_eq!(principal.email, "asha@campus.edu");

        // Wrong secret fails verification.
        let wrong = TokenIdentityProvider::new(b"other-secret");
        assert!(matches!(
            wrong.verify(&token).unwrap_err(),
            AppError::InvalidToken
        ));
    }
}
