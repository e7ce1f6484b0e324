use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    constants::SESSION_COOKIE_NAME,
    error::{AppError, Result},
    models::CurrentUser,
};

// ==================== CLAIMS ====================

/// Claims of a session token issued by the identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // stable user id
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            name: claims.name,
            email: claims.email,
            avatar_url: claims.picture,
        }
    }
}

// ==================== VERIFIER ====================

/// Verifies session tokens; does not issue them.
pub struct SessionVerifier {
    key: DecodingKey,
    validation: Validation,
    sign_in_url: String,
}

impl SessionVerifier {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (key, algorithm) = match (&config.session_jwt_public_key, &config.session_jwt_secret) {
            (Some(pem), _) => {
                // PEM pasted into a single-line env var keeps literal "\n".
                let pem = pem.replace("\\n", "\n");
                (DecodingKey::from_rsa_pem(pem.as_bytes())?, Algorithm::RS256)
            }
            (None, Some(secret)) => (DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256),
            (None, None) => anyhow::bail!("No session verification key configured"),
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;
        if let Some(issuer) = &config.session_jwt_issuer {
            validation.set_issuer(&[issuer]);
        }

        Ok(Self {
            key,
            validation,
            sign_in_url: config.sign_in_url.clone(),
        })
    }

    pub fn unauthenticated(&self) -> AppError {
        AppError::Unauthenticated {
            sign_in_url: self.sign_in_url.clone(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<CurrentUser> {
        let token_data = decode::<SessionClaims>(token, &self.key, &self.validation).map_err(|e| {
            tracing::debug!("Rejected session token: {}", e);
            self.unauthenticated()
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(self.unauthenticated());
        }

        Ok(token_data.claims.into())
    }

    /// Resolves the session user from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<CurrentUser> {
        let token = session_token(headers).ok_or_else(|| self.unauthenticated())?;
        self.verify(token)
    }
}

// ==================== HELPER FUNCTIONS ====================

/// Bearer token first, then the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
    {
        return Some(token);
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE_NAME)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
pub(crate) fn issue_test_token(config: &Config, sub: &str, ttl_secs: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: sub.to_string(),
        exp: (now + ttl_secs) as usize,
        iat: Some(now as usize),
        name: Some("Test User".to_string()),
        email: Some("test@example.org".to_string()),
        picture: None,
    };
    let secret = config.session_jwt_secret.as_deref().unwrap_or_default();
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::http::HeaderValue;

    fn verifier() -> (Config, SessionVerifier) {
        let config = test_config();
        let verifier = SessionVerifier::from_config(&config).unwrap();
        (config, verifier)
    }

    #[test]
    fn valid_token_resolves_user() {
        let (config, verifier) = verifier();
        let token = issue_test_token(&config, "user_1", 3600);

        let user = verifier.verify(&token).unwrap();
        assert_eq!(user.id, "user_1");
        assert_eq!(user.email.as_deref(), Some("test@example.org"));
    }

    #[test]
    fn expired_token_is_unauthenticated() {
        let (config, verifier) = verifier();
        let token = issue_test_token(&config, "user_1", -3600);

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated { .. }));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (mut config, verifier) = verifier();
        config.session_jwt_secret = Some("another_secret_that_is_long_enough".to_string());
        let token = issue_test_token(&config, "user_1", 3600);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn issuer_is_enforced_when_configured() {
        let mut config = test_config();
        config.session_jwt_issuer = Some("https://clerk.example.com".to_string());
        let verifier = SessionVerifier::from_config(&config).unwrap();
        let token = issue_test_token(&config, "user_1", 3600);

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn missing_token_carries_sign_in_url() {
        let (_, verifier) = verifier();
        match verifier.authenticate(&HeaderMap::new()) {
            Err(AppError::Unauthenticated { sign_in_url }) => assert_eq!(sign_in_url, "/sign-in"),
            other => panic!("expected unauthenticated, got {:?}", other),
        }
    }

    #[test]
    fn session_token_reads_bearer_then_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; __session=cookie-token"),
        );
        assert_eq!(session_token(&headers), Some("cookie-token"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer header-token"));
        assert_eq!(session_token(&headers), Some("header-token"));
    }

    #[test]
    fn session_token_ignores_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(session_token(&headers), None);
    }
}
