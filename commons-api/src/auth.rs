//! Session tokens.
//!
//! Sessions are HS256 JWTs issued by the identity provider and carried as an
//! `Authorization: Bearer` header or the session cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use commons_security::access::{Principal, Role};
use commons_security::tenant::OrganizationId;

use crate::config::JwtConfig;
use crate::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Not before (Unix timestamp)
    pub nbf: i64,
    /// JWT ID (unique identifier)
    pub jti: String,
    /// User role
    pub role: Role,
    /// Organization the user belongs to; absent for platform operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<OrganizationId>,
    /// User email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Claims {
    /// Converts the claims into the session principal.
    #[must_use]
    pub fn into_principal(self) -> Principal {
        Principal {
            user_id: self.sub,
            email: self.email,
            role: self.role,
            organization_id: self.organization_id,
        }
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    expiration_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiration_secs", &self.expiration_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Creates a new JWT manager from configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiration_secs: i64::try_from(config.expiration_secs).unwrap_or(i64::MAX),
        }
    }

    /// Issues a session token for a principal.
    pub fn issue(&self, principal: &Principal) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(Duration::seconds(self.expiration_secs))
            .unwrap_or(now);

        let claims = Claims {
            sub: principal.user_id.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            role: principal.role,
            organization_id: principal.organization_id,
            email: principal.email.clone(),
        };

        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> Result<String, ApiError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| ApiError::Internal(format!("Failed to issue session token: {e}")))
    }

    /// Validates a token and returns its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_nbf = true;

        let token_data: TokenData<Claims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| ApiError::Unauthorized(format!("Invalid session: {e}")))?;

        Ok(token_data.claims)
    }

    /// Validates a token and returns the session principal.
    pub fn principal(&self, token: &str) -> Result<Principal, ApiError> {
        self.validate_token(token).map(Claims::into_principal)
    }
}

/// Extracts the bearer token from an Authorization header value.
#[must_use]
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Extracts a named cookie from a `Cookie` header value.
#[must_use]
pub fn extract_cookie<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            expiration_secs: 3600,
            issuer: "test-issuer".to_string(),
            audience: "test-audience".to_string(),
        }
    }

    #[test]
    fn test_issue_and_validate_member_token() {
        let manager = JwtManager::new(&test_config());
        let org = OrganizationId::new();
        let principal =
            Principal::member("user123", Role::BoardMember, org).with_email("b@acme.org");

        let token = manager.issue(&principal).unwrap();
        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.role, Role::BoardMember);
        assert_eq!(claims.organization_id, Some(org));
        assert_eq!(claims.iss, "test-issuer");

        assert_eq!(manager.principal(&token).unwrap(), principal);
    }

    #[test]
    fn test_super_admin_token_has_no_organization() {
        let manager = JwtManager::new(&test_config());
        let token = manager.issue(&Principal::super_admin("root")).unwrap();
        let principal = manager.principal(&token).unwrap();
        assert_eq!(principal.role, Role::SuperAdmin);
        assert!(principal.organization_id.is_none());
    }

    #[test]
    fn test_invalid_tokens_rejected() {
        let manager = JwtManager::new(&test_config());
        assert!(manager.validate_token("invalid-token").is_err());

        let other = JwtManager::new(&JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });
        let forged = other.issue(&Principal::super_admin("root")).unwrap();
        assert!(matches!(
            manager.validate_token(&forged),
            Err(ApiError::Unauthorized(_))
        ));

        let wrong_audience = JwtManager::new(&JwtConfig {
            audience: "elsewhere".to_string(),
            ..test_config()
        });
        let token = wrong_audience
            .issue(&Principal::super_admin("root"))
            .unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = JwtManager::new(&test_config());
        let past = Utc::now().timestamp() - 7200;
        let claims = Claims {
            sub: "user123".to_string(),
            iss: "test-issuer".to_string(),
            aud: "test-audience".to_string(),
            exp: past,
            iat: past - 60,
            nbf: past - 60,
            jti: "jti".to_string(),
            role: Role::Resident,
            organization_id: Some(OrganizationId::new()),
            email: None,
        };
        let token = manager.encode(&claims).unwrap();
        assert!(manager.validate_token(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer xyz789"), Some("xyz789"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }

    #[test]
    fn test_extract_cookie() {
        let header = "theme=dark; commons_session=tok.en.value; other=1";
        assert_eq!(extract_cookie(header, "commons_session"), Some("tok.en.value"));
        assert_eq!(extract_cookie(header, "theme"), Some("dark"));
        assert_eq!(extract_cookie(header, "missing"), None);
        assert_eq!(extract_cookie("commons_session=", "commons_session"), None);
    }
}
