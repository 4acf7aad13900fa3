/// Request principal extraction
///
/// Resolves the bearer credential on each request to a `{user_id, email}`
/// principal. Token validation itself is the upstream identity provider's
/// job; this boundary only reads the subject and email claims, so the
/// token is decoded without signature verification.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::error::AppError;

/// The authenticated actor performing a request
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

/// Decode a bearer token into a principal
pub fn decode_principal(token: &str) -> Result<Principal, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let decoded =
        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| AppError::Unauthenticated(format!("invalid token: {e}")))?;

    let Some(user_id) = decoded.claims.sub else {
        return Err(AppError::Unauthenticated("invalid token: no subject".to_string()));
    };

    Ok(Principal {
        user_id,
        email: decoded.claims.email,
    })
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Unauthenticated("missing authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthenticated("authorization header is not a bearer token".to_string())
        })?;

        decode_principal(token)
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use super::*;

    fn token(claims: serde_json::Value) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    #[test]
    fn decodes_subject_and_email() {
        let token = token(json!({"sub": "user-1", "email": "a@example.com"}));
        let principal = decode_principal(&token).unwrap();
        assert_eq!(principal.user_id, "user-1");
        assert_eq!(principal.email.as_deref(), Some("a@example.com"));
    }

    #[test]
    fn missing_subject_is_unauthenticated() {
        let token = token(json!({"email": "a@example.com"}));
        let result = decode_principal(&token);
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }

    #[test]
    fn garbage_token_is_unauthenticated() {
        let result = decode_principal("not-a-jwt");
        assert!(matches!(result, Err(AppError::Unauthenticated(_))));
    }
}
