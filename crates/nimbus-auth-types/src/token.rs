//! JWT claim validation for access and refresh tokens.

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "issuer", test))]
use serde::Serialize;
use uuid::Uuid;

/// `typ` claim value carried by refresh tokens. Access tokens carry no
/// `typ` claim at all.
pub const REFRESH_TOKEN_TYP: &str = "refresh";

/// Identity extracted from a validated token.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub user_id: Uuid,
    /// Seconds since epoch at issuance. Compared against the user's
    /// invalidation watermark by the access guard.
    pub issued_at: u64,
    /// Seconds since epoch at expiry.
    pub expires_at: u64,
}

/// Errors returned by token validation.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("wrong token type")]
    WrongType,
}

/// JWT claims payload shared by issuance (auth service) and validation
/// (auth service middleware, tests).
///
/// [`Deserialize`] is always available since all consumers validate tokens.
/// [`Serialize`] requires the **`issuer`** cargo feature; only the auth
/// service enables it because it is the sole token issuer.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "issuer", test), derive(Serialize))]
pub struct JwtClaims {
    /// User ID (UUID string).
    pub sub: String,
    /// Issued-at timestamp (seconds since UNIX epoch).
    pub iat: u64,
    /// Expiration timestamp (seconds since UNIX epoch).
    pub exp: u64,
    /// `"refresh"` on refresh tokens, absent on access tokens.
    #[cfg_attr(any(feature = "issuer", test), serde(skip_serializing_if = "Option::is_none"))]
    pub typ: Option<String>,
}

/// Decode and validate a JWT, returning raw claims.
///
/// Validation: HS256, exp checked, required claims: `exp` + `sub`.
/// Default leeway = 60s to tolerate clock skew between hosts.
fn decode_jwt(token: &str, secret: &str) -> Result<JwtClaims, TokenError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
        | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_) => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    })?;

    Ok(data.claims)
}

fn parse_info(claims: JwtClaims) -> Result<TokenInfo, TokenError> {
    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| TokenError::Malformed)?;
    Ok(TokenInfo {
        user_id,
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}

/// Validate an access token value, returning parsed identity.
///
/// A refresh token presented here fails with [`TokenError::WrongType`];
/// the long-lived credential must never authorize API calls directly.
pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenInfo, TokenError> {
    let claims = decode_jwt(token, secret)?;
    if claims.typ.is_some() {
        return Err(TokenError::WrongType);
    }
    parse_info(claims)
}

/// Validate a refresh token value, returning parsed identity.
///
/// Requires `typ == "refresh"`; an access token presented to the
/// refresh endpoint fails with [`TokenError::WrongType`].
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<TokenInfo, TokenError> {
    let claims = decode_jwt(token, secret)?;
    if claims.typ.as_deref() != Some(REFRESH_TOKEN_TYP) {
        return Err(TokenError::WrongType);
    }
    parse_info(claims)
}
