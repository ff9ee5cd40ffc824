use std::time::Duration;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{config::JwtConfig, error::ApiError, state::AppState};

/// Cookie names used for the token pair.
pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub kind: TokenKind,
}

/// Signing/verification material for both token classes. Each class has its
/// own secret, so an access token can never pass refresh verification even if
/// the `kind` claim were forged.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(config: &JwtConfig) -> Self {
        let JwtConfig {
            access_secret,
            refresh_secret,
            access_ttl_minutes,
            refresh_ttl_days,
        } = config;
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((*access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((*refresh_ttl_days as u64) * 24 * 60 * 60),
        }
    }

    fn sign_with_kind(&self, user_id: Uuid, email: &str, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let (key, ttl) = match kind {
            TokenKind::Access => (&self.access_encoding, self.access_ttl),
            TokenKind::Refresh => (&self.refresh_encoding, self.refresh_ttl),
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            kind,
        };
        let token = encode(&Header::default(), &claims, key)?;
        debug!(user_id = %user_id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user_id: Uuid, email: &str) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, email, TokenKind::Refresh)
    }

    /// Verify signature and expiry against the secret for `kind`; the token's
    /// own `kind` claim must match as well.
    pub fn verify(&self, token: &str, kind: TokenKind) -> anyhow::Result<Claims> {
        let key = match kind {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };
        let data = decode::<Claims>(token, key, &Validation::default())?;
        if data.claims.kind != kind {
            anyhow::bail!("wrong token class");
        }
        debug!(user_id = %data.claims.sub, kind = ?kind, "jwt verified");
        Ok(data.claims)
    }
}

/// Extracts the authenticated identity from the Authorization header, falling
/// back to the access-token cookie.
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let bearer = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let token = match bearer {
            Some(t) => t,
            None => CookieJar::from_headers(&parts.headers)
                .get(ACCESS_COOKIE)
                .map(|c| c.value().to_string())
                .ok_or(ApiError::Unauthenticated("Authentication required"))?,
        };

        let claims = keys.verify(&token, TokenKind::Access).map_err(|_| {
            warn!("invalid or expired access token");
            ApiError::Unauthenticated("Invalid or expired token")
        })?;

        Ok(AuthUser(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            access_secret: "access-secret".into(),
            refresh_secret: "refresh-secret".into(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        })
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "a@b.co").expect("sign access");
        let claims = keys.verify(&token, TokenKind::Access).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@b.co");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[test]
    fn sign_and_verify_refresh_token() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys.sign_refresh(user_id, "a@b.co").expect("sign refresh");
        let claims = keys.verify(&token, TokenKind::Refresh).expect("verify");
        assert_eq!(claims.kind, TokenKind::Refresh);
    }

    #[test]
    fn access_token_fails_refresh_verification() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4(), "a@b.co").expect("sign");
        // distinct secrets: signature check fails before the kind check can
        assert!(keys.verify(&token, TokenKind::Refresh).is_err());
    }

    #[test]
    fn refresh_token_fails_access_verification() {
        let keys = make_keys();
        let token = keys.sign_refresh(Uuid::new_v4(), "a@b.co").expect("sign");
        assert!(keys.verify(&token, TokenKind::Access).is_err());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let keys = make_keys();
        let token = keys.sign_access(Uuid::new_v4(), "a@b.co").expect("sign");
        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');
        assert!(keys.verify(&tampered, TokenKind::Access).is_err());
    }

    #[tokio::test]
    async fn extractor_accepts_bearer_header_and_cookie() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id, "a@b.co").expect("sign");

        let req = axum::http::Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("bearer token accepted");
        assert_eq!(claims.sub, user_id);

        let req = axum::http::Request::builder()
            .header("Cookie", format!("{ACCESS_COOKIE}={token}"))
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("cookie token accepted");
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn extractor_rejects_missing_and_refresh_class_tokens() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);

        let req = axum::http::Request::builder().body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        assert!(AuthUser::from_request_parts(&mut parts, &state)
            .await
            .is_err());

        // a refresh token presented as an access credential is refused
        let refresh = keys.sign_refresh(Uuid::new_v4(), "a@b.co").expect("sign");
        let req = axum::http::Request::builder()
            .header("Authorization", format!("Bearer {refresh}"))
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        assert!(AuthUser::from_request_parts(&mut parts, &state)
            .await
            .is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = make_keys();
        let other = JwtKeys::from_config(&JwtConfig {
            access_secret: "some-other-secret".into(),
            refresh_secret: "another".into(),
            access_ttl_minutes: 15,
            refresh_ttl_days: 7,
        });
        let token = other.sign_access(Uuid::new_v4(), "a@b.co").expect("sign");
        assert!(keys.verify(&token, TokenKind::Access).is_err());
    }
}
