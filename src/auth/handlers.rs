use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, RefreshRequest, SignupRequest},
        jwt::{AuthUser, JwtKeys, TokenKind, ACCESS_COOKIE, REFRESH_COOKIE},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

fn auth_cookie(
    name: &'static str,
    value: String,
    ttl: std::time::Duration,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_secure(secure);
    cookie.set_path("/");
    cookie.set_max_age(TimeDuration::seconds(ttl.as_secs() as i64));
    cookie
}

/// Sign a fresh token pair, overwrite the stored session slot (rotation) and
/// set both cookies.
async fn issue_session(state: &AppState, jar: CookieJar, user: &User) -> ApiResult<CookieJar> {
    let keys = JwtKeys::from_ref(state);
    let access = keys.sign_access(user.id, &user.email)?;
    let refresh = keys.sign_refresh(user.id, &user.email)?;
    User::set_refresh_token(&state.db, user.id, &refresh).await?;

    let secure = state.config.cookie_secure;
    let jar = jar
        .add(auth_cookie(ACCESS_COOKIE, access, keys.access_ttl, secure))
        .add(auth_cookie(REFRESH_COOKIE, refresh, keys.refresh_ttl, secure));
    Ok(jar)
}

#[instrument(skip(state, jar, payload))]
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    payload.email = payload.email.trim().to_lowercase();
    let errors = payload.validate();
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "signup with already registered email");
        return Err(ApiError::Duplicate("User already exists"));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &hash, payload.name.trim()).await?;
    let jar = issue_session(&state, jar, &user).await?;

    info!(user_id = %user.id, "user signed up");
    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            message: "User created successfully",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password are indistinguishable to the caller.
    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login with unknown email");
        return Err(ApiError::Unauthenticated("Invalid credentials"));
    };
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthenticated("Invalid credentials"));
    }

    let jar = issue_session(&state, jar, &user).await?;
    info!(user_id = %user.id, "user logged in");
    Ok((
        jar,
        Json(AuthResponse {
            message: "Login successful",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, jar, payload))]
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Option<Json<RefreshRequest>>,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| payload.and_then(|Json(p)| p.refresh_token))
        .ok_or(ApiError::Unauthenticated("Refresh token required"))?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify(&presented, TokenKind::Refresh)
        .map_err(|_| ApiError::Unauthenticated("Invalid refresh token"))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated("Invalid refresh token"))?;

    // Reject anything but the currently stored token: a rotated-away token
    // presented here means reuse of a stale or stolen credential.
    if !user.session_matches(&presented) {
        warn!(user_id = %user.id, "stale refresh token presented");
        return Err(ApiError::Unauthenticated("Invalid refresh token"));
    }

    let jar = issue_session(&state, jar, &user).await?;
    info!(user_id = %user.id, "token pair rotated");
    Ok((
        jar,
        Json(MessageResponse {
            message: "Token refreshed successfully",
        }),
    ))
}

#[instrument(skip(state, jar, user))]
async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    user: Option<AuthUser>,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(AuthUser(claims)) = user {
        User::clear_refresh_token(&state.db, claims.sub).await?;
        info!(user_id = %claims.sub, "user logged out");
    }
    let jar = jar
        .remove(Cookie::build((ACCESS_COOKIE, "")).path("/"))
        .remove(Cookie::build((REFRESH_COOKIE, "")).path("/"));
    Ok((
        jar,
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    ))
}

#[instrument(skip(state, claims))]
async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<crate::auth::dto::UserResponse>> {
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_cookies_are_host_only_and_strict() {
        let cookie = auth_cookie(
            ACCESS_COOKIE,
            "tok".into(),
            std::time::Duration::from_secs(900),
            false,
        );
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(TimeDuration::seconds(900)));
        assert_ne!(cookie.secure(), Some(true));
    }

    #[test]
    fn secure_flag_follows_config() {
        let cookie = auth_cookie(
            REFRESH_COOKIE,
            "tok".into(),
            std::time::Duration::from_secs(60),
            true,
        );
        assert_eq!(cookie.secure(), Some(true));
    }
}
