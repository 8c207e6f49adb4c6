use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use warbler_types::models::{User, UserSummary};

use crate::auth::AppState;
use crate::error::{ApiError, PendingFlash};
use crate::flash;

/// Fixed cookie name that carries the session.
pub const SESSION_COOKIE: &str = "curr_user";

const SESSION_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

/// The user resolved from the session for the current request only.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn get(&self) -> Option<&User> {
        self.0.as_ref()
    }

    /// The logged-in user, or `Unauthorized`.
    pub fn require(&self) -> Result<&User, ApiError> {
        self.0.as_ref().ok_or(ApiError::Unauthorized)
    }

    pub fn summary(&self) -> Option<UserSummary> {
        self.0.as_ref().map(UserSummary::from)
    }
}

/// Sign a session token for `user_id`.
pub fn encode_session(secret: &str, user_id: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify a session token. Tampered, foreign or expired tokens yield `None`.
pub fn decode_session(secret: &str, token: &str) -> Option<i64> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .map_err(|e| debug!("Rejected session token: {}", e))
    .ok()
}

/// Write the session cookie for `user`. It lives as long as the token.
pub fn login(jar: CookieJar, secret: &str, user: &User) -> anyhow::Result<CookieJar> {
    let token = encode_session(secret, user.id)?;
    Ok(jar.add(
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::days(SESSION_DAYS)),
    ))
}

/// Drop the session cookie. A jar without one is returned unchanged.
pub fn logout(jar: CookieJar) -> CookieJar {
    if jar.get(SESSION_COOKIE).is_none() {
        return jar;
    }
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Resolve the session cookie to a `CurrentUser` extension on every request.
/// Nothing is cached: the user row is reloaded each time, so a deleted
/// account stops resolving immediately.
///
/// Flashes raised by an `ApiError` are queued here, on the request's jar, so
/// they join any the client has not seen yet.
pub async fn load_current_user(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| decode_session(&state.secret_key, cookie.value()));

    let user = match user_id {
        Some(id) => crate::blocking(&state, move |db| db.get_user_by_id(id))
            .await?
            .map(User::from),
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    let mut resp = next.run(req).await;

    match resp.extensions_mut().remove::<PendingFlash>() {
        Some(PendingFlash(pending)) => {
            let jar = flash::push(jar, pending.category, &pending.message);
            Ok((jar, resp).into_response())
        }
        None => Ok(resp),
    }
}
