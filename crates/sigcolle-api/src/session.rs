use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use sigcolle_types::api::Claims;
use sigcolle_types::models::LoginPrincipal;

use crate::auth::AppState;

pub const SESSION_COOKIE: &str = "sigcolle_session";
pub const FLASH_COOKIE: &str = "sigcolle_flash";

const SESSION_DAYS: i64 = 30;

/// A logged-in session. Requests without one carry no `Session` at all.
#[derive(Debug, Clone)]
pub struct Session {
    principal: LoginPrincipal,
}

impl Session {
    pub fn new(principal: LoginPrincipal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &LoginPrincipal {
        &self.principal
    }
}

/// The session placed on the request by [`load_session`], if any.
pub struct CurrentSession(pub Option<Session>);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(parts.extensions.get::<Session>().cloned()))
    }
}

pub fn create_token(secret: &str, principal: &LoginPrincipal) -> anyhow::Result<String> {
    let claims = Claims {
        sub: principal.user_id,
        name: principal.name.clone(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Option<Session> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| debug!("Ignoring session cookie: {}", e))
    .ok()?;

    Some(Session::new(LoginPrincipal {
        user_id: token_data.claims.sub,
        name: token_data.claims.name,
    }))
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Attach a one-shot message that the next page reads with [`take_flash`].
pub fn put_flash(jar: CookieJar, message: &str) -> CookieJar {
    jar.add(
        Cookie::build((FLASH_COOKIE, B64.encode(message)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Read the flash message, if any, and schedule its removal.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<String>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let message = B64
        .decode(cookie.value())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), message)
}

/// Decode the session cookie, if present and valid, into a request extension.
/// Never rejects: handlers decide what a missing session means.
pub async fn load_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(session) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| decode_token(&state.session_secret, c.value()))
    {
        req.extensions_mut().insert(session);
    }
    next.run(req).await
}
