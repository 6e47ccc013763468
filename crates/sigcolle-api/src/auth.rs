use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, info};

use sigcolle_db::Database;
use sigcolle_types::api::{LoginForm, RegisterForm};
use sigcolle_types::forms::ValidationErrors;
use sigcolle_types::models::LoginPrincipal;

use crate::session::{clear_session, create_token, session_cookie};
use crate::views::{FormPage, View, Views};

/// Landing page after registering or logging in.
const HOME_PATH: &str = "/campaign/new";

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub views: Views,
    pub session_secret: String,
}

impl AppStateInner {
    pub fn page(&self, view: View) -> Response {
        match self.views.render(&view) {
            Ok(html) => axum::response::Html(html).into_response(),
            Err(e) => {
                error!("Failed to render {}: {:?}", view.template(), e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

fn internal(context: &str, e: impl std::fmt::Display) -> StatusCode {
    error!("{}: {}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Issue the session cookie and send the user to the landing page.
fn sign_in(
    state: &AppStateInner,
    jar: CookieJar,
    principal: &LoginPrincipal,
) -> Result<Response, StatusCode> {
    let token = create_token(&state.session_secret, principal)
        .map_err(|e| internal("Failed to create session token", e))?;
    Ok((jar.add(session_cookie(token)), Redirect::to(HOME_PATH)).into_response())
}

/// GET /register
pub async fn register_form(State(state): State<AppState>) -> Response {
    state.page(View::Register(FormPage::default()))
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, StatusCode> {
    let mut errors = form.validate();
    if !errors.is_empty() {
        return Ok(state.page(View::Register(FormPage::new(form, errors))));
    }

    let db = state.clone();
    let email = form.email.clone();
    let existing = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(|e| internal("spawn_blocking join error", e))?
        .map_err(|e| internal("DB get_user_by_email error", e))?;

    if existing.is_some() {
        errors.add("email", "is already registered");
        return Ok(state.page(View::Register(FormPage::new(form, errors))));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| internal("Password hashing failed", e))?
        .to_string();

    let db = state.clone();
    let name = form.name.trim().to_string();
    let email = form.email.clone();
    let user_id =
        tokio::task::spawn_blocking(move || db.db.create_user(&name, &email, &password_hash))
            .await
            .map_err(|e| internal("spawn_blocking join error", e))?
            .map_err(|e| internal("DB create_user error", e))?;

    info!("Registered user {}", user_id);

    let principal = LoginPrincipal {
        user_id,
        name: form.name.trim().to_string(),
    };
    sign_in(&state, jar, &principal)
}

/// GET /login
pub async fn login_form(State(state): State<AppState>) -> Response {
    state.page(View::Login(FormPage::default()))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let db = state.clone();
    let email = form.email.clone();
    let user = tokio::task::spawn_blocking(move || db.db.get_user_by_email(&email))
        .await
        .map_err(|e| internal("spawn_blocking join error", e))?
        .map_err(|e| internal("DB get_user_by_email error", e))?;

    let verified = user.filter(|user| {
        PasswordHash::new(&user.password)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(form.password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    });

    let Some(user) = verified else {
        let mut errors = ValidationErrors::new();
        errors.add("email", "Email or password is incorrect");
        return Ok(state.page(View::Login(FormPage::new(form, errors))));
    };

    let principal = LoginPrincipal {
        user_id: user.id,
        name: user.name,
    };
    sign_in(&state, jar, &principal)
}

/// POST /logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (clear_session(jar), Redirect::to("/login"))
}
