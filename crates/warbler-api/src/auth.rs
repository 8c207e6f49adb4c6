use std::sync::Arc;

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::info;
use validator::Validate;

use warbler_db::models::NewUser;
use warbler_db::{Database, DuplicateIdentity, IdentityField};
use warbler_types::api::{FlashCategory, FormView, LoginForm, SignupForm};
use warbler_types::models::User;

use crate::error::ApiError;
use crate::middleware::{self, CurrentUser};
use crate::{blocking, flash, views};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub secret_key: String,
}

/// Create a user with a freshly hashed password in one transaction.
/// A taken username or email comes back as `Ok(Err(DuplicateIdentity))`.
pub fn signup(
    db: &Database,
    username: &str,
    email: &str,
    password: &str,
    image_url: Option<&str>,
) -> anyhow::Result<Result<User, DuplicateIdentity>> {
    let password_hash = warbler_crypto::hash(password)?;
    let image_url = image_url.map(str::trim).filter(|url| !url.is_empty());

    let created = db.create_user(&NewUser {
        username,
        email,
        password_hash: &password_hash,
        image_url,
    })?;

    Ok(created.map(User::from))
}

/// Look up by exact username and check the password. Unknown users and wrong
/// passwords are both `Ok(None)` and both pay for one Argon2 verification.
pub fn authenticate(db: &Database, username: &str, password: &str) -> anyhow::Result<Option<User>> {
    let Some(row) = db.get_user_by_username(username)? else {
        warbler_crypto::verify_dummy(password);
        return Ok(None);
    };

    if !warbler_crypto::verify(password, &row.password) {
        return Ok(None);
    }

    Ok(Some(row.into()))
}

fn signup_view(form: &SignupForm) -> FormView {
    FormView::new("signup")
        .value("username", &form.username)
        .value("email", &form.email)
        .value("image_url", &form.image_url)
}

fn login_view(form: &LoginForm) -> FormView {
    FormView::new("login").value("username", &form.username)
}

/// GET /signup
pub async fn signup_form(jar: CookieJar, Extension(current): Extension<CurrentUser>) -> Response {
    views::render(jar, &current, StatusCode::OK, FormView::new("signup"))
}

/// POST /signup
pub async fn signup_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    if let Err(errors) = form.validate() {
        let view = signup_view(&form).with_validation(&errors);
        return Ok(views::render(jar, &current, StatusCode::UNPROCESSABLE_ENTITY, view));
    }

    let username = form.username.clone();
    let email = form.email.clone();
    let password = form.password.clone();
    let image_url = form.image_url.clone();

    let created = blocking(&state, move |db| {
        signup(db, &username, &email, &password, Some(image_url.as_str()))
    })
    .await?;

    match created {
        Ok(user) => {
            let jar = middleware::login(jar, &state.secret_key, &user)?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(dup) => {
            let message = match dup.field {
                IdentityField::Username => "Username already taken",
                IdentityField::Email => "Email already taken",
            };
            let jar = flash::push(jar, FlashCategory::Danger, message);
            let view = signup_view(&form).error(&dup.field.to_string(), message);
            Ok(views::render(jar, &current, StatusCode::CONFLICT, view))
        }
    }
}

/// GET /login
pub async fn login_form(jar: CookieJar, Extension(current): Extension<CurrentUser>) -> Response {
    views::render(jar, &current, StatusCode::OK, FormView::new("login"))
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    if let Err(errors) = form.validate() {
        let view = login_view(&form).with_validation(&errors);
        return Ok(views::render(jar, &current, StatusCode::UNPROCESSABLE_ENTITY, view));
    }

    let username = form.username.clone();
    let password = form.password.clone();
    let user = blocking(&state, move |db| authenticate(db, &username, &password)).await?;

    match user {
        Some(user) => {
            info!("User {} logged in", user.username);
            let jar = middleware::login(jar, &state.secret_key, &user)?;
            let jar = flash::push(
                jar,
                FlashCategory::Success,
                &format!("Hello, {}!", user.username),
            );
            Ok((jar, Redirect::to("/")).into_response())
        }
        None => {
            let jar = flash::push(jar, FlashCategory::Danger, "Invalid credentials.");
            Ok(views::render(jar, &current, StatusCode::UNAUTHORIZED, login_view(&form)))
        }
    }
}

/// GET /logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = middleware::logout(jar);
    let jar = flash::push(jar, FlashCategory::Success, "Successfully logged out!");
    (jar, Redirect::to("/"))
}
