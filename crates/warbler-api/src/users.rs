use axum::{
    Extension, Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::info;
use validator::Validate;

use warbler_db::IdentityField;
use warbler_types::api::{FlashCategory, FormView, ProfileForm, ProfileView, UserListView, UserSearch};
use warbler_types::models::{Message, User, UserSummary};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::middleware::{self, CurrentUser};
use crate::{blocking, flash, views};

/// Newest messages shown on a profile page.
const PROFILE_MESSAGE_LIMIT: u32 = 100;

/// Load a user or fail with `NotFound`.
pub(crate) async fn find_user(state: &AppState, user_id: i64) -> Result<User, ApiError> {
    blocking(state, move |db| db.get_user_by_id(user_id))
        .await?
        .map(User::from)
        .ok_or(ApiError::NotFound)
}

/// GET /users?q=
pub async fn list_users(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    Query(search): Query<UserSearch>,
) -> Result<Response, ApiError> {
    let query = search.q.clone();
    let rows = blocking(&state, move |db| db.search_users(query.as_deref())).await?;

    let users = rows
        .into_iter()
        .map(|row| UserSummary::from(&User::from(row)))
        .collect();

    let view = UserListView {
        query: search.q,
        users,
    };
    Ok(views::render(jar, &current, StatusCode::OK, view))
}

/// GET /users/{user_id}
pub async fn show_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    IdPath(user_id): IdPath,
) -> Result<Response, ApiError> {
    let user = find_user(&state, user_id).await?;

    let (stats, rows) = blocking(&state, move |db| {
        let stats = db.user_stats(user_id)?;
        let rows = db.list_user_messages(user_id, PROFILE_MESSAGE_LIMIT)?;
        Ok((stats, rows))
    })
    .await?;

    let messages = rows.into_iter().map(Message::from).collect();
    let view = ProfileView::new(&user, stats, messages);
    Ok(views::render(jar, &current, StatusCode::OK, view))
}

fn profile_view(username: &str, email: &str) -> FormView {
    FormView::new("profile")
        .value("username", username)
        .value("email", email)
}

/// GET /users/profile — edit form prefilled with the current identity.
pub async fn profile_form(
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let user = current.require()?;
    let view = profile_view(&user.username, &user.email);
    Ok(views::render(jar, &current, StatusCode::OK, view))
}

/// POST /users/profile — change username and email.
pub async fn profile_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<ProfileForm>,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    if let Err(errors) = form.validate() {
        let view = profile_view(&form.username, &form.email).with_validation(&errors);
        return Ok(views::render(jar, &current, StatusCode::UNPROCESSABLE_ENTITY, view));
    }

    let username = form.username.clone();
    let email = form.email.clone();
    let updated = blocking(&state, move |db| {
        db.update_user_identity(user_id, &username, &email)
    })
    .await?;

    match updated {
        Ok(_) => Ok(Redirect::to(&format!("/users/{}", user_id)).into_response()),
        Err(dup) => {
            let message = match dup.field {
                IdentityField::Username => "Username already taken",
                IdentityField::Email => "Email already taken",
            };
            let jar = flash::push(jar, FlashCategory::Danger, message);
            let view = profile_view(&form.username, &form.email).error(&dup.field.to_string(), message);
            Ok(views::render(jar, &current, StatusCode::CONFLICT, view))
        }
    }
}

/// POST /users/delete — log out, then remove the account and everything it owns.
pub async fn delete_account(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let user = current.require()?;
    let user_id = user.id;
    let username = user.username.clone();

    let jar = middleware::logout(jar);
    blocking(&state, move |db| db.delete_user(user_id)).await?;

    info!("User {} ({}) deleted their account", username, user_id);
    Ok((jar, Redirect::to("/signup")).into_response())
}
