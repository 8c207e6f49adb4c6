use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use warbler_types::api::LikesView;
use warbler_types::models::{Message, UserSummary};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::middleware::CurrentUser;
use crate::users::find_user;
use crate::{blocking, views};

/// POST /messages/{message_id}/like
///
/// Each call records a new like; repeated likes are not collapsed.
pub async fn like_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    IdPath(message_id): IdPath,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    let like = blocking(&state, move |db| db.add_like(user_id, message_id))
        .await?
        .ok_or(ApiError::NotFound)?;

    debug!("User {} liked message {} (like {})", user_id, message_id, like.id);
    Ok(Redirect::to("/").into_response())
}

/// POST /messages/{message_id}/unlike — drops all of this user's likes on it.
pub async fn unlike_message(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    IdPath(message_id): IdPath,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    let removed = blocking(&state, move |db| db.remove_likes(user_id, message_id)).await?;

    debug!("User {} removed {} like(s) from message {}", user_id, removed, message_id);
    Ok(Redirect::to("/").into_response())
}

/// GET /users/{user_id}/likes
pub async fn show_likes(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    IdPath(user_id): IdPath,
) -> Result<Response, ApiError> {
    let user = find_user(&state, user_id).await?;
    let rows = blocking(&state, move |db| db.list_liked_messages(user_id)).await?;

    let view = LikesView {
        user: UserSummary::from(&user),
        messages: rows.into_iter().map(Message::from).collect(),
    };
    Ok(views::render(jar, &current, StatusCode::OK, view))
}
