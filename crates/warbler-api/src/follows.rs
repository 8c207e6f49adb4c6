use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::debug;

use warbler_types::api::FollowListView;
use warbler_types::models::{User, UserSummary};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::middleware::CurrentUser;
use crate::users::find_user;
use crate::{blocking, views};

fn summaries(rows: Vec<warbler_db::models::UserRow>) -> Vec<UserSummary> {
    rows.into_iter()
        .map(|row| UserSummary::from(&User::from(row)))
        .collect()
}

/// GET /users/{user_id}/followers — who follows this user.
pub async fn show_followers(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    IdPath(user_id): IdPath,
) -> Result<Response, ApiError> {
    let user = find_user(&state, user_id).await?;
    let rows = blocking(&state, move |db| db.list_followers(user_id)).await?;

    let view = FollowListView {
        user: UserSummary::from(&user),
        users: summaries(rows),
    };
    Ok(views::render(jar, &current, StatusCode::OK, view))
}

/// GET /users/{user_id}/following — who this user follows.
pub async fn show_following(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    IdPath(user_id): IdPath,
) -> Result<Response, ApiError> {
    let user = find_user(&state, user_id).await?;
    let rows = blocking(&state, move |db| db.list_following(user_id)).await?;

    let view = FollowListView {
        user: UserSummary::from(&user),
        users: summaries(rows),
    };
    Ok(views::render(jar, &current, StatusCode::OK, view))
}

/// POST /users/follow/{user_id}
pub async fn follow(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    IdPath(followed_id): IdPath,
) -> Result<Response, ApiError> {
    let follower_id = current.require()?.id;

    let inserted = blocking(&state, move |db| db.follow(follower_id, followed_id))
        .await?
        .ok_or(ApiError::NotFound)?;

    if inserted {
        debug!("User {} now follows {}", follower_id, followed_id);
    }
    Ok(Redirect::to(&format!("/users/{}/following", follower_id)).into_response())
}

/// POST /users/stop-following/{user_id}
pub async fn stop_following(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    IdPath(followed_id): IdPath,
) -> Result<Response, ApiError> {
    let follower_id = current.require()?.id;

    if blocking(&state, move |db| db.unfollow(follower_id, followed_id)).await? {
        debug!("User {} stopped following {}", follower_id, followed_id);
    }
    Ok(Redirect::to(&format!("/users/{}/following", follower_id)).into_response())
}
