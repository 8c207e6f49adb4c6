pub mod auth;
pub mod error;
pub mod extract;
pub mod flash;
pub mod follows;
pub mod likes;
pub mod messages;
pub mod middleware;
pub mod users;
pub mod views;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::error;

use warbler_db::Database;

use crate::auth::AppState;
use crate::error::ApiError;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(messages::homepage))
        .route("/signup", get(auth::signup_form).post(auth::signup_submit))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::list_users))
        .route("/users/profile", get(users::profile_form).post(users::profile_submit))
        .route("/users/delete", post(users::delete_account))
        .route("/users/{user_id}", get(users::show_user))
        .route("/users/{user_id}/followers", get(follows::show_followers))
        .route("/users/{user_id}/following", get(follows::show_following))
        .route("/users/{user_id}/likes", get(likes::show_likes))
        .route("/users/follow/{user_id}", post(follows::follow))
        .route("/users/stop-following/{user_id}", post(follows::stop_following))
        .route("/messages/new", get(messages::new_message_form).post(messages::create_message))
        .route("/messages/{message_id}/delete", post(messages::delete_message))
        .route("/messages/{message_id}/like", post(likes::like_message))
        .route("/messages/{message_id}/unlike", post(likes::unlike_message))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_current_user,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run a database call on the blocking pool, off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::from)
}
