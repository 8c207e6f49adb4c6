use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::warn;
use validator::Validate;

use warbler_db::DeleteOutcome;
use warbler_types::api::{FormView, HomeView, MessageForm};
use warbler_types::models::Message;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::IdPath;
use crate::middleware::CurrentUser;
use crate::{blocking, views};

/// GET / — the full feed for a logged-in user, the landing page otherwise.
pub async fn homepage(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    if current.get().is_none() {
        return Ok(views::render(jar, &current, StatusCode::OK, HomeView::Anonymous));
    }

    let rows = blocking(&state, |db| db.list_messages()).await?;
    let messages = rows.into_iter().map(Message::from).collect();

    Ok(views::render(jar, &current, StatusCode::OK, HomeView::Feed { messages }))
}

/// GET /messages/new
pub async fn new_message_form(
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    current.require()?;
    Ok(views::render(jar, &current, StatusCode::OK, FormView::new("new_message")))
}

/// POST /messages/new
pub async fn create_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Extension(current): Extension<CurrentUser>,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    if let Err(errors) = form.validate() {
        let view = FormView::new("new_message")
            .value("text", &form.text)
            .with_validation(&errors);
        return Ok(views::render(jar, &current, StatusCode::UNPROCESSABLE_ENTITY, view));
    }

    let text = form.text;
    blocking(&state, move |db| db.insert_message(user_id, &text)).await?;

    Ok(Redirect::to(&format!("/users/{}", user_id)).into_response())
}

/// POST /messages/{message_id}/delete — owner only.
pub async fn delete_message(
    State(state): State<AppState>,
    IdPath(message_id): IdPath,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, ApiError> {
    let user_id = current.require()?.id;

    let outcome = blocking(&state, move |db| db.delete_owned_message(message_id, user_id)).await?;

    match outcome {
        DeleteOutcome::Deleted => Ok(Redirect::to(&format!("/users/{}", user_id)).into_response()),
        DeleteOutcome::NotFound => Err(ApiError::NotFound),
        DeleteOutcome::NotOwner => {
            warn!("User {} tried to delete message {} they do not own", user_id, message_id);
            Err(ApiError::Unauthorized)
        }
    }
}
