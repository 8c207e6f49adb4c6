use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use serde::Serialize;

use warbler_types::api::Page;

use crate::flash;
use crate::middleware::CurrentUser;

/// Render a page: drains pending flashes into it and clears their cookie.
pub fn render<T: Serialize>(
    jar: CookieJar,
    current: &CurrentUser,
    status: StatusCode,
    body: T,
) -> Response {
    let (jar, flashes) = flash::take(jar);
    let page = Page {
        flashes,
        current_user: current.summary(),
        body,
    };
    (status, jar, Json(page)).into_response()
}
