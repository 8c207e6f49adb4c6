//! One-shot notices carried to the next rendered page in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use tracing::warn;

use warbler_types::api::{Flash, FlashCategory};

pub const FLASH_COOKIE: &str = "flash";

/// Queue a flash message, keeping any that are already pending.
pub fn push(jar: CookieJar, category: FlashCategory, message: &str) -> CookieJar {
    let mut pending = read(&jar);
    pending.push(Flash {
        category,
        message: message.to_string(),
    });

    let encoded = match serde_json::to_vec(&pending) {
        Ok(json) => B64.encode(json),
        Err(e) => {
            warn!("Dropping flash message, encode failed: {}", e);
            return jar;
        }
    };

    jar.add(
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drain pending messages; the returned jar clears the cookie.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let pending = read(&jar);
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), pending)
}

fn read(jar: &CookieJar) -> Vec<Flash> {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return Vec::new();
    };

    B64.decode(cookie.value())
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}
