/// Database row types — these map directly to SQLite rows.
/// Distinct from warbler-types models to keep the DB layer independent.
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use warbler_types::models::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, Message, User};

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub image_url: Option<String>,
    pub header_image_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub password: String,
}

/// Message joined with its author's username and avatar.
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub user_id: i64,
    pub username: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct LikeRow {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
}

/// Fields of a user being created. `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub image_url: Option<&'a str>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            image_url: row.image_url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
            header_image_url: row
                .header_image_url
                .unwrap_or_else(|| DEFAULT_HEADER_IMAGE_URL.to_string()),
            bio: row.bio,
            location: row.location,
        }
    }
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        let timestamp = parse_timestamp(&row.timestamp).unwrap_or_else(|| {
            warn!("Corrupt timestamp '{}' on message {}", row.timestamp, row.id);
            DateTime::default()
        });

        Self {
            id: row.id,
            text: row.text,
            timestamp,
            user_id: row.user_id,
            username: row.username,
            image_url: row.image_url.unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
        }
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS.SSS" without timezone.
/// Parse as naive UTC, falling back to RFC 3339 for rows written elsewhere.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|ndt| ndt.and_utc())
        .or_else(|_| raw.parse::<DateTime<Utc>>())
        .ok()
}
