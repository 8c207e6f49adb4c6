use crate::Database;
use crate::error::{DuplicateIdentity, IdentityField};
use crate::models::{LikeRow, MessageRow, NewUser, UserRow};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row, ffi};
use tracing::{debug, info};
use warbler_types::models::{DEFAULT_IMAGE_URL, UserStats};

const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.image_url, u.header_image_url, u.bio, u.location, u.password";

// JOIN users to fetch the author in the same query (no N+1)
const MESSAGE_SELECT: &str = "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url
     FROM messages m
     JOIN users u ON m.user_id = u.id";

/// Result of an owner-checked message delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    NotOwner,
}

impl Database {
    // -- Users --

    /// Insert a user. A unique-constraint hit on username or email comes back
    /// as `Ok(Err(DuplicateIdentity))` and leaves no row behind.
    pub fn create_user(&self, new: &NewUser<'_>) -> Result<Result<UserRow, DuplicateIdentity>> {
        self.with_tx(|tx| {
            let inserted = tx
                .execute(
                    "INSERT INTO users (username, email, password, image_url) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        new.username,
                        new.email,
                        new.password_hash,
                        new.image_url.unwrap_or(DEFAULT_IMAGE_URL),
                    ],
                )
                .conflict()?;

            if let Err(dup) = inserted {
                return Ok(Err(dup));
            }

            let id = tx.last_insert_rowid();
            let user = query_user_by_id(tx, id)?
                .ok_or_else(|| anyhow!("User {} missing right after insert", id))?;

            info!("Created user {} ({})", user.username, user.id);
            Ok(Ok(user))
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    /// Case-insensitive substring search on username. `None` or an empty
    /// query lists everyone. `%` and `_` in the query match literally.
    pub fn search_users(&self, query: Option<&str>) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let query = query.map(str::trim).filter(|q| !q.is_empty());

            let rows = match query {
                None => {
                    let sql = format!("SELECT {} FROM users u ORDER BY u.id", USER_COLUMNS);
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([], user_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
                Some(q) => {
                    let sql = format!(
                        "SELECT {} FROM users u WHERE u.username LIKE ?1 ESCAPE '\\' ORDER BY u.id",
                        USER_COLUMNS
                    );
                    let pattern = format!("%{}%", escape_like(q));
                    let mut stmt = conn.prepare(&sql)?;
                    let rows = stmt
                        .query_map([pattern], user_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    rows
                }
            };

            Ok(rows)
        })
    }

    /// Change a user's username and email. The only profile mutation.
    pub fn update_user_identity(
        &self,
        id: i64,
        username: &str,
        email: &str,
    ) -> Result<Result<UserRow, DuplicateIdentity>> {
        self.with_tx(|tx| {
            let updated = tx
                .execute(
                    "UPDATE users SET username = ?1, email = ?2 WHERE id = ?3",
                    rusqlite::params![username, email, id],
                )
                .conflict()?;

            match updated {
                Err(dup) => Ok(Err(dup)),
                Ok(0) => Err(anyhow!("User not found: {}", id)),
                Ok(_) => {
                    let user = query_user_by_id(tx, id)?
                        .ok_or_else(|| anyhow!("User not found: {}", id))?;
                    Ok(Ok(user))
                }
            }
        })
    }

    /// Delete a user. Messages, follow edges in both directions and likes go
    /// with it through ON DELETE CASCADE.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if deleted > 0 {
                info!("Deleted user {}", id);
            }
            Ok(deleted > 0)
        })
    }

    pub fn user_stats(&self, id: i64) -> Result<UserStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_following_id = ?1),
                    (SELECT COUNT(*) FROM likes WHERE user_id = ?1)",
                [id],
                |row| {
                    Ok(UserStats {
                        messages: row.get::<_, i64>(0)? as u64,
                        followers: row.get::<_, i64>(1)? as u64,
                        following: row.get::<_, i64>(2)? as u64,
                        likes: row.get::<_, i64>(3)? as u64,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, user_id: i64, text: &str) -> Result<MessageRow> {
        self.with_tx(|tx| {
            tx.execute(
                "INSERT INTO messages (text, user_id) VALUES (?1, ?2)",
                rusqlite::params![text, user_id],
            )?;

            let id = tx.last_insert_rowid();
            let message = query_message(tx, id)?
                .ok_or_else(|| anyhow!("Message {} missing right after insert", id))?;

            debug!("User {} posted message {}", user_id, id);
            Ok(message)
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| query_message(conn, id))
    }

    /// Every message, newest first.
    pub fn list_messages(&self) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!("{} ORDER BY m.timestamp DESC, m.id DESC", MESSAGE_SELECT);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// A user's own messages, newest first, at most `limit`.
    pub fn list_user_messages(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE m.user_id = ?1 ORDER BY m.timestamp DESC, m.id DESC LIMIT ?2",
                MESSAGE_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a message only if `user_id` owns it.
    pub fn delete_owned_message(&self, id: i64, user_id: i64) -> Result<DeleteOutcome> {
        self.with_tx(|tx| {
            let owner: Option<i64> = tx
                .query_row("SELECT user_id FROM messages WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;

            match owner {
                None => Ok(DeleteOutcome::NotFound),
                Some(owner) if owner != user_id => Ok(DeleteOutcome::NotOwner),
                Some(_) => {
                    tx.execute("DELETE FROM messages WHERE id = ?1", [id])?;
                    debug!("User {} deleted message {}", user_id, id);
                    Ok(DeleteOutcome::Deleted)
                }
            }
        })
    }

    // -- Follows --

    /// Record that `follower_id` follows `followed_id`. Returns `None` when the
    /// followed user does not exist, otherwise whether a new edge was written.
    /// Following yourself is allowed.
    pub fn follow(&self, follower_id: i64, followed_id: i64) -> Result<Option<bool>> {
        self.with_tx(|tx| {
            if query_user_by_id(tx, followed_id)?.is_none() {
                return Ok(None);
            }

            let inserted = tx.execute(
                "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
                rusqlite::params![followed_id, follower_id],
            )?;
            Ok(Some(inserted > 0))
        })
    }

    pub fn unfollow(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                rusqlite::params![followed_id, follower_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_following(&self, follower_id: i64, followed_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                    rusqlite::params![followed_id, follower_id],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Users following `user_id`.
    pub fn list_followers(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM follows f
                 JOIN users u ON u.id = f.user_following_id
                 WHERE f.user_being_followed_id = ?1
                 ORDER BY u.username",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users that `user_id` follows.
    pub fn list_following(&self, user_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM follows f
                 JOIN users u ON u.id = f.user_being_followed_id
                 WHERE f.user_following_id = ?1
                 ORDER BY u.username",
                USER_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Likes --

    /// Add a like. Liking the same message twice writes a second edge.
    /// Returns `None` when the message does not exist.
    pub fn add_like(&self, user_id: i64, message_id: i64) -> Result<Option<LikeRow>> {
        self.with_tx(|tx| {
            if query_message(tx, message_id)?.is_none() {
                return Ok(None);
            }

            tx.execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)",
                rusqlite::params![user_id, message_id],
            )?;

            Ok(Some(LikeRow {
                id: tx.last_insert_rowid(),
                user_id,
                message_id,
            }))
        })
    }

    /// Remove every like `user_id` has on `message_id`.
    pub fn remove_likes(&self, user_id: i64, message_id: i64) -> Result<usize> {
        self.with_tx(|tx| {
            let removed = tx.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                rusqlite::params![user_id, message_id],
            )?;
            Ok(removed)
        })
    }

    /// Messages `user_id` has liked, newest first, each listed once.
    pub fn list_liked_messages(&self, user_id: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{} WHERE m.id IN (SELECT message_id FROM likes WHERE user_id = ?1)
                 ORDER BY m.timestamp DESC, m.id DESC",
                MESSAGE_SELECT
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password: row.get(7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        text: row.get(1)?,
        timestamp: row.get(2)?,
        user_id: row.get(3)?,
        username: row.get(4)?,
        image_url: row.get(5)?,
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users u WHERE u.username = ?1", USER_COLUMNS);
    let row = conn.query_row(&sql, [username], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users u WHERE u.id = ?1", USER_COLUMNS);
    let row = conn.query_row(&sql, [id], user_from_row).optional()?;
    Ok(row)
}

fn query_message(conn: &Connection, id: i64) -> Result<Option<MessageRow>> {
    let sql = format!("{} WHERE m.id = ?1", MESSAGE_SELECT);
    let row = conn.query_row(&sql, [id], message_from_row).optional()?;
    Ok(row)
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extension trait that splits unique-constraint failures out of a write.
trait ConflictExt<T> {
    fn conflict(self) -> Result<std::result::Result<T, DuplicateIdentity>>;
}

impl<T> ConflictExt<T> for std::result::Result<T, rusqlite::Error> {
    fn conflict(self) -> Result<std::result::Result<T, DuplicateIdentity>> {
        match self {
            Ok(val) => Ok(Ok(val)),
            Err(rusqlite::Error::SqliteFailure(err, msg))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                // SQLite names the column: "UNIQUE constraint failed: users.email"
                let field = match msg.as_deref() {
                    Some(m) if m.contains("users.email") => IdentityField::Email,
                    _ => IdentityField::Username,
                };
                Ok(Err(DuplicateIdentity { field }))
            }
            Err(e) => Err(e.into()),
        }
    }
}
