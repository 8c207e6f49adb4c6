use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Username,
    Email,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Username => f.write_str("username"),
            IdentityField::Email => f.write_str("email"),
        }
    }
}

/// A write collided with the unique username or email of another user.
/// Raised from the constraint violation itself, never from a pre-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} already taken")]
pub struct DuplicateIdentity {
    pub field: IdentityField,
}
