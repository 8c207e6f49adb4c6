/// Warbler Crypto Library
///
/// Credential storage only: salted Argon2id hashes in PHC string format.
/// Nothing here is reversible; a stored hash can only be checked against a
/// candidate password.

pub mod password;

pub use password::{hash, verify, verify_dummy};
