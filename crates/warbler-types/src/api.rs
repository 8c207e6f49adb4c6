use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{MAX_MESSAGE_LEN, Message, User, UserStats, UserSummary};

// -- Forms --
//
// Every field defaults to empty so that a missing field is reported by
// validation rather than rejected by the extractor.

/// Present and not just whitespace.
fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("This field is required."));
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Field must be at least 6 characters long."))]
    pub password: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct MessageForm {
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        length(max = MAX_MESSAGE_LEN, message = "Messages must be at most 140 characters.")
    )]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 20, message = "Field must be between 3 and 20 characters long."))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email address."))]
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub q: Option<String>,
}

// -- Flash --

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashCategory {
    Success,
    Danger,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub category: FlashCategory,
    pub message: String,
}

// -- Views --

/// Envelope for every rendered page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub flashes: Vec<Flash>,
    pub current_user: Option<UserSummary>,
    #[serde(flatten)]
    pub body: T,
}

/// A form, its echoed values (never passwords), and per-field errors.
#[derive(Debug, Default, Serialize)]
pub struct FormView {
    pub form: String,
    pub values: BTreeMap<String, String>,
    pub errors: BTreeMap<String, Vec<String>>,
}

impl FormView {
    pub fn new(form: &str) -> Self {
        Self {
            form: form.to_string(),
            ..Default::default()
        }
    }

    pub fn value(mut self, field: &str, value: &str) -> Self {
        self.values.insert(field.to_string(), value.to_string());
        self
    }

    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
        self
    }

    pub fn with_validation(mut self, errors: &ValidationErrors) -> Self {
        for (field, field_errors) in errors.field_errors() {
            let messages = self.errors.entry(field.to_string()).or_default();
            for err in field_errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                messages.push(message);
            }
        }
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum HomeView {
    Feed { messages: Vec<Message> },
    Anonymous,
}

#[derive(Debug, Serialize)]
pub struct UserListView {
    pub query: Option<String>,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub user: UserSummary,
    pub header_image_url: String,
    pub location: Option<String>,
    pub stats: UserStats,
    pub messages: Vec<Message>,
}

impl ProfileView {
    pub fn new(user: &User, stats: UserStats, messages: Vec<Message>) -> Self {
        Self {
            user: user.into(),
            header_image_url: user.header_image_url.clone(),
            location: user.location.clone(),
            stats,
            messages,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowListView {
    pub user: UserSummary,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct LikesView {
    pub user: UserSummary,
    pub messages: Vec<Message>,
}
