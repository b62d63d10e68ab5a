//! Document schema rules shared by every repository backend.
//!
//! Messages follow the document store's wire format:
//! `"<Model> validation failed: <field>: <reason>, <field>: <reason>"` for inserts
//! and `"Validation failed: <field>: <reason>"` for update validators.

use crate::models::{BlogChanges, NewBlog, NewUser};
use crate::repository::StoreError;

pub const REQUIRED: &str = "field is mandatory";
pub const MIN_LENGTH: &str = "should be at least 3 characters long";
pub const USERNAME_MIN_LENGTH: usize = 3;

pub fn unique_reason(field: &str, value: &str) -> String {
    format!("Error, expected `{field}` to be unique. Value: `{value}`")
}

/// Collects the first failing rule per field, in schema field order.
#[derive(Debug, Default)]
struct FieldErrors(Vec<(&'static str, String)>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, reason: impl Into<String>) {
        self.0.push((field, reason.into()));
    }

    fn into_result(self, prefix: &str) -> Result<(), StoreError> {
        if self.0.is_empty() {
            return Ok(());
        }
        let fields = self
            .0
            .iter()
            .map(|(field, reason)| format!("{field}: {reason}"))
            .collect::<Vec<_>>()
            .join(", ");
        Err(StoreError::Validation(format!("{prefix}: {fields}")))
    }
}

fn is_missing(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// validate_new_user
///
/// `username_taken` is the store's answer to the uniqueness lookup; it is only
/// consulted when the username passes the required and length rules.
pub fn validate_new_user(user: &NewUser, username_taken: bool) -> Result<(), StoreError> {
    let mut errors = FieldErrors::default();
    match user.username.as_deref() {
        None | Some("") => errors.push("username", REQUIRED),
        Some(name) if name.chars().count() < USERNAME_MIN_LENGTH => {
            errors.push("username", MIN_LENGTH)
        }
        Some(name) if username_taken => errors.push("username", unique_reason("username", name)),
        Some(_) => {}
    }
    if user.password_hash.is_empty() {
        errors.push("passwordHash", REQUIRED);
    }
    errors.into_result("User validation failed")
}

pub fn validate_new_blog(blog: &NewBlog) -> Result<(), StoreError> {
    let mut errors = FieldErrors::default();
    if is_missing(blog.title.as_deref()) {
        errors.push("title", REQUIRED);
    }
    if is_missing(blog.url.as_deref()) {
        errors.push("url", REQUIRED);
    }
    errors.into_result("Blog validation failed")
}

/// Update validators only see the fields being set.
pub fn validate_blog_changes(changes: &BlogChanges) -> Result<(), StoreError> {
    let mut errors = FieldErrors::default();
    if changes.title.as_deref() == Some("") {
        errors.push("title", REQUIRED);
    }
    if changes.url.as_deref() == Some("") {
        errors.push("url", REQUIRED);
    }
    errors.into_result("Validation failed")
}

/// Uniqueness failure raised when the store itself rejects a duplicate
/// username that slipped past the pre-insert lookup.
pub fn duplicate_username(username: &str) -> StoreError {
    StoreError::Validation(format!(
        "User validation failed: username: {}",
        unique_reason("username", username)
    ))
}
