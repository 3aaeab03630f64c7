//! Admin account forms and the client-side rules checked before any
//! request is sent.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Body for `POST /api/auth/admins`.
#[derive(Clone, Serialize, Validate)]
pub struct NewAdmin {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    pub display_name: Option<String>,
}

impl NewAdmin {
    /// Blank display names are sent as `null`.
    pub fn new(username: impl Into<String>, password: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            display_name: display_name.filter(|name| !name.trim().is_empty()),
        }
    }

    /// Check the form, reporting the first failing rule.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(first_error)
    }
}

impl std::fmt::Debug for NewAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAdmin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// First-run bootstrap form: a [`NewAdmin`] plus password confirmation.
#[derive(Clone, Validate)]
pub struct SetupAdmin {
    #[validate(length(min = 3, message = "Username must be at least 3 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    pub display_name: Option<String>,
}

impl SetupAdmin {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(first_error)
    }

    /// The account to create once the form passes.
    pub fn into_new_admin(self) -> NewAdmin {
        NewAdmin::new(self.username, self.password, self.display_name)
    }
}

impl std::fmt::Debug for SetupAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupAdmin")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Collapse validator output into one message.
///
/// Fields are checked in name order, which puts the confirmation check
/// before the password length and the password before the username.
fn first_error(errors: ValidationErrors) -> CoreError {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().collect();
    names.sort();

    let message = names
        .first()
        .and_then(|name| fields.get(*name))
        .and_then(|errs| errs.first())
        .map(|err| {
            err.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| err.code.to_string())
        })
        .unwrap_or_else(|| "Invalid input".to_string());

    CoreError::Validation(message)
}

/// Admin account as listed by `GET /api/auth/admins`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: DbId,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}

impl AdminAccount {
    /// Display name, or the username when none is set.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}
