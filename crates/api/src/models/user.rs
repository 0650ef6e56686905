//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fitsphere_core::{Email, Role, UserId};

/// A FitSphere account.
///
/// Never carries the password hash; that is loaded separately when a login
/// needs to be verified.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Name and email shown for the customer of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
}

impl CustomerContact {
    /// Placeholder for orders whose account has been deleted.
    #[must_use]
    pub fn deleted_user() -> Self {
        Self {
            name: "Deleted user".to_owned(),
            email: "unknown".to_owned(),
        }
    }
}

impl From<&User> for CustomerContact {
    fn from(user: &User) -> Self {
        Self {
            name: user.username.clone(),
            email: user.email.to_string(),
        }
    }
}
