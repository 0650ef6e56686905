//! User account management commands.
//!
//! Admin accounts cannot be created through the API; this is the only way
//! to get one.
//!
//! # Usage
//!
//! ```bash
//! fitsphere user create -u coach -e coach@example.com -p 'a long password' -r admin
//! ```

use fitsphere_api::services::auth::{AuthError, AuthService};
use fitsphere_core::{Role, UserId};
use thiserror::Error;

use super::CommandError;

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the role is unknown, the account details are invalid,
/// or the email or username is already taken.
pub async fn create(
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> Result<UserId, UserError> {
    let role: Role = role
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;

    let pool = super::connect().await?;

    let user = AuthService::new(&pool)
        .create_user(username, email, password, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}
