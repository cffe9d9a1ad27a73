//! User accounts - lookups, lockout bookkeeping and cascading deletion.
//!
//! Password hashing and token issuance belong to the credential service; this
//! module only stores the opaque hash it produces and tracks failed logins.

use crate::{
    config::SecuritySettings,
    entities::{RefreshToken, User, refresh_token, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{Set, prelude::*};
use tracing::{info, warn};

/// Hashes passwords for storage. Implemented by the credential service.
pub trait PasswordHasher: Send + Sync {
    /// Produces the stored form of `password`.
    fn hash_password(&self, password: &str) -> Result<String>;
}

/// Shortest password accepted when an admin resets a member's password
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registers a user with an already-hashed credential.
///
/// The email is trimmed and lower-cased before it is stored.
///
/// # Errors
/// Returns an error if:
/// - The email is not plausibly an address
/// - The display name is empty or whitespace-only
/// - The email is already registered
pub async fn create_user(
    db: &DatabaseConnection,
    email: &str,
    password_hash: String,
    display_name: &str,
) -> Result<user::Model> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') || email.len() < 3 {
        return Err(Error::validation("Email address is not valid"));
    }
    if display_name.trim().is_empty() {
        return Err(Error::validation("Display name cannot be empty"));
    }
    if find_user_by_email(db, &email).await?.is_some() {
        return Err(Error::validation("Email address is already registered"));
    }

    let now = Utc::now();
    let user = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        display_name: Set(display_name.trim().to_string()),
        is_admin: Set(false),
        failed_login_attempts: Set(0),
        locked_until: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let user = user.insert(db).await?;
    info!(user_id = user.id, "Registered user");
    Ok(user)
}

/// Finds a user by id.
///
/// # Errors
/// [`Error::NotFound`] if no such user exists.
pub async fn get_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))
}

/// Finds a user by email, case-insensitively.
pub async fn find_user_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Whether logins are currently refused for `user`.
#[must_use]
pub fn is_locked(user: &user::Model, now: DateTime<Utc>) -> bool {
    user.locked_until.is_some_and(|until| until > now)
}

/// Fails with [`Error::AccountLocked`] while a lockout is in force.
pub fn ensure_not_locked(user: &user::Model, now: DateTime<Utc>) -> Result<()> {
    match user.locked_until {
        Some(until) if until > now => Err(Error::AccountLocked { until }),
        _ => Ok(()),
    }
}

/// Counts a failed login and locks the account once the limit is reached.
///
/// An expired lockout starts a fresh count.
pub async fn record_failed_login(
    db: &DatabaseConnection,
    user_id: i64,
    security: &SecuritySettings,
) -> Result<user::Model> {
    let user = get_user(db, user_id).await?;
    let now = Utc::now();

    let lockout_expired = user.locked_until.is_some_and(|until| until <= now);
    let previous = if lockout_expired {
        0
    } else {
        user.failed_login_attempts
    };
    let attempts = previous.saturating_add(1);

    let mut active: user::ActiveModel = user.into();
    active.failed_login_attempts = Set(attempts);
    if attempts >= security.max_failed_logins {
        let until = now + Duration::minutes(security.lockout_minutes);
        warn!(user_id, attempts, %until, "Locking account after failed logins");
        active.locked_until = Set(Some(until));
    } else if lockout_expired {
        active.locked_until = Set(None);
    }
    active.updated_at = Set(now);
    active.update(db).await.map_err(Into::into)
}

/// Clears the failed-login counter and any lockout.
pub async fn record_successful_login(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<user::Model> {
    let user = get_user(db, user_id).await?;
    clear_lockout(db, user).await
}

async fn clear_lockout<C>(db: &C, user: user::Model) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let mut active: user::ActiveModel = user.into();
    active.failed_login_attempts = Set(0);
    active.locked_until = Set(None);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Stores a new password hash, clears any lockout and revokes refresh tokens.
///
/// Callers run this inside a transaction.
pub async fn replace_password_hash<C>(db: &C, user_id: i64, password_hash: String) -> Result<u64>
where
    C: ConnectionTrait,
{
    let user = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    let user = active.update(db).await?;
    clear_lockout(db, user).await?;
    revoke_refresh_tokens(db, user_id).await
}

/// Deletes every refresh token issued to `user_id`, returning how many went.
pub async fn revoke_refresh_tokens<C>(db: &C, user_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = RefreshToken::delete_many()
        .filter(refresh_token::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes a user; memberships, items, reservations and tokens cascade with it.
///
/// # Errors
/// [`Error::NotFound`] if no such user exists.
pub async fn delete_user<C>(db: &C, user_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = User::delete_by_id(user_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("user", user_id));
    }
    info!(user_id, "Deleted user and all owned records");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_user(&db, "not-an-email", "hash".to_string(), "Alice").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let result = create_user(&db, "alice@example.com", "hash".to_string(), "   ").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_user_normalizes_email() -> Result<()> {
        let db = setup_test_db().await?;

        let user = create_user(&db, "  Alice@Example.COM ", "hash".to_string(), " Alice ").await?;
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.display_name, "Alice");
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.locked_until.is_none());

        let found = find_user_by_email(&db, "ALICE@example.com").await?;
        assert_eq!(found.unwrap().id, user.id);

        let duplicate = create_user(&db, "alice@example.com", "hash".to_string(), "Other").await;
        assert!(matches!(
            duplicate.unwrap_err(),
            Error::Validation { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_lockout_after_max_failed_logins() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let security = SecuritySettings {
            max_failed_logins: 3,
            lockout_minutes: 15,
        };

        let user = record_failed_login(&db, alice.id, &security).await?;
        assert_eq!(user.failed_login_attempts, 1);
        assert!(!is_locked(&user, Utc::now()));

        record_failed_login(&db, alice.id, &security).await?;
        let user = record_failed_login(&db, alice.id, &security).await?;
        assert_eq!(user.failed_login_attempts, 3);
        assert!(is_locked(&user, Utc::now()));
        assert!(matches!(
            ensure_not_locked(&user, Utc::now()).unwrap_err(),
            Error::AccountLocked { until: _ }
        ));

        // Lockout lapses on its own
        assert!(!is_locked(&user, Utc::now() + Duration::minutes(16)));

        let user = record_successful_login(&db, alice.id).await?;
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.locked_until.is_none());
        ensure_not_locked(&user, Utc::now())?;

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_user(&db, 77).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "user",
                id: _
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_password_hash_revokes_tokens() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        create_test_refresh_token(&db, alice.id, "token-a").await?;
        create_test_refresh_token(&db, alice.id, "token-b").await?;

        let revoked = replace_password_hash(&db, alice.id, "new-hash".to_string()).await?;
        assert_eq!(revoked, 2);

        let user = get_user(&db, alice.id).await?;
        assert_eq!(user.password_hash, "new-hash");

        Ok(())
    }
}
