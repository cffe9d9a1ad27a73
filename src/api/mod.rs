//! API surface - the thin layer a transport (HTTP, RPC, ...) calls into.
//!
//! Handlers take the shared [`AppState`], the already-authenticated [`Principal`]
//! and a validated request, call the core, and hand back plain result structs or
//! a typed [`crate::errors::Error`] for the transport to map to a response.

/// Family, membership and category handlers
pub mod families;
/// Injectable request throttling
pub mod rate_limit;
/// Request bodies and their structural validation
pub mod requests;
/// Item and reservation handlers
pub mod wishlist;

use crate::{
    config::Settings,
    core::{
        invite::{InviteCodeGenerator, RandomInviteCodes},
        user::PasswordHasher,
    },
    entities::user,
};
use rate_limit::{FixedWindowRateLimiter, RateLimiter};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

/// The authenticated caller, as resolved by the credential service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// User id
    pub id: i64,
    /// Login email
    pub email: String,
    /// Display name
    pub name: String,
    /// Site-wide administrator flag
    pub is_admin: bool,
}

impl From<&user::Model> for Principal {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Shared state available to every handler.
pub struct AppState {
    /// Database connection for all operations
    pub database: DatabaseConnection,
    /// Loaded application settings
    pub settings: Arc<Settings>,
    /// Source of new invite codes
    pub invite_codes: Arc<dyn InviteCodeGenerator>,
    /// Throttle for invite-code joins
    pub rate_limiter: Arc<dyn RateLimiter>,
    /// Credential hasher used for admin password resets
    pub password_hasher: Arc<dyn PasswordHasher>,
}

impl AppState {
    /// Creates the state with random invite codes and a fixed-window limiter
    /// configured from `settings.rate_limit`.
    #[must_use]
    pub fn new(
        database: DatabaseConnection,
        settings: Settings,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let rate_limiter = Arc::new(FixedWindowRateLimiter::new(&settings.rate_limit));
        Self {
            database,
            settings: Arc::new(settings),
            invite_codes: Arc::new(RandomInviteCodes),
            rate_limiter,
            password_hasher,
        }
    }

    /// Replaces the invite code source.
    #[must_use]
    pub fn with_invite_codes(mut self, invite_codes: Arc<dyn InviteCodeGenerator>) -> Self {
        self.invite_codes = invite_codes;
        self
    }

    /// Replaces the rate limiter.
    #[must_use]
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }
}
