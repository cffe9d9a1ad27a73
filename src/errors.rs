//! Unified error type for the wishlist core.
//!
//! Business-rule rejections are distinct variants so callers (and tests) can
//! match on the kind of failure rather than on message text.

use crate::entities::MemberRole;
use thiserror::Error;

/// Every failure the wishlist core can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Settings could not be loaded or are inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// The persistence store reported a failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed input
    #[error("Validation failed: {message}")]
    Validation {
        /// Which rule was broken
        message: String,
    },

    /// The acting user has no membership row for the family
    #[error("You are not a member of this family")]
    NotAMember {
        /// Family that was requested
        family_id: i64,
    },

    /// The membership exists but is not active
    #[error("Your membership in this family is not active")]
    MembershipInactive {
        /// Family that was requested
        family_id: i64,
    },

    /// The member's role is not sufficient for the operation
    #[error("This action requires the {required:?} role")]
    InsufficientRole {
        /// Family that was requested
        family_id: i64,
        /// Role the operation needs
        required: MemberRole,
    },

    /// An admin targeted themselves through the family-management pathway
    #[error("You cannot {action} yourself here; use your account settings instead")]
    SelfActionForbidden {
        /// Operation that was attempted
        action: &'static str,
    },

    /// Demotion would leave the family without an active admin
    #[error("The last admin of a family cannot be demoted")]
    LastAdminCannotBeDemoted,

    /// Leaving would leave the remaining members without an active admin
    #[error("Promote another member to admin before leaving the family")]
    LastAdminCannotLeave,

    /// Admins cannot remove other admins
    #[error("Admins cannot be removed from the family")]
    CannotRemoveAdmin,

    /// Admins cannot delete other admins' accounts
    #[error("Admin accounts cannot be deleted by another admin")]
    CannotDeleteAdmin,

    /// A family can only be deleted by its last active member
    #[error("Family still has {active_members} active members")]
    FamilyNotEmpty {
        /// Active members at the time of the request
        active_members: u64,
    },

    /// Invite code is malformed or unknown
    #[error("Invalid invite code")]
    InvalidInviteCode,

    /// The family reached its member cap
    #[error("Family is full ({limit} members)")]
    FamilyFull {
        /// Configured cap
        limit: u64,
    },

    /// The user is already an active member of the family
    #[error("You are already a member of this family")]
    AlreadyMember,

    /// A referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Users cannot reserve items from their own wishlist
    #[error("You cannot reserve your own item")]
    CannotReserveOwnItem,

    /// The item already has an active reservation
    #[error("Item {item_id} is already reserved")]
    AlreadyReserved {
        /// Contested item
        item_id: i64,
    },

    /// Purchasing requires holding a reservation first
    #[error("Reserve item {item_id} before marking it purchased")]
    ReservationRequired {
        /// Item that was targeted
        item_id: i64,
    },

    /// Purchased reservations can no longer be cancelled
    #[error("Item {item_id} has already been purchased")]
    ReservationAlreadyPurchased {
        /// Item that was targeted
        item_id: i64,
    },

    /// Only the owner may change or delete an item
    #[error("Only the owner can modify item {item_id}")]
    NotItemOwner {
        /// Item that was targeted
        item_id: i64,
    },

    /// An item cannot move to another family's category
    #[error("Category belongs to a different family")]
    CrossFamilyCategory,

    /// Categories holding items cannot be deleted
    #[error("Category {category_id} still contains {item_count} items")]
    CategoryHasItems {
        /// Category that was targeted
        category_id: i64,
        /// Items still filed under it
        item_count: u64,
    },

    /// Logins are refused until the lockout expires
    #[error("Account is locked until {until}")]
    AccountLocked {
        /// End of the lockout
        until: chrono::DateTime<chrono::Utc>,
    },

    /// The caller exceeded its request budget
    #[error("Too many requests, retry in {retry_after_secs}s")]
    RateLimited {
        /// Seconds until the window resets
        retry_after_secs: u64,
    },

    /// No unique invite code could be drawn
    #[error("Could not generate a unique invite code after {attempts} attempts")]
    InviteCodeExhausted {
        /// Attempts made
        attempts: usize,
    },
}

impl Error {
    /// Shorthand for a [`Error::Validation`] with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] keyed by a numeric id.
    #[must_use]
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
