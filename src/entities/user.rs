//! User entity - A registered account.
//!
//! Users own wishlist items, hold family memberships and reserve items for
//! other family members. The password credential is an opaque hash produced
//! by the credential service; this crate never sees plain passwords outside of
//! [`crate::core::user::PasswordHasher`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, unique across the installation
    #[sea_orm(unique)]
    pub email: String,
    /// Opaque password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Name shown to other family members
    pub display_name: String,
    /// Installation-wide administrator flag (not the family ADMIN role)
    pub is_admin: bool,
    /// Consecutive failed login attempts since the last success
    pub failed_login_attempts: i32,
    /// Logins are refused until this instant
    pub locked_until: Option<DateTimeUtc>,
    /// When the account was registered
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many family memberships
    #[sea_orm(has_many = "super::family_member::Entity")]
    FamilyMembers,
    /// One user owns many wishlist items
    #[sea_orm(has_many = "super::wishlist_item::Entity")]
    WishlistItems,
    /// One user holds many reservations
    #[sea_orm(has_many = "super::item_reservation::Entity")]
    Reservations,
    /// One user has many refresh tokens
    #[sea_orm(has_many = "super::refresh_token::Entity")]
    RefreshTokens,
}

impl Related<super::family_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FamilyMembers.def()
    }
}

impl Related<super::wishlist_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WishlistItems.def()
    }
}

impl Related<super::item_reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl Related<super::refresh_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RefreshTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
