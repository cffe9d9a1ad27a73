//! Refresh token entity - Hashes of refresh tokens issued by the credential service.
//!
//! Rows are revoked (deleted) when an admin resets a member's password, and
//! cascade away with their user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Refresh token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the token
    pub user_id: i64,
    /// Opaque hash of the token value
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// When the token stops being accepted
    pub expires_at: DateTimeUtc,
    /// When the token was issued
    pub created_at: DateTimeUtc,
}

/// Relations from a refresh token
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The user the token was issued to
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
