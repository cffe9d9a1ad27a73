//! Family member entity - Join table between users and families.
//!
//! A `(user_id, family_id)` pair is unique (enforced by an index created in
//! [`crate::config::database::create_tables`]). The role decides what the member
//! may manage; the status decides whether the membership counts at all.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role a member holds inside a family
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    /// May manage members, categories and the family itself
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    /// Regular member
    #[sea_orm(string_value = "MEMBER")]
    Member,
}

/// Lifecycle status of a membership
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberStatus {
    /// Counts as a member for every check
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Left the family; reactivated on rejoin
    #[sea_orm(string_value = "INACTIVE")]
    Inactive,
    /// Not yet admitted
    #[sea_orm(string_value = "PENDING")]
    Pending,
}

/// Family member database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "family_members")]
pub struct Model {
    /// Unique identifier for the membership row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Member user
    pub user_id: i64,
    /// Family the user belongs to
    pub family_id: i64,
    /// Role within the family
    pub role: MemberRole,
    /// Membership status
    pub status: MemberStatus,
    /// When the user (re)joined
    pub joined_at: DateTimeUtc,
}

impl Model {
    /// Whether this membership counts as an active admin.
    #[must_use]
    pub fn is_active_admin(&self) -> bool {
        self.status == MemberStatus::Active && self.role == MemberRole::Admin
    }
}

/// Defines relationships between `FamilyMember` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each membership belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Each membership belongs to one family
    #[sea_orm(
        belongs_to = "super::family::Entity",
        from = "Column::FamilyId",
        to = "super::family::Column::Id",
        on_delete = "Cascade"
    )]
    Family,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::family::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Family.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
