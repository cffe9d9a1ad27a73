//! Wishlist item entity - Something a user would like to receive.
//!
//! Items are owned by the user who created them and filed under a category,
//! which in turn ties them to a family.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How much the owner wants the item
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Nice to have
    #[sea_orm(string_value = "LOW")]
    Low,
    /// Default priority
    #[sea_orm(string_value = "MEDIUM")]
    #[default]
    Medium,
    /// Strongly wanted
    #[sea_orm(string_value = "HIGH")]
    High,
    /// Needed soon
    #[sea_orm(string_value = "URGENT")]
    Urgent,
}

/// Wishlist item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wishlist_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short title (e.g., "Headphones")
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Approximate price in the family currency, never negative
    pub price: Option<f64>,
    /// Where the item can be bought
    pub product_url: Option<String>,
    /// Picture of the item
    pub image_url: Option<String>,
    /// How much the owner wants it
    pub priority: Priority,
    /// Free-form notes from the owner (size, colour, ...)
    pub notes: Option<String>,
    /// User who created and owns the item
    pub owner_user_id: i64,
    /// Category the item is filed under
    pub category_id: i64,
    /// When the item was created
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `WishlistItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    /// Each item is filed under one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Cascade"
    )]
    Category,
    /// One item has many reservations over its lifetime
    #[sea_orm(has_many = "super::item_reservation::Entity")]
    Reservations,
    /// One item has many price snapshots
    #[sea_orm(has_many = "super::price_history::Entity")]
    PriceHistory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::item_reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservations.def()
    }
}

impl Related<super::price_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PriceHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
