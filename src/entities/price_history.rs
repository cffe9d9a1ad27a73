//! Price history entity - Append-only price snapshots per wishlist item.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Price snapshot database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_history")]
pub struct Model {
    /// Unique identifier for the snapshot
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Item the price belongs to
    pub wishlist_item_id: i64,
    /// Recorded price
    pub price: f64,
    /// When the price was recorded
    pub recorded_at: DateTimeUtc,
}

/// Relations from a price snapshot
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The item whose price was recorded
    #[sea_orm(
        belongs_to = "super::wishlist_item::Entity",
        from = "Column::WishlistItemId",
        to = "super::wishlist_item::Column::Id",
        on_delete = "Cascade"
    )]
    WishlistItem,
}

impl Related<super::wishlist_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WishlistItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
