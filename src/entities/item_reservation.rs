//! Item reservation entity - A family member's claim on someone else's item.
//!
//! At most one reservation per item may be RESERVED or PURCHASED at a time.
//! The store backs this with a partial unique index on `wishlist_item_id`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// State of a reservation
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    /// Claimed, not yet bought
    #[sea_orm(string_value = "RESERVED")]
    Reserved,
    /// Bought; terminal
    #[sea_orm(string_value = "PURCHASED")]
    Purchased,
    /// Withdrawn by the reserver (only kept when cancellation history is retained)
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl ReservationStatus {
    /// Statuses that block anyone else from reserving the item.
    pub const ACTIVE: [Self; 2] = [Self::Reserved, Self::Purchased];

    /// Whether this status counts toward the one-active-reservation rule.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Reserved | Self::Purchased)
    }
}

/// Item reservation database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_reservations")]
pub struct Model {
    /// Unique identifier for the reservation
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Reserved item
    pub wishlist_item_id: i64,
    /// User holding the reservation
    pub reserved_by_user_id: i64,
    /// Current state
    pub status: ReservationStatus,
    /// When the reservation was made
    pub reserved_at: DateTimeUtc,
    /// When the item was marked as bought
    pub purchased_at: Option<DateTimeUtc>,
    /// Private notes from the purchaser
    pub purchase_notes: Option<String>,
}

/// Defines relationships between `ItemReservation` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each reservation targets one item
    #[sea_orm(
        belongs_to = "super::wishlist_item::Entity",
        from = "Column::WishlistItemId",
        to = "super::wishlist_item::Column::Id",
        on_delete = "Cascade"
    )]
    WishlistItem,
    /// Each reservation is held by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReservedByUserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    ReservedBy,
}

impl Related<super::wishlist_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WishlistItem.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReservedBy.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
