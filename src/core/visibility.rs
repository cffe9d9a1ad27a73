//! Item views - what a given viewer may see of an item and its reservation.
//!
//! The owner of an item only ever learns its aggregate status. The reserving
//! member sees the full reservation, notes included. Other family members see
//! who holds the reservation, so nobody buys the same gift twice, but not the
//! purchaser's private notes.

use crate::entities::{ItemReservationModel, ReservationStatus, WishlistItemModel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate state of an item as every viewer sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// No active reservation
    Available,
    /// Someone has claimed it
    Reserved,
    /// Someone has bought it
    Purchased,
}

/// Reservation details shown to viewers other than the item owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservationView {
    /// Reservation row id
    pub reservation_id: i64,
    /// Member holding the reservation
    pub reserved_by_user_id: i64,
    /// Whether the viewer holds this reservation
    pub reserved_by_me: bool,
    /// When the item was claimed
    pub reserved_at: DateTime<Utc>,
    /// When the item was bought
    pub purchased_at: Option<DateTime<Utc>>,
    /// Only present for the reserving member
    pub purchase_notes: Option<String>,
}

/// An item as presented to one particular viewer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemView {
    /// The item itself
    pub item: WishlistItemModel,
    /// Aggregate reservation state
    pub status: ItemStatus,
    /// Whether the viewer owns the item
    pub is_owner: bool,
    /// Never present when the viewer is the owner
    pub reservation: Option<ReservationView>,
}

/// Builds the view of `item` for `viewer_id` given its active reservation, if any.
///
/// Reservations that are not RESERVED or PURCHASED are treated as absent.
#[must_use]
pub fn derive_item_view(
    item: WishlistItemModel,
    active: Option<&ItemReservationModel>,
    viewer_id: i64,
) -> ItemView {
    let active = active.filter(|r| r.status.is_active());
    let status = match active.map(|r| r.status) {
        None | Some(ReservationStatus::Cancelled) => ItemStatus::Available,
        Some(ReservationStatus::Reserved) => ItemStatus::Reserved,
        Some(ReservationStatus::Purchased) => ItemStatus::Purchased,
    };

    let is_owner = item.owner_user_id == viewer_id;
    let reservation = if is_owner {
        None
    } else {
        active.map(|r| {
            let reserved_by_me = r.reserved_by_user_id == viewer_id;
            ReservationView {
                reservation_id: r.id,
                reserved_by_user_id: r.reserved_by_user_id,
                reserved_by_me,
                reserved_at: r.reserved_at,
                purchased_at: r.purchased_at,
                purchase_notes: if reserved_by_me {
                    r.purchase_notes.clone()
                } else {
                    None
                },
            }
        })
    };

    ItemView {
        item,
        status,
        is_owner,
        reservation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Priority;

    const OWNER: i64 = 1;
    const RESERVER: i64 = 2;
    const RELATIVE: i64 = 3;

    fn item() -> WishlistItemModel {
        let now = Utc::now();
        WishlistItemModel {
            id: 10,
            title: "Headphones".to_string(),
            description: None,
            price: Some(199.0),
            product_url: None,
            image_url: None,
            priority: Priority::High,
            notes: None,
            owner_user_id: OWNER,
            category_id: 5,
            created_at: now,
            updated_at: now,
        }
    }

    fn reservation(status: ReservationStatus) -> ItemReservationModel {
        let now = Utc::now();
        let purchased = status == ReservationStatus::Purchased;
        ItemReservationModel {
            id: 100,
            wishlist_item_id: 10,
            reserved_by_user_id: RESERVER,
            status,
            reserved_at: now,
            purchased_at: purchased.then_some(now),
            purchase_notes: purchased.then(|| "Gift wrapped, in the attic".to_string()),
        }
    }

    #[test]
    fn test_available_without_reservation() {
        let view = derive_item_view(item(), None, RELATIVE);
        assert_eq!(view.status, ItemStatus::Available);
        assert!(!view.is_owner);
        assert!(view.reservation.is_none());
    }

    #[test]
    fn test_cancelled_reservation_counts_as_available() {
        let cancelled = reservation(ReservationStatus::Cancelled);
        let view = derive_item_view(item(), Some(&cancelled), RESERVER);
        assert_eq!(view.status, ItemStatus::Available);
        assert!(view.reservation.is_none());
    }

    #[test]
    fn test_owner_sees_status_only() {
        for (status, expected) in [
            (ReservationStatus::Reserved, ItemStatus::Reserved),
            (ReservationStatus::Purchased, ItemStatus::Purchased),
        ] {
            let active = reservation(status);
            let view = derive_item_view(item(), Some(&active), OWNER);
            assert_eq!(view.status, expected);
            assert!(view.is_owner);
            assert!(view.reservation.is_none());
        }
    }

    #[test]
    fn test_reserver_sees_everything() {
        let active = reservation(ReservationStatus::Purchased);
        let view = derive_item_view(item(), Some(&active), RESERVER);
        let detail = view.reservation.unwrap();
        assert!(detail.reserved_by_me);
        assert_eq!(detail.reserved_by_user_id, RESERVER);
        assert!(detail.purchased_at.is_some());
        assert_eq!(
            detail.purchase_notes.as_deref(),
            Some("Gift wrapped, in the attic")
        );
    }

    #[test]
    fn test_relative_sees_holder_but_not_notes() {
        let active = reservation(ReservationStatus::Purchased);
        let view = derive_item_view(item(), Some(&active), RELATIVE);
        assert_eq!(view.status, ItemStatus::Purchased);
        let detail = view.reservation.unwrap();
        assert!(!detail.reserved_by_me);
        assert_eq!(detail.reserved_by_user_id, RESERVER);
        assert!(detail.purchase_notes.is_none());
    }
}
