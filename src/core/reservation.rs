//! Reservations - claiming, releasing and buying other members' items.
//!
//! A reservation moves RESERVED -> PURCHASED, and PURCHASED is final. Cancelling
//! a RESERVED claim either deletes the row or marks it CANCELLED, depending on
//! [`CancellationMode`]. At most one RESERVED or PURCHASED reservation exists per
//! item. The check runs inside the inserting transaction, and a partial unique
//! index in the store rejects anything that slips past it.

use crate::{
    config::{CancellationMode, ReservationSettings},
    core::{
        access::authorize_family_access,
        is_unique_violation,
        item::{find_active_reservation, load_item_for_member},
        visibility::{ItemView, derive_item_view},
    },
    entities::{
        ItemReservation, ReservationStatus, WishlistItem, category, item_reservation,
        wishlist_item,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{JoinType, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Longest purchase note accepted
pub const MAX_PURCHASE_NOTES_LENGTH: usize = 1_000;

async fn find_own_reservation<C>(
    db: &C,
    user_id: i64,
    item_id: i64,
) -> Result<Option<item_reservation::Model>>
where
    C: ConnectionTrait,
{
    ItemReservation::find()
        .filter(item_reservation::Column::WishlistItemId.eq(item_id))
        .filter(item_reservation::Column::ReservedByUserId.eq(user_id))
        .filter(item_reservation::Column::Status.is_in(ReservationStatus::ACTIVE))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Claims another member's item.
///
/// # Errors
/// - [`Error::NotFound`] if the item does not exist
/// - Any authorization failure for the item's family
/// - [`Error::CannotReserveOwnItem`] if the caller owns the item
/// - [`Error::AlreadyReserved`] if the item already has an active reservation,
///   including when a concurrent request won the race
pub async fn reserve_item(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
) -> Result<item_reservation::Model> {
    let txn = db.begin().await?;
    let (item, _, _) = load_item_for_member(&txn, user_id, item_id).await?;

    if item.owner_user_id == user_id {
        return Err(Error::CannotReserveOwnItem);
    }
    if find_active_reservation(&txn, item_id).await?.is_some() {
        debug!(item_id, user_id, "Reservation rejected: item already claimed");
        return Err(Error::AlreadyReserved { item_id });
    }

    let reservation = item_reservation::ActiveModel {
        wishlist_item_id: Set(item_id),
        reserved_by_user_id: Set(user_id),
        status: Set(ReservationStatus::Reserved),
        reserved_at: Set(Utc::now()),
        purchased_at: Set(None),
        purchase_notes: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            Error::AlreadyReserved { item_id }
        } else {
            err.into()
        }
    })?;
    txn.commit().await?;

    info!(item_id, user_id, reservation_id = reservation.id, "Reserved item");
    Ok(reservation)
}

/// Releases the caller's RESERVED claim on an item.
///
/// # Errors
/// - [`Error::NotFound`] if the caller holds no active reservation on the item
/// - [`Error::ReservationAlreadyPurchased`] once the item has been bought
pub async fn cancel_reservation(
    db: &DatabaseConnection,
    settings: &ReservationSettings,
    user_id: i64,
    item_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    load_item_for_member(&txn, user_id, item_id).await?;

    let reservation = find_own_reservation(&txn, user_id, item_id)
        .await?
        .ok_or_else(|| Error::not_found("reservation", item_id))?;
    if reservation.status == ReservationStatus::Purchased {
        return Err(Error::ReservationAlreadyPurchased { item_id });
    }

    let reservation_id = reservation.id;
    match settings.on_cancel {
        CancellationMode::Delete => {
            reservation.delete(&txn).await?;
        }
        CancellationMode::Retain => {
            let mut active: item_reservation::ActiveModel = reservation.into();
            active.status = Set(ReservationStatus::Cancelled);
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    info!(item_id, user_id, reservation_id, mode = ?settings.on_cancel, "Cancelled reservation");
    Ok(())
}

/// Marks the caller's reservation as bought, with optional private notes.
///
/// # Errors
/// [`Error::ReservationRequired`] unless the caller holds a RESERVED reservation
/// on the item.
pub async fn mark_purchased(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
    notes: Option<String>,
) -> Result<item_reservation::Model> {
    let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    if notes
        .as_ref()
        .is_some_and(|n| n.chars().count() > MAX_PURCHASE_NOTES_LENGTH)
    {
        return Err(Error::validation(format!(
            "Purchase notes cannot exceed {MAX_PURCHASE_NOTES_LENGTH} characters"
        )));
    }

    let txn = db.begin().await?;
    load_item_for_member(&txn, user_id, item_id).await?;

    let reservation = find_own_reservation(&txn, user_id, item_id)
        .await?
        .filter(|r| r.status == ReservationStatus::Reserved)
        .ok_or(Error::ReservationRequired { item_id })?;

    let mut active: item_reservation::ActiveModel = reservation.into();
    active.status = Set(ReservationStatus::Purchased);
    active.purchased_at = Set(Some(Utc::now()));
    active.purchase_notes = Set(notes);
    let reservation = active.update(&txn).await?;
    txn.commit().await?;

    info!(item_id, user_id, reservation_id = reservation.id, "Marked item purchased");
    Ok(reservation)
}

/// Items in a family the caller has reserved or bought, most recent claim first.
pub async fn list_my_reservations(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
) -> Result<Vec<ItemView>> {
    authorize_family_access(db, user_id, family_id, None).await?;

    let rows = ItemReservation::find()
        .filter(item_reservation::Column::ReservedByUserId.eq(user_id))
        .filter(item_reservation::Column::Status.is_in(ReservationStatus::ACTIVE))
        .find_also_related(WishlistItem)
        .join(JoinType::InnerJoin, wishlist_item::Relation::Category.def())
        .filter(category::Column::FamilyId.eq(family_id))
        .order_by_desc(item_reservation::Column::ReservedAt)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(reservation, item)| {
            item.map(|item| derive_item_view(item, Some(&reservation), user_id))
        })
        .collect())
}
