//! Item and reservation handlers.

use crate::{
    api::{
        AppState, Principal,
        requests::{CreateItemRequest, ListItemsQuery, PurchaseRequest, UpdateItemRequest},
    },
    core::{item, reservation, visibility::ItemView},
    entities::{ItemReservationModel, PriceHistoryModel, WishlistItemModel},
    errors::Result,
};

/// `POST /items`
pub async fn create_item(
    state: &AppState,
    principal: &Principal,
    request: CreateItemRequest,
) -> Result<WishlistItemModel> {
    let new_item = request.into_new_item()?;
    item::create_item(&state.database, principal.id, new_item).await
}

/// `GET /items/{id}`
pub async fn get_item(state: &AppState, principal: &Principal, item_id: i64) -> Result<ItemView> {
    item::get_item_view(&state.database, principal.id, item_id).await
}

/// `GET /families/{id}/items`
pub async fn list_family_items(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    query: ListItemsQuery,
) -> Result<Vec<ItemView>> {
    item::list_family_items(&state.database, principal.id, family_id, query.category_id).await
}

/// `PATCH /items/{id}`
pub async fn update_item(
    state: &AppState,
    principal: &Principal,
    item_id: i64,
    request: UpdateItemRequest,
) -> Result<WishlistItemModel> {
    let changes = request.into_changes()?;
    item::update_item(&state.database, principal.id, item_id, changes).await
}

/// `DELETE /items/{id}`
pub async fn delete_item(state: &AppState, principal: &Principal, item_id: i64) -> Result<()> {
    item::delete_item(&state.database, principal.id, item_id).await
}

/// `GET /items/{id}/price-history`
pub async fn price_history(
    state: &AppState,
    principal: &Principal,
    item_id: i64,
) -> Result<Vec<PriceHistoryModel>> {
    item::price_history(&state.database, principal.id, item_id).await
}

/// `POST /items/{id}/reservation`
pub async fn reserve_item(
    state: &AppState,
    principal: &Principal,
    item_id: i64,
) -> Result<ItemReservationModel> {
    reservation::reserve_item(&state.database, principal.id, item_id).await
}

/// `DELETE /items/{id}/reservation`
pub async fn cancel_reservation(
    state: &AppState,
    principal: &Principal,
    item_id: i64,
) -> Result<()> {
    reservation::cancel_reservation(
        &state.database,
        &state.settings.reservations,
        principal.id,
        item_id,
    )
    .await
}

/// `POST /items/{id}/purchase`
pub async fn mark_purchased(
    state: &AppState,
    principal: &Principal,
    item_id: i64,
    request: PurchaseRequest,
) -> Result<ItemReservationModel> {
    reservation::mark_purchased(&state.database, principal.id, item_id, request.notes).await
}

/// `GET /families/{id}/reservations`
pub async fn list_my_reservations(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
) -> Result<Vec<ItemView>> {
    reservation::list_my_reservations(&state.database, principal.id, family_id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::visibility::ItemStatus;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_wishlist_handlers_end_to_end() -> Result<()> {
        let state = setup_test_state().await?;
        let alice = Principal::from(&create_test_user(&state.database, "alice").await?);
        let bob = Principal::from(&create_test_user(&state.database, "bob").await?);
        let family = create_test_family(&state.database, alice.id, "Smiths").await?;
        join_test_family(&state.database, bob.id, &family).await?;
        let category = first_category(&state.database, family.id).await?;

        let request: CreateItemRequest = serde_json::from_str(&format!(
            r#"{{"title": "Headphones", "price": 89.0, "categoryId": {}}}"#,
            category.id
        ))
        .unwrap();
        let item = create_item(&state, &alice, request).await?;

        reserve_item(&state, &bob, item.id).await?;
        let purchase = PurchaseRequest {
            notes: Some("Wrapped".to_string()),
        };
        mark_purchased(&state, &bob, item.id, purchase).await?;

        let alice_view = get_item(&state, &alice, item.id).await?;
        assert_eq!(alice_view.status, ItemStatus::Purchased);
        assert!(alice_view.reservation.is_none());

        let mine = list_my_reservations(&state, &bob, family.id).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(
            mine[0].reservation.as_ref().unwrap().purchase_notes.as_deref(),
            Some("Wrapped")
        );

        let listed = list_family_items(&state, &bob, family.id, ListItemsQuery::default()).await?;
        assert_eq!(listed.len(), 1);

        let update: UpdateItemRequest = serde_json::from_str(r#"{"price": 79.0}"#).unwrap();
        update_item(&state, &alice, item.id, update).await?;
        assert_eq!(price_history(&state, &bob, item.id).await?.len(), 2);

        delete_item(&state, &alice, item.id).await?;
        assert!(
            list_family_items(&state, &bob, family.id, ListItemsQuery::default())
                .await?
                .is_empty()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_uses_configured_mode() -> Result<()> {
        let state = setup_test_state().await?;
        let alice = Principal::from(&create_test_user(&state.database, "alice").await?);
        let bob = Principal::from(&create_test_user(&state.database, "bob").await?);
        let family = create_test_family(&state.database, alice.id, "Smiths").await?;
        join_test_family(&state.database, bob.id, &family).await?;
        let category = first_category(&state.database, family.id).await?;
        let item = create_test_item(&state.database, alice.id, category.id, "Socks").await?;

        reserve_item(&state, &bob, item.id).await?;
        cancel_reservation(&state, &bob, item.id).await?;
        assert_eq!(get_item(&state, &bob, item.id).await?.status, ItemStatus::Available);

        Ok(())
    }
}
