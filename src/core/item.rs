//! Wishlist items - owner-only mutation, member-wide visibility.
//!
//! Every item lives in a category and therefore in exactly one family. Creating
//! and reading items requires membership of that family; changing or deleting
//! them additionally requires owning them. Each price an item takes on is kept
//! in its price history.

use crate::{
    core::{
        access::authorize_family_access,
        category::authorize_category_access,
        visibility::{ItemView, derive_item_view},
    },
    entities::{
        Category, ItemReservation, PriceHistory, Priority, ReservationStatus, WishlistItem,
        category, family_member, item_reservation, price_history, wishlist_item,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{JoinType, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// Longest item title accepted
pub const MAX_TITLE_LENGTH: usize = 200;

/// Longest description or notes accepted
pub const MAX_TEXT_LENGTH: usize = 2_000;

/// Fields for a new wishlist item.
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    /// Short title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Approximate price, never negative
    pub price: Option<f64>,
    /// Where to buy it
    pub product_url: Option<String>,
    /// Picture of it
    pub image_url: Option<String>,
    /// How much it is wanted
    pub priority: Priority,
    /// Size, colour and the like
    pub notes: Option<String>,
    /// Category to file it under
    pub category_id: i64,
}

/// Partial update of an item. `None` leaves a field alone; `Some(None)` clears
/// a nullable field.
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<Option<String>>,
    /// New price
    pub price: Option<Option<f64>>,
    /// New product link
    pub product_url: Option<Option<String>>,
    /// New picture link
    pub image_url: Option<Option<String>>,
    /// New priority
    pub priority: Option<Priority>,
    /// New notes
    pub notes: Option<Option<String>>,
    /// Category to move the item to
    pub category_id: Option<i64>,
}

/// Checks that a price is a finite, non-negative number.
pub fn validate_price(price: Option<f64>) -> Result<Option<f64>> {
    match price {
        Some(p) if !p.is_finite() => Err(Error::validation("Price must be a number")),
        Some(p) if p < 0.0 => Err(Error::validation("Price cannot be negative")),
        _ => Ok(price),
    }
}

/// Trims the title and checks it is present and not too long.
pub fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::validation("Title cannot be empty"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(Error::validation(format!(
            "Title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title.to_string())
}

/// Accepts only absolute `http` and `https` links; blank input clears the field.
pub fn validate_url(field: &str, url: Option<String>) -> Result<Option<String>> {
    let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    let has_host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(Error::validation(format!(
            "{field} must be an http or https link"
        )));
    }
    Ok(Some(url))
}

fn validate_text(field: &str, text: Option<String>) -> Result<Option<String>> {
    let text = text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    if text
        .as_ref()
        .is_some_and(|t| t.chars().count() > MAX_TEXT_LENGTH)
    {
        return Err(Error::validation(format!(
            "{field} cannot exceed {MAX_TEXT_LENGTH} characters"
        )));
    }
    Ok(text)
}

async fn record_price<C>(db: &C, item_id: i64, price: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    price_history::ActiveModel {
        wishlist_item_id: Set(item_id),
        price: Set(price),
        recorded_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    debug!(item_id, price, "Recorded price snapshot");
    Ok(())
}

/// Loads an item and authorizes `user_id` as a member of the item's family.
///
/// # Errors
/// - [`Error::NotFound`] if the item does not exist
/// - Any authorization failure for the owning family
pub async fn load_item_for_member<C>(
    db: &C,
    user_id: i64,
    item_id: i64,
) -> Result<(wishlist_item::Model, category::Model, family_member::Model)>
where
    C: ConnectionTrait,
{
    let item = WishlistItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("wishlist item", item_id))?;
    let (category, membership) =
        authorize_category_access(db, user_id, item.category_id, None).await?;
    Ok((item, category, membership))
}

async fn load_item_for_owner<C>(
    db: &C,
    user_id: i64,
    item_id: i64,
) -> Result<(wishlist_item::Model, category::Model)>
where
    C: ConnectionTrait,
{
    let (item, category, _) = load_item_for_member(db, user_id, item_id).await?;
    if item.owner_user_id != user_id {
        return Err(Error::NotItemOwner { item_id });
    }
    Ok((item, category))
}

/// The active (RESERVED or PURCHASED) reservation of an item, if any.
pub async fn find_active_reservation<C>(
    db: &C,
    item_id: i64,
) -> Result<Option<item_reservation::Model>>
where
    C: ConnectionTrait,
{
    ItemReservation::find()
        .filter(item_reservation::Column::WishlistItemId.eq(item_id))
        .filter(item_reservation::Column::Status.is_in(ReservationStatus::ACTIVE))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds an item to the caller's wishlist in the category's family.
///
/// # Errors
/// Returns an error if:
/// - The title, price, links or texts are invalid
/// - The category does not exist
/// - The caller is not an active member of the category's family
pub async fn create_item(
    db: &DatabaseConnection,
    user_id: i64,
    new_item: NewItem,
) -> Result<wishlist_item::Model> {
    let title = validate_title(&new_item.title)?;
    let price = validate_price(new_item.price)?;
    let product_url = validate_url("Product URL", new_item.product_url)?;
    let image_url = validate_url("Image URL", new_item.image_url)?;
    let description = validate_text("Description", new_item.description)?;
    let notes = validate_text("Notes", new_item.notes)?;

    let txn = db.begin().await?;
    let (category, _) = authorize_category_access(&txn, user_id, new_item.category_id, None).await?;

    let now = Utc::now();
    let item = wishlist_item::ActiveModel {
        title: Set(title),
        description: Set(description),
        price: Set(price),
        product_url: Set(product_url),
        image_url: Set(image_url),
        priority: Set(new_item.priority),
        notes: Set(notes),
        owner_user_id: Set(user_id),
        category_id: Set(category.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(price) = item.price {
        record_price(&txn, item.id, price).await?;
    }
    txn.commit().await?;

    info!(
        item_id = item.id,
        user_id,
        family_id = category.family_id,
        "Created wishlist item '{}'",
        item.title
    );
    Ok(item)
}

/// Changes an item the caller owns.
///
/// # Errors
/// - [`Error::NotFound`] if the item or the target category does not exist
/// - [`Error::NotItemOwner`] if the caller does not own the item
/// - [`Error::CrossFamilyCategory`] when moving to another family's category
/// - [`Error::Validation`] for malformed fields
pub async fn update_item(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
    changes: ItemChanges,
) -> Result<wishlist_item::Model> {
    let txn = db.begin().await?;
    let (item, current_category) = load_item_for_owner(&txn, user_id, item_id).await?;

    if let Some(category_id) = changes.category_id {
        let target = Category::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("category", category_id))?;
        if target.family_id != current_category.family_id {
            return Err(Error::CrossFamilyCategory);
        }
    }

    let previous_price = item.price;
    let mut active: wishlist_item::ActiveModel = item.into();
    if let Some(title) = changes.title {
        active.title = Set(validate_title(&title)?);
    }
    if let Some(description) = changes.description {
        active.description = Set(validate_text("Description", description)?);
    }
    if let Some(price) = changes.price {
        active.price = Set(validate_price(price)?);
    }
    if let Some(product_url) = changes.product_url {
        active.product_url = Set(validate_url("Product URL", product_url)?);
    }
    if let Some(image_url) = changes.image_url {
        active.image_url = Set(validate_url("Image URL", image_url)?);
    }
    if let Some(priority) = changes.priority {
        active.priority = Set(priority);
    }
    if let Some(notes) = changes.notes {
        active.notes = Set(validate_text("Notes", notes)?);
    }
    if let Some(category_id) = changes.category_id {
        active.category_id = Set(category_id);
    }
    active.updated_at = Set(Utc::now());

    let item = active.update(&txn).await?;
    if let Some(price) = item.price {
        let changed = previous_price.is_none_or(|old| (old - price).abs() > f64::EPSILON);
        if changed {
            record_price(&txn, item.id, price).await?;
        }
    }
    txn.commit().await?;

    info!(item_id, user_id, "Updated wishlist item");
    Ok(item)
}

/// Deletes an item the caller owns; its reservations and price history go with it.
pub async fn delete_item(db: &DatabaseConnection, user_id: i64, item_id: i64) -> Result<()> {
    let (item, _) = load_item_for_owner(db, user_id, item_id).await?;
    item.delete(db).await?;
    info!(item_id, user_id, "Deleted wishlist item");
    Ok(())
}

/// Price snapshots of an item, oldest first. Any family member may look.
pub async fn price_history(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
) -> Result<Vec<price_history::Model>> {
    load_item_for_member(db, user_id, item_id).await?;
    PriceHistory::find()
        .filter(price_history::Column::WishlistItemId.eq(item_id))
        .order_by_asc(price_history::Column::RecordedAt)
        .order_by_asc(price_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One item as the caller may see it.
pub async fn get_item_view(
    db: &DatabaseConnection,
    user_id: i64,
    item_id: i64,
) -> Result<ItemView> {
    let (item, _, _) = load_item_for_member(db, user_id, item_id).await?;
    let active = find_active_reservation(db, item_id).await?;
    Ok(derive_item_view(item, active.as_ref(), user_id))
}

/// Every item in a family, optionally limited to one category, as the caller may
/// see them. Newest first.
pub async fn list_family_items(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
    category_id: Option<i64>,
) -> Result<Vec<ItemView>> {
    authorize_family_access(db, user_id, family_id, None).await?;

    let mut query = WishlistItem::find()
        .join(JoinType::InnerJoin, wishlist_item::Relation::Category.def())
        .filter(category::Column::FamilyId.eq(family_id));
    if let Some(category_id) = category_id {
        query = query.filter(wishlist_item::Column::CategoryId.eq(category_id));
    }
    let items = query
        .order_by_desc(wishlist_item::Column::CreatedAt)
        .order_by_desc(wishlist_item::Column::Id)
        .all(db)
        .await?;

    let item_ids: Vec<i64> = items.iter().map(|item| item.id).collect();
    let mut active: HashMap<i64, item_reservation::Model> = ItemReservation::find()
        .filter(item_reservation::Column::WishlistItemId.is_in(item_ids))
        .filter(item_reservation::Column::Status.is_in(ReservationStatus::ACTIVE))
        .all(db)
        .await?
        .into_iter()
        .map(|reservation| (reservation.wishlist_item_id, reservation))
        .collect();

    Ok(items
        .into_iter()
        .map(|item| {
            let reservation = active.remove(&item.id);
            derive_item_view(item, reservation.as_ref(), user_id)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::visibility::ItemStatus;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, PaginatorTrait};

    fn headphones(category_id: i64) -> NewItem {
        NewItem {
            title: "Headphones".to_string(),
            price: Some(199.99),
            product_url: Some("https://shop.example.com/headphones".to_string()),
            priority: Priority::High,
            category_id,
            ..NewItem::default()
        }
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price(None).unwrap(), None);
        assert_eq!(validate_price(Some(0.0)).unwrap(), Some(0.0));
        assert!(matches!(
            validate_price(Some(-0.01)).unwrap_err(),
            Error::Validation { message: _ }
        ));
        assert!(matches!(
            validate_price(Some(f64::NAN)).unwrap_err(),
            Error::Validation { message: _ }
        ));
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url("Link", None).unwrap(), None);
        assert_eq!(validate_url("Link", Some("   ".to_string())).unwrap(), None);
        assert_eq!(
            validate_url("Link", Some(" http://example.com ".to_string())).unwrap(),
            Some("http://example.com".to_string())
        );
        assert!(validate_url("Link", Some("ftp://example.com".to_string())).is_err());
        assert!(validate_url("Link", Some("javascript:alert(1)".to_string())).is_err());
        assert!(validate_url("Link", Some("https://".to_string())).is_err());
    }

    #[tokio::test]
    async fn test_create_item_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let mut item = headphones(1);
        item.title = "   ".to_string();
        let result = create_item(&db, 1, item).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        let mut item = headphones(1);
        item.price = Some(-5.0);
        let result = create_item(&db, 1, item).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { message: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_item_records_initial_price() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let family = create_test_family(&db, alice.id, "Smiths").await?;
        let category = first_category(&db, family.id).await?;

        let item = create_item(&db, alice.id, headphones(category.id)).await?;
        assert_eq!(item.owner_user_id, alice.id);
        assert_eq!(item.priority, Priority::High);

        let history = price_history(&db, alice.id, item.id).await?;
        assert_eq!(history.len(), 1);
        assert!((history[0].price - 199.99).abs() < f64::EPSILON);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_item_requires_membership() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let mallory = create_test_user(&db, "mallory").await?;
        let family = create_test_family(&db, alice.id, "Smiths").await?;
        let category = first_category(&db, family.id).await?;

        let result = create_item(&db, mallory.id, headphones(category.id)).await;
        assert!(matches!(result.unwrap_err(), Error::NotAMember { family_id: _ }));

        let result = create_item(&db, alice.id, headphones(9_999)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "category",
                id: _
            }
        ));
        assert_eq!(WishlistItem::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_owner_only() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let family = create_test_family(&db, alice.id, "Smiths").await?;
        join_test_family(&db, bob.id, &family).await?;
        let category = first_category(&db, family.id).await?;
        let item = create_item(&db, alice.id, headphones(category.id)).await?;

        let changes = ItemChanges {
            title: Some("Better headphones".to_string()),
            ..ItemChanges::default()
        };
        let result = update_item(&db, bob.id, item.id, changes.clone()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotItemOwner { item_id } if item_id == item.id
        ));
        let result = delete_item(&db, bob.id, item.id).await;
        assert!(matches!(result.unwrap_err(), Error::NotItemOwner { item_id: _ }));

        let updated = update_item(&db, alice.id, item.id, changes).await?;
        assert_eq!(updated.title, "Better headphones");

        let result = update_item(&db, alice.id, 9_999, ItemChanges::default()).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound {
                entity: "wishlist item",
                id: _
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_price_history() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let family = create_test_family(&db, alice.id, "Smiths").await?;
        let category = first_category(&db, family.id).await?;
        let item = create_item(&db, alice.id, headphones(category.id)).await?;

        // Same price: no new snapshot
        let same = ItemChanges {
            price: Some(Some(199.99)),
            ..ItemChanges::default()
        };
        update_item(&db, alice.id, item.id, same).await?;
        assert_eq!(price_history(&db, alice.id, item.id).await?.len(), 1);

        let cheaper = ItemChanges {
            price: Some(Some(149.0)),
            ..ItemChanges::default()
        };
        update_item(&db, alice.id, item.id, cheaper).await?;

        // Clearing the price keeps the history
        let cleared = ItemChanges {
            price: Some(None),
            ..ItemChanges::default()
        };
        let updated = update_item(&db, alice.id, item.id, cleared).await?;
        assert!(updated.price.is_none());

        let history = price_history(&db, alice.id, item.id).await?;
        let prices: Vec<f64> = history.iter().map(|h| h.price).collect();
        assert_eq!(prices.len(), 2);
        assert!((prices[1] - 149.0).abs() < f64::EPSILON);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_item_category_moves() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let carol = create_test_user(&db, "carol").await?;
        let smiths = create_test_family(&db, alice.id, "Smiths").await?;
        let joneses = create_test_family(&db, carol.id, "Joneses").await?;
        let categories = crate::core::category::list_categories(&db, alice.id, smiths.id).await?;
        let foreign = first_category(&db, joneses.id).await?;
        let item = create_item(&db, alice.id, headphones(categories[0].id)).await?;

        let result = update_item(
            &db,
            alice.id,
            item.id,
            ItemChanges {
                category_id: Some(foreign.id),
                ..ItemChanges::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::CrossFamilyCategory));

        let moved = update_item(
            &db,
            alice.id,
            item.id,
            ItemChanges {
                category_id: Some(categories[1].id),
                ..ItemChanges::default()
            },
        )
        .await?;
        assert_eq!(moved.category_id, categories[1].id);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_item_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let family = create_test_family(&db, alice.id, "Smiths").await?;
        join_test_family(&db, bob.id, &family).await?;
        let category = first_category(&db, family.id).await?;
        let item = create_item(&db, alice.id, headphones(category.id)).await?;
        crate::core::reservation::reserve_item(&db, bob.id, item.id).await?;

        delete_item(&db, alice.id, item.id).await?;
        assert_eq!(WishlistItem::find().count(&db).await?, 0);
        assert_eq!(ItemReservation::find().count(&db).await?, 0);
        assert_eq!(PriceHistory::find().count(&db).await?, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_family_items() -> Result<()> {
        let db = setup_test_db().await?;
        let alice = create_test_user(&db, "alice").await?;
        let bob = create_test_user(&db, "bob").await?;
        let carol = create_test_user(&db, "carol").await?;
        let smiths = create_test_family(&db, alice.id, "Smiths").await?;
        let joneses = create_test_family(&db, carol.id, "Joneses").await?;
        join_test_family(&db, bob.id, &smiths).await?;
        let categories = crate::core::category::list_categories(&db, alice.id, smiths.id).await?;

        let reserved = create_item(&db, alice.id, headphones(categories[0].id)).await?;
        create_test_item(&db, bob.id, categories[1].id, "Scarf").await?;
        let elsewhere = first_category(&db, joneses.id).await?;
        create_test_item(&db, carol.id, elsewhere.id, "Not ours").await?;
        crate::core::reservation::reserve_item(&db, bob.id, reserved.id).await?;

        let views = list_family_items(&db, alice.id, smiths.id, None).await?;
        assert_eq!(views.len(), 2);
        let own = views.iter().find(|v| v.item.id == reserved.id).unwrap();
        assert_eq!(own.status, ItemStatus::Reserved);
        assert!(own.is_owner);
        assert!(own.reservation.is_none());

        let views = list_family_items(&db, bob.id, smiths.id, Some(categories[0].id)).await?;
        assert_eq!(views.len(), 1);
        assert!(views[0].reservation.as_ref().unwrap().reserved_by_me);

        let result = list_family_items(&db, carol.id, smiths.id, None).await;
        assert!(matches!(result.unwrap_err(), Error::NotAMember { family_id: _ }));

        Ok(())
    }
}
