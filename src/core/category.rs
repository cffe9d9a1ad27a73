//! Family categories - listing for members, management for admins.

use crate::{
    core::{access::authorize_family_access, is_unique_violation},
    entities::{Category, MemberRole, WishlistItem, category, family_member, wishlist_item},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::info;

/// Longest category name accepted
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;

fn validate_category_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(Error::validation(format!(
            "Category name cannot exceed {MAX_CATEGORY_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn map_duplicate_name(err: DbErr) -> Error {
    if is_unique_violation(&err) {
        Error::validation("A category with this name already exists in the family")
    } else {
        err.into()
    }
}

/// Loads a category and authorizes `user_id` against the family that owns it.
///
/// # Errors
/// - [`Error::NotFound`] if the category does not exist
/// - Any authorization failure for the owning family
pub async fn authorize_category_access<C>(
    db: &C,
    user_id: i64,
    category_id: i64,
    required_role: Option<MemberRole>,
) -> Result<(category::Model, family_member::Model)>
where
    C: ConnectionTrait,
{
    let category = Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))?;
    let membership =
        authorize_family_access(db, user_id, category.family_id, required_role).await?;
    Ok((category, membership))
}

/// Lists a family's categories ordered by name.
pub async fn list_categories(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
) -> Result<Vec<category::Model>> {
    authorize_family_access(db, user_id, family_id, None).await?;
    Category::find()
        .filter(category::Column::FamilyId.eq(family_id))
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Adds a category to a family. ADMIN only; names are unique per family.
pub async fn create_category(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
    name: &str,
    description: Option<String>,
) -> Result<category::Model> {
    let name = validate_category_name(name)?;
    authorize_family_access(db, user_id, family_id, Some(MemberRole::Admin)).await?;

    let category = category::ActiveModel {
        name: Set(name),
        description: Set(description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())),
        family_id: Set(family_id),
        is_default: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(map_duplicate_name)?;

    info!(family_id, category_id = category.id, "Created category '{}'", category.name);
    Ok(category)
}

/// Renames a category or changes its description. ADMIN only.
pub async fn update_category(
    db: &DatabaseConnection,
    user_id: i64,
    category_id: i64,
    name: Option<&str>,
    description: Option<Option<String>>,
) -> Result<category::Model> {
    let (category, _) =
        authorize_category_access(db, user_id, category_id, Some(MemberRole::Admin)).await?;

    let mut active: category::ActiveModel = category.into();
    if let Some(name) = name {
        active.name = Set(validate_category_name(name)?);
    }
    if let Some(description) = description {
        active.description =
            Set(description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()));
    }
    active.update(db).await.map_err(map_duplicate_name)
}

/// Deletes an empty category. ADMIN only.
///
/// # Errors
/// [`Error::CategoryHasItems`] while any item is still filed under the category.
pub async fn delete_category(
    db: &DatabaseConnection,
    user_id: i64,
    category_id: i64,
) -> Result<()> {
    let (category, _) =
        authorize_category_access(db, user_id, category_id, Some(MemberRole::Admin)).await?;

    let item_count = WishlistItem::find()
        .filter(wishlist_item::Column::CategoryId.eq(category_id))
        .count(db)
        .await?;
    if item_count > 0 {
        return Err(Error::CategoryHasItems {
            category_id,
            item_count,
        });
    }

    let family_id = category.family_id;
    category.delete(db).await?;
    info!(family_id, category_id, "Deleted category");
    Ok(())
}
