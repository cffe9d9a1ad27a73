//! Shared test utilities for the wishlist core.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    api::{AppState, rate_limit::Unlimited},
    config::{FamilySettings, Settings, database},
    core::{
        family,
        invite::RandomInviteCodes,
        item::{self, NewItem},
        user::{self, PasswordHasher},
    },
    entities::{self, Category, Currency, category, refresh_token},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = database::create_connection("sqlite::memory:").await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Creates handler state over a fresh test database, with default settings and
/// no rate limiting.
pub async fn setup_test_state() -> Result<AppState> {
    let db = setup_test_db().await?;
    Ok(
        AppState::new(db, Settings::default(), Arc::new(ReversingHasher))
            .with_rate_limiter(Arc::new(Unlimited)),
    )
}

/// "Hashes" by reversing the password so tests can check what was stored.
pub struct ReversingHasher;

impl PasswordHasher for ReversingHasher {
    fn hash_password(&self, password: &str) -> Result<String> {
        Ok(password.chars().rev().collect())
    }
}

/// Creates a test user named `name` with email `{name}@example.com`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        &format!("{name}@example.com"),
        "test-hash".to_string(),
        name,
    )
    .await
}

/// Creates a family with `creator_id` as its admin and the default categories.
///
/// # Defaults
/// * description: None
/// * currency: USD
pub async fn create_test_family(
    db: &DatabaseConnection,
    creator_id: i64,
    name: &str,
) -> Result<entities::family::Model> {
    family::create_family(db, &RandomInviteCodes, creator_id, name, None, Currency::Usd).await
}

/// Joins `user_id` to `family` as a MEMBER through its invite code.
pub async fn join_test_family(
    db: &DatabaseConnection,
    user_id: i64,
    family: &entities::family::Model,
) -> Result<entities::family_member::Model> {
    family::join_family(db, &FamilySettings::default(), user_id, &family.invite_code).await
}

/// The family's category with the lowest id.
pub async fn first_category(
    db: &DatabaseConnection,
    family_id: i64,
) -> Result<category::Model> {
    Category::find()
        .filter(category::Column::FamilyId.eq(family_id))
        .order_by_asc(category::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("category", family_id))
}

/// Creates an item owned by `owner_id` with no price and MEDIUM priority.
pub async fn create_test_item(
    db: &DatabaseConnection,
    owner_id: i64,
    category_id: i64,
    title: &str,
) -> Result<entities::wishlist_item::Model> {
    item::create_item(
        db,
        owner_id,
        NewItem {
            title: title.to_string(),
            category_id,
            ..NewItem::default()
        },
    )
    .await
}

/// Stores a refresh token for `user_id` that expires in a week.
pub async fn create_test_refresh_token(
    db: &DatabaseConnection,
    user_id: i64,
    token_hash: &str,
) -> Result<refresh_token::Model> {
    let now = Utc::now();
    refresh_token::ActiveModel {
        user_id: Set(user_id),
        token_hash: Set(token_hash.to_string()),
        expires_at: Set(now + Duration::days(7)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
