//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so foreign keys (and their ON DELETE CASCADE rules) follow the entity relations.
//! Constraints the entity attributes cannot express (composite uniqueness and the
//! partial index backing the one-active-reservation rule) are added afterwards.

use crate::entities::{
    Category, Family, FamilyMember, ItemReservation, PriceHistory, RefreshToken, User,
    WishlistItem,
};
use crate::errors::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};
use tracing::{debug, info};

/// Fallback used when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/family_wishlist.sqlite?mode=rwc";

/// Indexes created after the tables.
const EXTRA_INDEXES: [&str; 3] = [
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_family_members_user_family \
     ON family_members (user_id, family_id)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_family_name \
     ON categories (family_id, name)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_item_reservations_active_item \
     ON item_reservations (wishlist_item_id) \
     WHERE status IN ('RESERVED', 'PURCHASED')",
];

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    // Every pooled connection to `:memory:` opens its own empty database.
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    Database::connect(options).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    db.execute(builder.build(statement.if_not_exists())).await?;
    Ok(())
}

/// Creates all tables and indexes if they do not exist yet.
///
/// Parents are created before children so the foreign keys resolve on
/// backends that check them eagerly.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, User).await?;
    create_table(db, &schema, Family).await?;
    create_table(db, &schema, FamilyMember).await?;
    create_table(db, &schema, Category).await?;
    create_table(db, &schema, WishlistItem).await?;
    create_table(db, &schema, ItemReservation).await?;
    create_table(db, &schema, PriceHistory).await?;
    create_table(db, &schema, RefreshToken).await?;

    for index in EXTRA_INDEXES {
        db.execute_unprepared(index).await?;
    }

    info!("Database tables and indexes ensured.");
    Ok(())
}
