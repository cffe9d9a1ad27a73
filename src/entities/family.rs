//! Family entity - A group of users sharing wishlists.
//!
//! Each family carries a unique invite code used to join it and a display
//! currency for item prices.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Currency used to display prices within a family
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// US dollar
    #[sea_orm(string_value = "USD")]
    #[default]
    Usd,
    /// Euro
    #[sea_orm(string_value = "EUR")]
    Eur,
    /// Pound sterling
    #[sea_orm(string_value = "GBP")]
    Gbp,
}

/// Family database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "families")]
pub struct Model {
    /// Unique identifier for the family
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Family name (e.g., "Smiths")
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Code other users present to join this family
    #[sea_orm(unique)]
    pub invite_code: String,
    /// Currency prices are displayed in
    pub currency: Currency,
    /// When the family was created
    pub created_at: DateTimeUtc,
    /// When the family was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Family and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One family has many members
    #[sea_orm(has_many = "super::family_member::Entity")]
    Members,
    /// One family has many categories
    #[sea_orm(has_many = "super::category::Entity")]
    Categories,
}

impl Related<super::family_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
