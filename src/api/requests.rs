//! Request bodies accepted by the API surface.
//!
//! Each request checks its own shape (required text present, lengths, links,
//! prices) before any handler touches the store, then converts into the input
//! type the core expects.

use crate::{
    core::{
        category::MAX_CATEGORY_NAME_LENGTH,
        family::{FamilyChanges, FamilyIncludes, MAX_FAMILY_NAME_LENGTH},
        invite::normalize_invite_code,
        item::{ItemChanges, MAX_TITLE_LENGTH, NewItem, validate_price, validate_url},
        user::MIN_PASSWORD_LENGTH,
    },
    entities::{Currency, Priority},
    errors::{Error, Result},
};
use serde::Deserialize;

fn require_text(field: &str, value: &str, max_len: usize) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(Error::validation(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

/// Empty strings in an update mean "clear this field".
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| Some(v).filter(|v| !v.trim().is_empty()))
}

/// Body of `POST /families`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFamilyRequest {
    /// Family name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Display currency, USD when omitted
    #[serde(default)]
    pub currency: Currency,
}

impl CreateFamilyRequest {
    /// Checks the name.
    pub fn validate(&self) -> Result<()> {
        require_text("Family name", &self.name, MAX_FAMILY_NAME_LENGTH)
    }
}

/// Query of `GET /families/{id}`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetFamilyQuery {
    /// Also return the family's categories
    pub include_categories: bool,
    /// Also return the family's members
    pub include_members: bool,
}

impl From<GetFamilyQuery> for FamilyIncludes {
    fn from(query: GetFamilyQuery) -> Self {
        Self {
            categories: query.include_categories,
            members: query.include_members,
        }
    }
}

/// Body of `PATCH /families/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateFamilyRequest {
    /// New name
    pub name: Option<String>,
    /// New description; empty clears it
    pub description: Option<String>,
    /// New currency
    pub currency: Option<Currency>,
}

impl UpdateFamilyRequest {
    /// Checks the fields and converts to core changes.
    pub fn into_changes(self) -> Result<FamilyChanges> {
        if let Some(name) = &self.name {
            require_text("Family name", name, MAX_FAMILY_NAME_LENGTH)?;
        }
        Ok(FamilyChanges {
            name: self.name,
            description: clearable(self.description),
            currency: self.currency,
        })
    }
}

/// Body of `POST /families/join` and `POST /families/switch`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinFamilyRequest {
    /// Code shared by a family member
    pub invite_code: String,
}

impl JoinFamilyRequest {
    /// Normalizes the code, rejecting anything that cannot be one of ours.
    pub fn normalized_code(&self) -> Result<String> {
        normalize_invite_code(&self.invite_code)
    }
}

/// Body of `POST /families/{id}/members/{userId}/password`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// Replacement password, hashed before storage
    pub new_password: String,
}

impl ResetPasswordRequest {
    /// Checks the minimum length.
    pub fn validate(&self) -> Result<()> {
        if self.new_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Body of `POST /families/{id}/categories`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    /// Category name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateCategoryRequest {
    /// Checks the name.
    pub fn validate(&self) -> Result<()> {
        require_text("Category name", &self.name, MAX_CATEGORY_NAME_LENGTH)
    }
}

/// Body of `PATCH /categories/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateCategoryRequest {
    /// New name
    pub name: Option<String>,
    /// New description; empty clears it
    pub description: Option<String>,
}

impl UpdateCategoryRequest {
    /// Checks the name if one was given.
    pub fn validate(&self) -> Result<()> {
        match &self.name {
            Some(name) => require_text("Category name", name, MAX_CATEGORY_NAME_LENGTH),
            None => Ok(()),
        }
    }
}

/// Body of `POST /items`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    /// Item title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: Option<String>,
    /// Approximate price
    #[serde(default)]
    pub price: Option<f64>,
    /// Where to buy it
    #[serde(default)]
    pub product_url: Option<String>,
    /// Picture of it
    #[serde(default)]
    pub image_url: Option<String>,
    /// MEDIUM when omitted
    #[serde(default)]
    pub priority: Priority,
    /// Size, colour and the like
    #[serde(default)]
    pub notes: Option<String>,
    /// Category to file it under
    pub category_id: i64,
}

impl CreateItemRequest {
    /// Checks the fields and converts to a core [`NewItem`].
    pub fn into_new_item(self) -> Result<NewItem> {
        require_text("Title", &self.title, MAX_TITLE_LENGTH)?;
        let price = validate_price(self.price)?;
        let product_url = validate_url("Product URL", self.product_url)?;
        let image_url = validate_url("Image URL", self.image_url)?;
        Ok(NewItem {
            title: self.title,
            description: self.description,
            price,
            product_url,
            image_url,
            priority: self.priority,
            notes: self.notes,
            category_id: self.category_id,
        })
    }
}

/// Body of `PATCH /items/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateItemRequest {
    /// New title
    pub title: Option<String>,
    /// New description; empty clears it
    pub description: Option<String>,
    /// New price
    pub price: Option<f64>,
    /// Remove the price altogether
    pub clear_price: bool,
    /// New product link; empty clears it
    pub product_url: Option<String>,
    /// New picture link; empty clears it
    pub image_url: Option<String>,
    /// New priority
    pub priority: Option<Priority>,
    /// New notes; empty clears them
    pub notes: Option<String>,
    /// Category to move to
    pub category_id: Option<i64>,
}

impl UpdateItemRequest {
    /// Checks the fields and converts to core [`ItemChanges`].
    pub fn into_changes(self) -> Result<ItemChanges> {
        if let Some(title) = &self.title {
            require_text("Title", title, MAX_TITLE_LENGTH)?;
        }
        if self.clear_price && self.price.is_some() {
            return Err(Error::validation("Set a price or clear it, not both"));
        }
        let price = if self.clear_price {
            Some(None)
        } else {
            validate_price(self.price)?.map(Some)
        };
        let product_url = clearable(self.product_url)
            .map(|url| validate_url("Product URL", url))
            .transpose()?;
        let image_url = clearable(self.image_url)
            .map(|url| validate_url("Image URL", url))
            .transpose()?;

        Ok(ItemChanges {
            title: self.title,
            description: clearable(self.description),
            price,
            product_url,
            image_url,
            priority: self.priority,
            notes: clearable(self.notes),
            category_id: self.category_id,
        })
    }
}

/// Query of `GET /families/{id}/items`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListItemsQuery {
    /// Only items in this category
    pub category_id: Option<i64>,
}

/// Body of `POST /items/{id}/purchase`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PurchaseRequest {
    /// Private notes for the purchaser
    pub notes: Option<String>,
}
