//! Family lifecycle - creation, joining, leaving, role changes and deletion.
//!
//! Every operation authorizes through [`crate::core::access`] before it reads or
//! writes family data. Multi-row changes (creating a family with its admin and
//! default categories, leaving every family to join another) run in a single
//! store transaction so no partial state is ever visible.

use crate::{
    config::{FamilySettings, MembershipPolicy},
    core::{
        access::{
            authorize_family_access, count_active_members, ensure_admin_remains_after_demotion,
            ensure_admin_remains_after_departure, ensure_not_self, ensure_sole_active_member,
            find_membership, find_target_membership,
        },
        invite::{InviteCodeGenerator, find_family_by_invite_code, generate_unique_invite_code},
        is_unique_violation,
        user::{self, MIN_PASSWORD_LENGTH, PasswordHasher},
    },
    entities::{
        Category, Currency, Family, FamilyMember, MemberRole, MemberStatus, User, category,
        family, family_member,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Categories every new family starts with: `(name, description)`.
pub const DEFAULT_CATEGORIES: [(&str, &str); 8] = [
    ("Electronics", "Gadgets, devices and accessories"),
    ("Books", "Books, e-books and audiobooks"),
    ("Clothing", "Clothes, shoes and accessories"),
    ("Home & Kitchen", "Things for the house"),
    ("Toys & Games", "Toys, board games and video games"),
    ("Sports & Outdoors", "Gear for staying active"),
    ("Beauty & Health", "Personal care and wellness"),
    ("Other", "Everything else"),
];

/// Longest family name accepted
pub const MAX_FAMILY_NAME_LENGTH: usize = 100;

/// Which optional collections [`get_family`] should load.
#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyIncludes {
    /// Load the family's categories
    pub categories: bool,
    /// Load the family's members
    pub members: bool,
}

/// A member as shown to other members of the same family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberSummary {
    /// Member's user id
    pub user_id: i64,
    /// Member's display name
    pub display_name: String,
    /// Member's email
    pub email: String,
    /// Role within the family
    pub role: MemberRole,
    /// Membership status
    pub status: MemberStatus,
    /// When the member (re)joined
    pub joined_at: chrono::DateTime<Utc>,
}

/// A family together with the caller's membership and any requested collections.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyDetails {
    /// The family row
    pub family: family::Model,
    /// The caller's own membership
    pub membership: family_member::Model,
    /// Present when [`FamilyIncludes::categories`] was requested
    pub categories: Option<Vec<category::Model>>,
    /// Present when [`FamilyIncludes::members`] was requested
    pub members: Option<Vec<MemberSummary>>,
}

/// Partial update of a family's editable fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct FamilyChanges {
    /// New name
    pub name: Option<String>,
    /// New description; `Some(None)` clears it
    pub description: Option<Option<String>>,
    /// New display currency
    pub currency: Option<Currency>,
}

fn validate_family_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Family name cannot be empty"));
    }
    if name.chars().count() > MAX_FAMILY_NAME_LENGTH {
        return Err(Error::validation(format!(
            "Family name cannot exceed {MAX_FAMILY_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Creates a family with `creator_user_id` as its only (ADMIN) member and the
/// eight default categories, all in one transaction.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or too long
/// - The creator does not exist
/// - No unique invite code could be drawn
/// - Any insert fails (nothing is kept in that case)
pub async fn create_family(
    db: &DatabaseConnection,
    generator: &dyn InviteCodeGenerator,
    creator_user_id: i64,
    name: &str,
    description: Option<String>,
    currency: Currency,
) -> Result<family::Model> {
    let name = validate_family_name(name)?;

    let txn = db.begin().await?;

    user::get_user(&txn, creator_user_id).await?;
    let invite_code = generate_unique_invite_code(&txn, generator).await?;

    let now = Utc::now();
    let family = family::ActiveModel {
        name: Set(name),
        description: Set(clean_optional(description)),
        invite_code: Set(invite_code),
        currency: Set(currency),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    family_member::ActiveModel {
        user_id: Set(creator_user_id),
        family_id: Set(family.id),
        role: Set(MemberRole::Admin),
        status: Set(MemberStatus::Active),
        joined_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let defaults = DEFAULT_CATEGORIES
        .iter()
        .map(|(category_name, category_description)| category::ActiveModel {
            name: Set((*category_name).to_string()),
            description: Set(Some((*category_description).to_string())),
            family_id: Set(family.id),
            is_default: Set(true),
            created_at: Set(now),
            ..Default::default()
        });
    Category::insert_many(defaults).exec(&txn).await?;

    txn.commit().await?;

    info!(
        family_id = family.id,
        creator_user_id, "Created family '{}'", family.name
    );
    Ok(family)
}

/// Loads a family the caller belongs to, with optional categories and members.
pub async fn get_family(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
    includes: FamilyIncludes,
) -> Result<FamilyDetails> {
    let membership = authorize_family_access(db, user_id, family_id, None).await?;
    let family = Family::find_by_id(family_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("family", family_id))?;

    let categories = if includes.categories {
        Some(
            Category::find()
                .filter(category::Column::FamilyId.eq(family_id))
                .order_by_asc(category::Column::Name)
                .all(db)
                .await?,
        )
    } else {
        None
    };

    let members = if includes.members {
        Some(load_member_summaries(db, family_id).await?)
    } else {
        None
    };

    Ok(FamilyDetails {
        family,
        membership,
        categories,
        members,
    })
}

async fn load_member_summaries<C>(db: &C, family_id: i64) -> Result<Vec<MemberSummary>>
where
    C: ConnectionTrait,
{
    let rows = FamilyMember::find()
        .filter(family_member::Column::FamilyId.eq(family_id))
        .filter(family_member::Column::Status.eq(MemberStatus::Active))
        .order_by_asc(family_member::Column::JoinedAt)
        .find_also_related(User)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(member, user)| {
            user.map(|user| MemberSummary {
                user_id: member.user_id,
                display_name: user.display_name,
                email: user.email,
                role: member.role,
                status: member.status,
                joined_at: member.joined_at,
            })
        })
        .collect())
}

/// Lists the active members of a family the caller belongs to.
pub async fn list_members(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
) -> Result<Vec<MemberSummary>> {
    authorize_family_access(db, user_id, family_id, None).await?;
    load_member_summaries(db, family_id).await
}

/// Families in which `user_id` holds an active membership, with the user's role.
pub async fn list_user_families(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<(family::Model, MemberRole)>> {
    let rows = FamilyMember::find()
        .filter(family_member::Column::UserId.eq(user_id))
        .filter(family_member::Column::Status.eq(MemberStatus::Active))
        .find_also_related(Family)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(member, family)| family.map(|family| (family, member.role)))
        .collect())
}

/// Updates a family's name, description or currency. ADMIN only.
pub async fn update_family(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
    changes: FamilyChanges,
) -> Result<family::Model> {
    authorize_family_access(db, user_id, family_id, Some(MemberRole::Admin)).await?;

    let family = Family::find_by_id(family_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("family", family_id))?;

    let mut active: family::ActiveModel = family.into();
    if let Some(name) = changes.name {
        active.name = Set(validate_family_name(&name)?);
    }
    if let Some(description) = changes.description {
        active.description = Set(clean_optional(description));
    }
    if let Some(currency) = changes.currency {
        active.currency = Set(currency);
    }
    active.updated_at = Set(Utc::now());

    let family = active.update(db).await?;
    info!(family_id, user_id, "Updated family");
    Ok(family)
}

/// Puts `user_id` into `family`, reactivating an old membership row if there is one.
///
/// Shared by [`join_family`] and [`leave_and_join`]; runs on the caller's transaction.
async fn admit_member<C>(
    db: &C,
    settings: &FamilySettings,
    user_id: i64,
    family: &family::Model,
) -> Result<family_member::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();

    if let Some(existing) = find_membership(db, user_id, family.id).await? {
        if existing.status == MemberStatus::Active {
            return Err(Error::AlreadyMember);
        }

        // Old rows come back as plain members
        let mut active: family_member::ActiveModel = existing.into();
        active.status = Set(MemberStatus::Active);
        active.role = Set(MemberRole::Member);
        active.joined_at = Set(now);
        let membership = active.update(db).await?;
        info!(user_id, family_id = family.id, "Reactivated family membership");
        return Ok(membership);
    }

    let active_members = count_active_members(db, family.id).await?;
    if active_members >= settings.max_members {
        warn!(family_id = family.id, active_members, "Join rejected: family full");
        return Err(Error::FamilyFull {
            limit: settings.max_members,
        });
    }

    let membership = family_member::ActiveModel {
        user_id: Set(user_id),
        family_id: Set(family.id),
        role: Set(MemberRole::Member),
        status: Set(MemberStatus::Active),
        joined_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            Error::AlreadyMember
        } else {
            err.into()
        }
    })?;

    info!(user_id, family_id = family.id, "Joined family");
    Ok(membership)
}

/// Joins the family identified by `invite_code` as a MEMBER.
///
/// # Errors
/// - [`Error::InvalidInviteCode`] for malformed or unknown codes
/// - [`Error::AlreadyMember`] if the user is already active in the family
/// - [`Error::FamilyFull`] if the family is at its member cap
pub async fn join_family(
    db: &DatabaseConnection,
    settings: &FamilySettings,
    user_id: i64,
    invite_code: &str,
) -> Result<family_member::Model> {
    let txn = db.begin().await?;
    let family = find_family_by_invite_code(&txn, invite_code).await?;
    let membership = admit_member(&txn, settings, user_id, &family).await?;
    txn.commit().await?;
    Ok(membership)
}

/// Joins the family identified by `invite_code`, first dropping every other active
/// membership when the single-family policy is in force.
///
/// Under [`MembershipPolicy::MultiFamily`] this is the same as [`join_family`].
///
/// # Errors
/// As [`join_family`], plus [`Error::LastAdminCannotLeave`] if the user is the last
/// admin of a family that still has other active members.
pub async fn leave_and_join(
    db: &DatabaseConnection,
    settings: &FamilySettings,
    user_id: i64,
    invite_code: &str,
) -> Result<family_member::Model> {
    if settings.membership_policy == MembershipPolicy::MultiFamily {
        return join_family(db, settings, user_id, invite_code).await;
    }

    let txn = db.begin().await?;
    let target = find_family_by_invite_code(&txn, invite_code).await?;

    let current = FamilyMember::find()
        .filter(family_member::Column::UserId.eq(user_id))
        .filter(family_member::Column::Status.eq(MemberStatus::Active))
        .all(&txn)
        .await?;

    if current.iter().any(|m| m.family_id == target.id) {
        return Err(Error::AlreadyMember);
    }

    for membership in current {
        ensure_admin_remains_after_departure(&txn, &membership).await?;
        let family_id = membership.family_id;
        membership.delete(&txn).await?;
        debug!(user_id, family_id, "Dropped membership before switching family");
    }

    let membership = admit_member(&txn, settings, user_id, &target).await?;
    txn.commit().await?;

    info!(user_id, family_id = target.id, "Switched to family");
    Ok(membership)
}

/// Leaves a family; the membership row is kept as INACTIVE so a later join
/// reactivates it.
///
/// # Errors
/// [`Error::LastAdminCannotLeave`] if the caller is the last active admin and other
/// active members remain.
pub async fn leave_family(
    db: &DatabaseConnection,
    user_id: i64,
    family_id: i64,
) -> Result<family_member::Model> {
    let txn = db.begin().await?;
    let membership = authorize_family_access(&txn, user_id, family_id, None).await?;
    ensure_admin_remains_after_departure(&txn, &membership).await?;

    let mut active: family_member::ActiveModel = membership.into();
    active.status = Set(MemberStatus::Inactive);
    let membership = active.update(&txn).await?;
    txn.commit().await?;

    info!(user_id, family_id, "Left family");
    Ok(membership)
}

/// Gives `target_user_id` the ADMIN role. ADMIN only; not on oneself.
pub async fn promote_member(
    db: &DatabaseConnection,
    family_id: i64,
    acting_user_id: i64,
    target_user_id: i64,
) -> Result<family_member::Model> {
    authorize_family_access(db, acting_user_id, family_id, Some(MemberRole::Admin)).await?;
    ensure_not_self(acting_user_id, target_user_id, "promote")?;

    let target = find_target_membership(db, family_id, target_user_id).await?;
    if target.status != MemberStatus::Active {
        return Err(Error::validation("Only active members can be promoted"));
    }
    if target.role == MemberRole::Admin {
        return Err(Error::validation("Member is already an admin"));
    }

    let mut active: family_member::ActiveModel = target.into();
    active.role = Set(MemberRole::Admin);
    let membership = active.update(db).await?;

    info!(family_id, acting_user_id, target_user_id, "Promoted member to admin");
    Ok(membership)
}

/// Takes the ADMIN role away from `target_user_id`. ADMIN only; not on oneself.
///
/// # Errors
/// [`Error::LastAdminCannotBeDemoted`] unless the family has more than one active admin.
pub async fn demote_member(
    db: &DatabaseConnection,
    family_id: i64,
    acting_user_id: i64,
    target_user_id: i64,
) -> Result<family_member::Model> {
    let txn = db.begin().await?;
    authorize_family_access(&txn, acting_user_id, family_id, Some(MemberRole::Admin)).await?;
    ensure_not_self(acting_user_id, target_user_id, "demote")?;

    let target = find_target_membership(&txn, family_id, target_user_id).await?;
    if target.role != MemberRole::Admin {
        return Err(Error::validation("Member is not an admin"));
    }
    ensure_admin_remains_after_demotion(&txn, family_id).await?;

    let mut active: family_member::ActiveModel = target.into();
    active.role = Set(MemberRole::Member);
    let membership = active.update(&txn).await?;
    txn.commit().await?;

    info!(family_id, acting_user_id, target_user_id, "Demoted admin to member");
    Ok(membership)
}

/// Removes a MEMBER from the family (the row is deleted). ADMIN only; not on
/// oneself and not on other admins.
pub async fn remove_member(
    db: &DatabaseConnection,
    family_id: i64,
    acting_user_id: i64,
    target_user_id: i64,
) -> Result<()> {
    authorize_family_access(db, acting_user_id, family_id, Some(MemberRole::Admin)).await?;
    ensure_not_self(acting_user_id, target_user_id, "remove")?;

    let target = find_target_membership(db, family_id, target_user_id).await?;
    if target.role == MemberRole::Admin {
        return Err(Error::CannotRemoveAdmin);
    }

    target.delete(db).await?;
    info!(family_id, acting_user_id, target_user_id, "Removed member from family");
    Ok(())
}

/// Deletes a MEMBER's whole account, cascading to everything they own. Same
/// guards as [`remove_member`].
pub async fn delete_family_member_account(
    db: &DatabaseConnection,
    family_id: i64,
    acting_user_id: i64,
    target_user_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    authorize_family_access(&txn, acting_user_id, family_id, Some(MemberRole::Admin)).await?;
    ensure_not_self(acting_user_id, target_user_id, "delete")?;

    let target = find_target_membership(&txn, family_id, target_user_id).await?;
    if target.role == MemberRole::Admin {
        return Err(Error::CannotDeleteAdmin);
    }

    user::delete_user(&txn, target_user_id).await?;
    txn.commit().await?;

    warn!(family_id, acting_user_id, target_user_id, "Deleted member account");
    Ok(())
}

/// Sets a new password for another member of the family. ADMIN only; not on
/// oneself. Clears any lockout and revokes the member's refresh tokens.
pub async fn reset_member_password(
    db: &DatabaseConnection,
    hasher: &dyn PasswordHasher,
    family_id: i64,
    acting_user_id: i64,
    target_user_id: i64,
    new_password: &str,
) -> Result<()> {
    authorize_family_access(db, acting_user_id, family_id, Some(MemberRole::Admin)).await?;
    ensure_not_self(acting_user_id, target_user_id, "reset the password of")?;
    find_target_membership(db, family_id, target_user_id).await?;

    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    let password_hash = hasher.hash_password(new_password)?;

    let txn = db.begin().await?;
    let revoked = user::replace_password_hash(&txn, target_user_id, password_hash).await?;
    txn.commit().await?;

    info!(
        family_id,
        acting_user_id, target_user_id, revoked, "Reset member password"
    );
    Ok(())
}

/// Replaces the family's invite code; the old code stops working immediately.
/// ADMIN only.
pub async fn regenerate_invite_code(
    db: &DatabaseConnection,
    generator: &dyn InviteCodeGenerator,
    family_id: i64,
    acting_user_id: i64,
) -> Result<String> {
    let txn = db.begin().await?;
    authorize_family_access(&txn, acting_user_id, family_id, Some(MemberRole::Admin)).await?;

    let family = Family::find_by_id(family_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("family", family_id))?;
    let invite_code = generate_unique_invite_code(&txn, generator).await?;

    let mut active: family::ActiveModel = family.into();
    active.invite_code = Set(invite_code.clone());
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;
    txn.commit().await?;

    info!(family_id, acting_user_id, "Regenerated invite code");
    Ok(invite_code)
}

/// Deletes a family along with its categories, items and reservations. Only
/// an ADMIN who is the family's last active member may do this.
pub async fn delete_family(
    db: &DatabaseConnection,
    family_id: i64,
    acting_user_id: i64,
) -> Result<()> {
    let txn = db.begin().await?;
    authorize_family_access(&txn, acting_user_id, family_id, Some(MemberRole::Admin)).await?;
    ensure_sole_active_member(&txn, family_id).await?;

    Family::delete_by_id(family_id).exec(&txn).await?;
    txn.commit().await?;

    warn!(family_id, acting_user_id, "Deleted family");
    Ok(())
}
