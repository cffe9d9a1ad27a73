//! Membership authorization - the single choke point for family-scoped operations.
//!
//! [`authorize_family_access`] answers whether a user may act on a family, optionally
//! requiring the ADMIN role, and hands back the membership row so callers do not
//! look it up twice. The guard functions below layer the rules that depend on the
//! relationship between the acting user and a target user, or on the family as a
//! whole, on top of that primitive.

use crate::{
    entities::{FamilyMember, MemberRole, MemberStatus, family_member},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, prelude::*};
use tracing::debug;

/// Looks up the membership row for `(user_id, family_id)`, whatever its status.
pub async fn find_membership<C>(
    db: &C,
    user_id: i64,
    family_id: i64,
) -> Result<Option<family_member::Model>>
where
    C: ConnectionTrait,
{
    FamilyMember::find()
        .filter(family_member::Column::UserId.eq(user_id))
        .filter(family_member::Column::FamilyId.eq(family_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Checks that `user_id` may act on `family_id`, optionally with `required_role`.
///
/// Checks run in a fixed order: membership exists, membership is active, role is
/// sufficient. A missing family and a missing membership both yield
/// [`Error::NotAMember`], so outsiders learn nothing about which families exist.
///
/// # Errors
/// - [`Error::NotAMember`] when no membership row exists
/// - [`Error::MembershipInactive`] when the row is not ACTIVE
/// - [`Error::InsufficientRole`] when ADMIN is required and the member is not one
pub async fn authorize_family_access<C>(
    db: &C,
    user_id: i64,
    family_id: i64,
    required_role: Option<MemberRole>,
) -> Result<family_member::Model>
where
    C: ConnectionTrait,
{
    let Some(membership) = find_membership(db, user_id, family_id).await? else {
        debug!(user_id, family_id, "Rejected: not a member");
        return Err(Error::NotAMember { family_id });
    };

    if membership.status != MemberStatus::Active {
        debug!(user_id, family_id, status = ?membership.status, "Rejected: inactive membership");
        return Err(Error::MembershipInactive { family_id });
    }

    if let Some(required) = required_role {
        if required == MemberRole::Admin && membership.role != MemberRole::Admin {
            debug!(user_id, family_id, "Rejected: admin role required");
            return Err(Error::InsufficientRole {
                family_id,
                required,
            });
        }
    }

    Ok(membership)
}

/// Rejects family-management operations an admin aims at themselves.
///
/// `action` completes the sentence "You cannot ... yourself".
pub fn ensure_not_self(
    acting_user_id: i64,
    target_user_id: i64,
    action: &'static str,
) -> Result<()> {
    if acting_user_id == target_user_id {
        return Err(Error::SelfActionForbidden { action });
    }
    Ok(())
}

/// Loads the membership of the user an admin is acting on.
///
/// # Errors
/// [`Error::NotFound`] if the target has no membership row in the family.
pub async fn find_target_membership<C>(
    db: &C,
    family_id: i64,
    target_user_id: i64,
) -> Result<family_member::Model>
where
    C: ConnectionTrait,
{
    find_membership(db, target_user_id, family_id)
        .await?
        .ok_or_else(|| Error::not_found("family member", target_user_id))
}

/// Number of ACTIVE members with the ADMIN role.
pub async fn count_active_admins<C>(db: &C, family_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    FamilyMember::find()
        .filter(family_member::Column::FamilyId.eq(family_id))
        .filter(family_member::Column::Status.eq(MemberStatus::Active))
        .filter(family_member::Column::Role.eq(MemberRole::Admin))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Number of ACTIVE members regardless of role.
pub async fn count_active_members<C>(db: &C, family_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    FamilyMember::find()
        .filter(family_member::Column::FamilyId.eq(family_id))
        .filter(family_member::Column::Status.eq(MemberStatus::Active))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Demotion guard: the family must currently have more than one active admin.
pub async fn ensure_admin_remains_after_demotion<C>(db: &C, family_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    if count_active_admins(db, family_id).await? <= 1 {
        return Err(Error::LastAdminCannotBeDemoted);
    }
    Ok(())
}

/// Departure guard: the last active admin may not walk away from a family that
/// still has other active members.
pub async fn ensure_admin_remains_after_departure<C>(
    db: &C,
    membership: &family_member::Model,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if !membership.is_active_admin() {
        return Ok(());
    }
    let admins = count_active_admins(db, membership.family_id).await?;
    let members = count_active_members(db, membership.family_id).await?;
    if admins <= 1 && members > 1 {
        return Err(Error::LastAdminCannotLeave);
    }
    Ok(())
}

/// Deletion guard: the acting admin must be the family's only active member.
pub async fn ensure_sole_active_member<C>(db: &C, family_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let active_members = count_active_members(db, family_id).await?;
    if active_members != 1 {
        return Err(Error::FamilyNotEmpty { active_members });
    }
    Ok(())
}
