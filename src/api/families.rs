//! Family, membership and category handlers.

use crate::{
    api::{
        AppState, Principal,
        requests::{
            CreateCategoryRequest, CreateFamilyRequest, GetFamilyQuery, JoinFamilyRequest,
            ResetPasswordRequest, UpdateCategoryRequest, UpdateFamilyRequest,
        },
    },
    core::{
        category,
        family::{self, FamilyDetails, MemberSummary},
    },
    entities::{CategoryModel, FamilyMemberModel, FamilyModel, MemberRole},
    errors::Result,
};
use serde::Serialize;

/// One of the caller's families and the caller's role in it.
#[derive(Debug, Clone, Serialize)]
pub struct FamilyMembershipSummary {
    /// The family
    pub family: FamilyModel,
    /// Caller's role
    pub role: MemberRole,
}

/// `POST /families`
pub async fn create_family(
    state: &AppState,
    principal: &Principal,
    request: CreateFamilyRequest,
) -> Result<FamilyModel> {
    request.validate()?;
    family::create_family(
        &state.database,
        state.invite_codes.as_ref(),
        principal.id,
        &request.name,
        request.description,
        request.currency,
    )
    .await
}

/// `GET /families`
pub async fn list_my_families(
    state: &AppState,
    principal: &Principal,
) -> Result<Vec<FamilyMembershipSummary>> {
    let families = family::list_user_families(&state.database, principal.id).await?;
    Ok(families
        .into_iter()
        .map(|(family, role)| FamilyMembershipSummary { family, role })
        .collect())
}

/// `GET /families/{id}`
pub async fn get_family(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    query: GetFamilyQuery,
) -> Result<FamilyDetails> {
    family::get_family(&state.database, principal.id, family_id, query.into()).await
}

/// `PATCH /families/{id}`
pub async fn update_family(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    request: UpdateFamilyRequest,
) -> Result<FamilyModel> {
    let changes = request.into_changes()?;
    family::update_family(&state.database, principal.id, family_id, changes).await
}

/// `DELETE /families/{id}`
pub async fn delete_family(state: &AppState, principal: &Principal, family_id: i64) -> Result<()> {
    family::delete_family(&state.database, family_id, principal.id).await
}

/// `POST /families/join`, throttled per `client_key`.
pub async fn join_family(
    state: &AppState,
    principal: &Principal,
    client_key: &str,
    request: JoinFamilyRequest,
) -> Result<FamilyMemberModel> {
    state.rate_limiter.check(client_key)?;
    let code = request.normalized_code()?;
    family::join_family(&state.database, &state.settings.families, principal.id, &code).await
}

/// `POST /families/switch`, throttled per `client_key`.
pub async fn switch_family(
    state: &AppState,
    principal: &Principal,
    client_key: &str,
    request: JoinFamilyRequest,
) -> Result<FamilyMemberModel> {
    state.rate_limiter.check(client_key)?;
    let code = request.normalized_code()?;
    family::leave_and_join(&state.database, &state.settings.families, principal.id, &code).await
}

/// `POST /families/{id}/leave`
pub async fn leave_family(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
) -> Result<FamilyMemberModel> {
    family::leave_family(&state.database, principal.id, family_id).await
}

/// `POST /families/{id}/invite-code`
pub async fn regenerate_invite_code(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
) -> Result<String> {
    family::regenerate_invite_code(
        &state.database,
        state.invite_codes.as_ref(),
        family_id,
        principal.id,
    )
    .await
}

/// `GET /families/{id}/members`
pub async fn list_members(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
) -> Result<Vec<MemberSummary>> {
    family::list_members(&state.database, principal.id, family_id).await
}

/// `POST /families/{id}/members/{userId}/promote`
pub async fn promote_member(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    target_user_id: i64,
) -> Result<FamilyMemberModel> {
    family::promote_member(&state.database, family_id, principal.id, target_user_id).await
}

/// `POST /families/{id}/members/{userId}/demote`
pub async fn demote_member(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    target_user_id: i64,
) -> Result<FamilyMemberModel> {
    family::demote_member(&state.database, family_id, principal.id, target_user_id).await
}

/// `DELETE /families/{id}/members/{userId}`
pub async fn remove_member(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    target_user_id: i64,
) -> Result<()> {
    family::remove_member(&state.database, family_id, principal.id, target_user_id).await
}

/// `DELETE /families/{id}/members/{userId}/account`
pub async fn delete_member_account(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    target_user_id: i64,
) -> Result<()> {
    family::delete_family_member_account(&state.database, family_id, principal.id, target_user_id)
        .await
}

/// `POST /families/{id}/members/{userId}/password`
pub async fn reset_member_password(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    target_user_id: i64,
    request: ResetPasswordRequest,
) -> Result<()> {
    request.validate()?;
    family::reset_member_password(
        &state.database,
        state.password_hasher.as_ref(),
        family_id,
        principal.id,
        target_user_id,
        &request.new_password,
    )
    .await
}

/// `GET /families/{id}/categories`
pub async fn list_categories(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
) -> Result<Vec<CategoryModel>> {
    category::list_categories(&state.database, principal.id, family_id).await
}

/// `POST /families/{id}/categories`
pub async fn create_category(
    state: &AppState,
    principal: &Principal,
    family_id: i64,
    request: CreateCategoryRequest,
) -> Result<CategoryModel> {
    request.validate()?;
    category::create_category(
        &state.database,
        principal.id,
        family_id,
        &request.name,
        request.description,
    )
    .await
}

/// `PATCH /categories/{id}`
pub async fn update_category(
    state: &AppState,
    principal: &Principal,
    category_id: i64,
    request: UpdateCategoryRequest,
) -> Result<CategoryModel> {
    request.validate()?;
    let description = request
        .description
        .map(|d| Some(d).filter(|d| !d.trim().is_empty()));
    category::update_category(
        &state.database,
        principal.id,
        category_id,
        request.name.as_deref(),
        description,
    )
    .await
}

/// `DELETE /categories/{id}`
pub async fn delete_category(
    state: &AppState,
    principal: &Principal,
    category_id: i64,
) -> Result<()> {
    category::delete_category(&state.database, principal.id, category_id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{api::rate_limit::FixedWindowRateLimiter, config::RateLimitSettings, errors::Error};
    use crate::test_utils::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_family_handlers_end_to_end() -> Result<()> {
        let state = setup_test_state().await?;
        let alice = Principal::from(&create_test_user(&state.database, "alice").await?);
        let bob = Principal::from(&create_test_user(&state.database, "bob").await?);

        let request: CreateFamilyRequest =
            serde_json::from_str(r#"{"name": "Smiths", "currency": "GBP"}"#).unwrap();
        let family = create_family(&state, &alice, request).await?;

        let join = JoinFamilyRequest {
            invite_code: family.invite_code.to_lowercase(),
        };
        join_family(&state, &bob, "203.0.113.7", join).await?;

        let details = get_family(
            &state,
            &bob,
            family.id,
            GetFamilyQuery {
                include_categories: true,
                include_members: true,
            },
        )
        .await?;
        assert_eq!(details.categories.unwrap().len(), 8);
        assert_eq!(details.members.unwrap().len(), 2);

        let mine = list_my_families(&state, &bob).await?;
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].role, MemberRole::Member);

        Ok(())
    }

    #[tokio::test]
    async fn test_join_is_rate_limited() -> Result<()> {
        let state = setup_test_state().await?.with_rate_limiter(Arc::new(
            FixedWindowRateLimiter::new(&RateLimitSettings {
                max_requests: 2,
                window_seconds: 60,
            }),
        ));
        let bob = Principal::from(&create_test_user(&state.database, "bob").await?);

        for _ in 0..2 {
            let request = JoinFamilyRequest {
                invite_code: "22222222".to_string(),
            };
            let result = join_family(&state, &bob, "198.51.100.1", request).await;
            assert!(matches!(result.unwrap_err(), Error::InvalidInviteCode));
        }

        let request = JoinFamilyRequest {
            invite_code: "22222222".to_string(),
        };
        let result = join_family(&state, &bob, "198.51.100.1", request).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::RateLimited {
                retry_after_secs: _
            }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_category_clears_description() -> Result<()> {
        let state = setup_test_state().await?;
        let alice = Principal::from(&create_test_user(&state.database, "alice").await?);
        let family = create_test_family(&state.database, alice.id, "Smiths").await?;
        let category = first_category(&state.database, family.id).await?;

        let request: UpdateCategoryRequest =
            serde_json::from_str(r#"{"description": ""}"#).unwrap();
        let updated = update_category(&state, &alice, category.id, request).await?;
        assert!(updated.description.is_none());
        assert_eq!(updated.name, category.name);

        Ok(())
    }
}
