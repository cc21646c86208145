use axum::{extract::State, Extension, Json};
use validator::Validate;

use super::current_profile;
use crate::auth::middleware::AuthUser;
use crate::dto::{InvitePartnerRequest, InvitePartnerResponse, UpdateProfileRequest};
use crate::error::{AppError, AppResult};
use crate::models::profile::Profile;
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Profile>> {
    Ok(Json(current_profile(&state, auth_user.id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    body.validate()?;
    if body.full_name.is_none() && body.allow_read_receipts.is_none() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }

    let profile = state
        .store
        .update_profile(auth_user.id, body.into())
        .await?;
    Ok(Json(profile))
}

/// Links the caller with the owner of `invite_code`.
pub async fn invite_partner(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<InvitePartnerRequest>,
) -> AppResult<Json<InvitePartnerResponse>> {
    body.validate()?;
    let code = body.invite_code.trim().to_uppercase();

    let me = current_profile(&state, auth_user.id).await?;
    let partner = state
        .store
        .find_profile_by_invite_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid invite code".into()))?;

    if partner.id == me.id {
        return Err(AppError::BadRequest("Cannot invite yourself".into()));
    }
    if me.partner_id.is_some_and(|p| p != partner.id) {
        return Err(AppError::Conflict("You already have a partner".into()));
    }
    if partner.partner_id.is_some_and(|p| p != me.id) {
        return Err(AppError::Conflict("This user already has a partner".into()));
    }

    state.store.link_partners(me.id, partner.id).await?;
    tracing::info!(user_id = %me.id, partner_id = %partner.id, "Partners linked");

    Ok(Json(InvitePartnerResponse {
        message: "Partner connected successfully".into(),
        partner_name: partner.display_name().to_string(),
    }))
}
