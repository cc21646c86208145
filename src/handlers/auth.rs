use axum::{extract::State, Json};
use validator::Validate;

use crate::dto::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::models::profile::{generate_invite_code, NewProfile};
use crate::AppState;

/// Creates the account with the identity provider, then the profile row.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();
    let full_name = body
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let session = state
        .identity
        .sign_up(&email, &body.password, full_name)
        .await?;

    let profile = state
        .store
        .upsert_profile(NewProfile {
            id: session.user_id,
            email: if session.email.is_empty() {
                email.clone()
            } else {
                session.email.clone()
            },
            full_name: full_name.map(str::to_string),
            invite_code: generate_invite_code(),
        })
        .await?;

    tracing::info!(user_id = %profile.id, "User registered");

    Ok(Json(AuthResponse {
        access_token: session.access_token,
        user: profile,
        message: "Registration successful".into(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();
    let session = state.identity.sign_in(&email, &body.password).await?;

    let profile = state
        .store
        .get_profile(session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    tracing::info!(user_id = %profile.id, "User logged in");

    Ok(Json(AuthResponse {
        access_token: session.access_token,
        user: profile,
        message: "Login successful".into(),
    }))
}
