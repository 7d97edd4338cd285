//! Account endpoints for the authenticated caller.

use api_types::{
    referral::ReferralSummaryView,
    user::{PasswordChange, ProfileUpdate, Register, UserView},
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::{ServerError, server::ServerState, views};

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let user = state
        .engine
        .register(
            engine::NewUser {
                username: payload.username,
                email: payload.email,
                password: payload.password,
                full_name: payload.full_name,
                phone: payload.phone,
                referral_code: payload.referral_code,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(views::user_view(&user))))
}

pub async fn me(
    Extension(user): Extension<engine::User>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    Ok((StatusCode::OK, Json(views::user_view(&user))))
}

pub async fn update_me(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let updated = state
        .engine
        .update_profile(
            user.id,
            engine::ProfileUpdate {
                email: payload.email,
                full_name: payload.full_name,
                phone: payload.phone,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(views::user_view(&updated))))
}

pub async fn change_password(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<PasswordChange>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .change_password(user.id, &payload.old_password, &payload.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn referrals(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<ReferralSummaryView>), ServerError> {
    let summary = state.engine.referrals_for(user.id).await?;
    Ok((StatusCode::OK, Json(views::referral_summary_view(&summary))))
}
