//! Promotional offer endpoints.

use api_types::{
    booking::PriceView,
    offer::{OfferNew, OfferUpdate, OfferValidate, OfferView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::RentalPeriod;
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn active(
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<Vec<OfferView>>), ServerError> {
    let offers = state.engine.active_offers(Utc::now().date_naive()).await?;
    Ok((StatusCode::OK, Json(offers.iter().map(views::offer_view).collect())))
}

pub async fn validate(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<OfferValidate>,
) -> Result<(StatusCode, Json<PriceView>), ServerError> {
    let period = RentalPeriod::new(payload.start, payload.end)?;
    let price = state
        .engine
        .validate_offer(
            user.id,
            &payload.code,
            payload.car_id,
            period,
            Utc::now().date_naive(),
        )
        .await?;
    Ok((StatusCode::OK, Json(views::price_view(&price))))
}

pub async fn list_all(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
) -> Result<(StatusCode, Json<Vec<OfferView>>), ServerError> {
    let offers = state.engine.list_offers(user.id).await?;
    Ok((StatusCode::OK, Json(offers.iter().map(views::offer_view).collect())))
}

pub async fn create(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<OfferNew>,
) -> Result<(StatusCode, Json<OfferView>), ServerError> {
    let offer = state
        .engine
        .create_offer(
            user.id,
            engine::NewOffer {
                code: payload.code,
                title: payload.title,
                description: payload.description,
                discount: views::discount(payload.discount),
                max_discount_minor: payload.max_discount_minor,
                min_subtotal_minor: payload.min_subtotal_minor,
                valid_from: payload.valid_from,
                valid_until: payload.valid_until,
                usage_limit: payload.usage_limit,
                per_user_limit: payload.per_user_limit,
                car_category: payload.car_category.map(views::category),
                first_booking_only: payload.first_booking_only,
            },
            payload.notify_users,
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(views::offer_view(&offer))))
}

pub async fn update(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(offer_id): Path<Uuid>,
    Json(payload): Json<OfferUpdate>,
) -> Result<(StatusCode, Json<OfferView>), ServerError> {
    let offer = state
        .engine
        .update_offer(
            user.id,
            offer_id,
            engine::OfferUpdate {
                title: payload.title,
                description: payload.description,
                valid_until: payload.valid_until,
                usage_limit: payload.usage_limit,
                active: payload.active,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(views::offer_view(&offer))))
}
