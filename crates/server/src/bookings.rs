//! Booking endpoints for customers and the admin rental desk.

use api_types::booking::{
    AdminBookingQuery, BookingQuery, BookingRequest, BookingView, CancellationQuoteView,
    PaymentConfirm, PriceView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{BookingFilter, RentalPeriod};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

fn booking_request(payload: BookingRequest) -> Result<engine::BookingRequest, ServerError> {
    Ok(engine::BookingRequest {
        car_id: payload.car_id,
        period: RentalPeriod::new(payload.start, payload.end)?,
        offer_code: payload.offer_code,
        use_credit: payload.use_credit,
    })
}

pub async fn quote(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<PriceView>), ServerError> {
    let price = state
        .engine
        .quote_booking(user.id, booking_request(payload)?, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::price_view(&price))))
}

pub async fn create(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .create_booking(user.id, booking_request(payload)?, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(views::booking_view(&booking))))
}

pub async fn list(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<BookingQuery>,
) -> Result<(StatusCode, Json<Vec<BookingView>>), ServerError> {
    let bookings = state
        .engine
        .bookings_for_user(user.id, query.status.map(views::booking_status))
        .await?;
    Ok((
        StatusCode::OK,
        Json(bookings.iter().map(views::booking_view).collect()),
    ))
}

pub async fn get(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state.engine.booking(user.id, booking_id).await?;
    Ok((StatusCode::OK, Json(views::booking_view(&booking))))
}

pub async fn pay(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<PaymentConfirm>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .confirm_payment(user.id, booking_id, &payload.payment_reference, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::booking_view(&booking))))
}

pub async fn cancellation(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CancellationQuoteView>), ServerError> {
    let quote = state
        .engine
        .cancellation_quote(user.id, booking_id, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::cancellation_view(&quote))))
}

pub async fn cancel(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .cancel_booking(user.id, booking_id, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::booking_view(&booking))))
}

pub async fn list_all(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Query(query): Query<AdminBookingQuery>,
) -> Result<(StatusCode, Json<Vec<BookingView>>), ServerError> {
    let filter = BookingFilter {
        status: query.status.map(views::booking_status),
        car_id: query.car_id,
        user_id: query.user_id,
        from: query.from,
        to: query.to,
    };
    let bookings = state.engine.list_bookings(user.id, filter).await?;
    Ok((
        StatusCode::OK,
        Json(bookings.iter().map(views::booking_view).collect()),
    ))
}

pub async fn start(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .start_rental(user.id, booking_id, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::booking_view(&booking))))
}

pub async fn complete(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .complete_rental(user.id, booking_id, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::booking_view(&booking))))
}

pub async fn admin_cancel(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(booking_id): Path<Uuid>,
) -> Result<(StatusCode, Json<BookingView>), ServerError> {
    let booking = state
        .engine
        .admin_cancel_booking(user.id, booking_id, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(views::booking_view(&booking))))
}
