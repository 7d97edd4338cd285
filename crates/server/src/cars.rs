//! Fleet endpoints: public search plus admin management.

use api_types::car::{CarActive, CarNew, CarQuery, CarUpdate, CarView};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{CarSearch, RentalPeriod};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

fn search_period(query: &CarQuery) -> Result<Option<RentalPeriod>, ServerError> {
    match (query.start, query.end) {
        (Some(start), Some(end)) => Ok(Some(RentalPeriod::new(start, end)?)),
        (None, None) => Ok(None),
        _ => Err(ServerError::Generic(
            "start and end must be given together".to_string(),
        )),
    }
}

fn car_search(query: CarQuery, include_inactive: bool) -> Result<CarSearch, ServerError> {
    let period = search_period(&query)?;
    Ok(CarSearch {
        category: query.category.map(views::category),
        location: query.location,
        min_seats: query.min_seats,
        transmission: query.transmission.map(views::transmission),
        fuel: query.fuel.map(views::fuel),
        max_daily_rate_minor: query.max_daily_rate_minor,
        period,
        include_inactive,
    })
}

pub async fn search(
    State(state): State<ServerState>,
    Query(query): Query<CarQuery>,
) -> Result<(StatusCode, Json<Vec<CarView>>), ServerError> {
    let cars = state.engine.search_cars(car_search(query, false)?).await?;
    Ok((StatusCode::OK, Json(cars.iter().map(views::car_view).collect())))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CarView>), ServerError> {
    let car = state.engine.car(car_id).await?;
    if !car.active {
        return Err(engine::EngineError::KeyNotFound(format!("car {car_id}")).into());
    }
    Ok((StatusCode::OK, Json(views::car_view(&car))))
}

pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<CarQuery>,
) -> Result<(StatusCode, Json<Vec<CarView>>), ServerError> {
    let cars = state.engine.search_cars(car_search(query, true)?).await?;
    Ok((StatusCode::OK, Json(cars.iter().map(views::car_view).collect())))
}

pub async fn add(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Json(payload): Json<CarNew>,
) -> Result<(StatusCode, Json<CarView>), ServerError> {
    let car = state
        .engine
        .add_car(
            user.id,
            engine::NewCar {
                make: payload.make,
                model: payload.model,
                year: payload.year,
                category: views::category(payload.category),
                seats: payload.seats,
                transmission: views::transmission(payload.transmission),
                fuel: views::fuel(payload.fuel),
                daily_rate_minor: payload.daily_rate_minor,
                location: payload.location,
                plate_number: payload.plate_number,
            },
            Utc::now(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(views::car_view(&car))))
}

pub async fn update(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
    Json(payload): Json<CarUpdate>,
) -> Result<(StatusCode, Json<CarView>), ServerError> {
    let car = state
        .engine
        .update_car(
            user.id,
            car_id,
            engine::CarUpdate {
                make: payload.make,
                model: payload.model,
                year: payload.year,
                category: payload.category.map(views::category),
                seats: payload.seats,
                transmission: payload.transmission.map(views::transmission),
                fuel: payload.fuel.map(views::fuel),
                daily_rate_minor: payload.daily_rate_minor,
                location: payload.location,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(views::car_view(&car))))
}

pub async fn set_active(
    Extension(user): Extension<engine::User>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
    Json(payload): Json<CarActive>,
) -> Result<(StatusCode, Json<CarView>), ServerError> {
    let car = state
        .engine
        .set_car_active(user.id, car_id, payload.active)
        .await?;
    Ok((StatusCode::OK, Json(views::car_view(&car))))
}
