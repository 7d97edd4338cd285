#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    BookingRequest, Car, CarCategory, Discount, Engine, FuelType, NewCar, NewOffer, NewUser,
    RentalPeriod, Transmission, User,
};
use migration::MigratorTrait;
use uuid::Uuid;

pub const PASSWORD: &str = "correct horse";

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap()
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn period(start: NaiveDate, end: NaiveDate) -> RentalPeriod {
    RentalPeriod::new(start, end).unwrap()
}

/// 2026-05-01 10:00 UTC, the reference "now" of the tests.
pub fn now() -> DateTime<Utc> {
    at(2026, 5, 1, 10)
}

pub async fn admin(engine: &Engine) -> User {
    engine
        .create_admin("admin", "admin@example.com", PASSWORD, now())
        .await
        .unwrap()
}

pub async fn customer(engine: &Engine, username: &str) -> User {
    register(engine, username, None).await
}

pub async fn register(engine: &Engine, username: &str, referral_code: Option<&str>) -> User {
    engine
        .register(
            NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password: PASSWORD.to_string(),
                referral_code: referral_code.map(ToString::to_string),
                ..Default::default()
            },
            now(),
        )
        .await
        .unwrap()
}

pub fn new_car(plate: &str, category: CarCategory, daily_rate_minor: i64) -> NewCar {
    NewCar {
        make: "Fiat".to_string(),
        model: "Panda".to_string(),
        year: 2022,
        category,
        seats: 5,
        transmission: Transmission::Manual,
        fuel: FuelType::Petrol,
        daily_rate_minor,
        location: "Milano".to_string(),
        plate_number: plate.to_string(),
    }
}

/// An economy car at 100.00 per day.
pub async fn car(engine: &Engine, admin_id: Uuid, plate: &str) -> Car {
    engine
        .add_car(admin_id, new_car(plate, CarCategory::Economy, 10_000), now())
        .await
        .unwrap()
}

pub fn request(car_id: Uuid, start: NaiveDate, end: NaiveDate) -> BookingRequest {
    BookingRequest {
        car_id,
        period: period(start, end),
        offer_code: None,
        use_credit: false,
    }
}

/// A 10% offer valid through May 2026.
pub fn percent_offer(code: &str) -> NewOffer {
    NewOffer {
        code: code.to_string(),
        title: "Spring sale".to_string(),
        description: None,
        discount: Discount::Percentage { bps: 1_000 },
        max_discount_minor: None,
        min_subtotal_minor: None,
        valid_from: date(2026, 5, 1),
        valid_until: date(2026, 5, 31),
        usage_limit: None,
        per_user_limit: None,
        car_category: None,
        first_booking_only: false,
    }
}
