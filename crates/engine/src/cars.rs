//! The module contains the `Car` inventory item, the rental period and the
//! availability rules.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, macros::string_enum};

/// Longest rental accepted in a single booking.
pub const MAX_RENTAL_DAYS: i64 = 90;

string_enum! {
    /// Commercial class of a car. Offers can be restricted to one category.
    pub enum CarCategory: "car category" {
        Economy => "economy",
        Compact => "compact",
        Sedan => "sedan",
        Suv => "suv",
        Luxury => "luxury",
        Van => "van",
    }
}

string_enum! {
    pub enum Transmission: "transmission" {
        Manual => "manual",
        Automatic => "automatic",
    }
}

string_enum! {
    pub enum FuelType: "fuel type" {
        Petrol => "petrol",
        Diesel => "diesel",
        Hybrid => "hybrid",
        Electric => "electric",
    }
}

/// A rental period, from the pick-up date to the drop-off date.
///
/// `end` is exclusive: a car dropped off on a date can be picked up by the
/// next customer the same day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RentalPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RentalPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if end <= start {
            return Err(EngineError::InvalidDates(
                "drop-off date must be after pick-up date".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of rented days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Half-open interval intersection.
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Pick-up instant, midnight UTC of the start date.
    pub fn pickup_at(&self) -> DateTime<Utc> {
        self.start.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}

/// A car of the rental fleet.
#[derive(Clone, Debug, PartialEq)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub category: CarCategory,
    pub seats: u8,
    pub transmission: Transmission,
    pub fuel: FuelType,
    pub daily_rate_minor: i64,
    pub location: String,
    pub plate_number: String,
    /// Inactive cars are hidden from customers and cannot be booked.
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Car {
    /// Validate a period against the rental length limits and return its
    /// number of days.
    pub fn rental_days(&self, period: &RentalPeriod) -> ResultEngine<i64> {
        let days = period.days();
        if days < 1 {
            return Err(EngineError::InvalidDates(
                "a rental lasts at least one day".to_string(),
            ));
        }
        if days > MAX_RENTAL_DAYS {
            return Err(EngineError::InvalidDates(format!(
                "a rental lasts at most {MAX_RENTAL_DAYS} days"
            )));
        }
        Ok(days)
    }

    pub fn base_price_minor(&self, days: i64) -> ResultEngine<i64> {
        self.daily_rate_minor
            .checked_mul(days)
            .ok_or_else(|| EngineError::InvalidInput("rental price overflow".to_string()))
    }

    /// Whether the car can be rented for `period`, given the periods already
    /// held by blocking bookings.
    pub fn is_available<'a>(
        &self,
        period: &RentalPeriod,
        mut taken: impl Iterator<Item = &'a RentalPeriod>,
    ) -> bool {
        self.active && !taken.any(|other| other.overlaps(period))
    }

    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.year)
    }
}

/// Input of [`Engine::add_car`](crate::Engine::add_car).
#[derive(Clone, Debug)]
pub struct NewCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub category: CarCategory,
    pub seats: u8,
    pub transmission: Transmission,
    pub fuel: FuelType,
    pub daily_rate_minor: i64,
    pub location: String,
    pub plate_number: String,
}

/// Partial update of a car, `None` fields are left untouched.
#[derive(Clone, Debug, Default)]
pub struct CarUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub category: Option<CarCategory>,
    pub seats: Option<u8>,
    pub transmission: Option<Transmission>,
    pub fuel: Option<FuelType>,
    pub daily_rate_minor: Option<i64>,
    pub location: Option<String>,
}

/// Filters of [`Engine::search_cars`](crate::Engine::search_cars).
#[derive(Clone, Debug, Default)]
pub struct CarSearch {
    pub category: Option<CarCategory>,
    pub location: Option<String>,
    pub min_seats: Option<u8>,
    pub transmission: Option<Transmission>,
    pub fuel: Option<FuelType>,
    pub max_daily_rate_minor: Option<i64>,
    /// Only return cars free for the whole period.
    pub period: Option<RentalPeriod>,
    pub include_inactive: bool,
}

pub(crate) fn validate_year(year: i32) -> ResultEngine<()> {
    if !(1990..=2100).contains(&year) {
        return Err(EngineError::InvalidInput(format!("invalid year: {year}")));
    }
    Ok(())
}

pub(crate) fn validate_seats(seats: u8) -> ResultEngine<()> {
    if !(1..=15).contains(&seats) {
        return Err(EngineError::InvalidInput(format!("invalid seats: {seats}")));
    }
    Ok(())
}

pub(crate) fn validate_daily_rate(rate_minor: i64) -> ResultEngine<()> {
    if rate_minor <= 0 {
        return Err(EngineError::InvalidInput(
            "daily rate must be > 0".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn normalize_plate(value: &str) -> ResultEngine<String> {
    let plate: String = value
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if plate.is_empty() {
        return Err(EngineError::InvalidInput(
            "plate number must not be empty".to_string(),
        ));
    }
    Ok(plate)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub make: String,
    #[sea_orm(column_name = "model")]
    pub model_name: String,
    pub year: i32,
    pub category: String,
    pub seats: i32,
    pub transmission: String,
    pub fuel: String,
    pub daily_rate_minor: i64,
    pub location: String,
    pub plate_number: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Car {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            category: CarCategory::try_from(model.category.as_str())?,
            transmission: Transmission::try_from(model.transmission.as_str())?,
            fuel: FuelType::try_from(model.fuel.as_str())?,
            seats: u8::try_from(model.seats)
                .map_err(|_| EngineError::InvalidInput("invalid seats".to_string()))?,
            make: model.make,
            model: model.model_name,
            year: model.year,
            daily_rate_minor: model.daily_rate_minor,
            location: model.location,
            plate_number: model.plate_number,
            active: model.active,
            created_at: model.created_at,
        })
    }
}

impl From<&Car> for ActiveModel {
    fn from(value: &Car) -> Self {
        use sea_orm::ActiveValue::Set;

        Self {
            id: Set(value.id),
            make: Set(value.make.clone()),
            model_name: Set(value.model.clone()),
            year: Set(value.year),
            category: Set(value.category.as_str().to_string()),
            seats: Set(i32::from(value.seats)),
            transmission: Set(value.transmission.as_str().to_string()),
            fuel: Set(value.fuel.as_str().to_string()),
            daily_rate_minor: Set(value.daily_rate_minor),
            location: Set(value.location.clone()),
            plate_number: Set(value.plate_number.clone()),
            active: Set(value.active),
            created_at: Set(value.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(start: (u32, u32), end: (u32, u32)) -> RentalPeriod {
        RentalPeriod::new(date(2026, start.0, start.1), date(2026, end.0, end.1)).unwrap()
    }

    fn car() -> Car {
        Car {
            id: Uuid::new_v4(),
            make: "Fiat".to_string(),
            model: "Panda".to_string(),
            year: 2022,
            category: CarCategory::Economy,
            seats: 5,
            transmission: Transmission::Manual,
            fuel: FuelType::Petrol,
            daily_rate_minor: 3500,
            location: "Milano".to_string(),
            plate_number: "AB123CD".to_string(),
            active: true,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    #[test]
    fn period_rejects_inverted_or_empty_ranges() {
        assert!(RentalPeriod::new(date(2026, 5, 2), date(2026, 5, 1)).is_err());
        assert!(RentalPeriod::new(date(2026, 5, 2), date(2026, 5, 2)).is_err());
        assert_eq!(period((5, 1), (5, 4)).days(), 3);
    }

    #[test]
    fn back_to_back_rentals_do_not_overlap() {
        let first = period((5, 1), (5, 4));
        let second = period((5, 4), (5, 6));
        assert!(!first.overlaps(&second));
        assert!(!second.overlaps(&first));
    }

    #[test]
    fn overlapping_rentals() {
        let base = period((5, 10), (5, 15));
        assert!(base.overlaps(&period((5, 14), (5, 20))));
        assert!(base.overlaps(&period((5, 1), (5, 11))));
        assert!(base.overlaps(&period((5, 11), (5, 12))));
        assert!(base.overlaps(&period((5, 1), (5, 30))));
    }

    #[test]
    fn availability_checks_active_flag_and_taken_periods() {
        let mut car = car();
        let wanted = period((6, 1), (6, 5));
        let taken = [period((5, 20), (6, 1)), period((6, 5), (6, 9))];
        assert!(car.is_available(&wanted, taken.iter()));

        let clash = [period((6, 4), (6, 6))];
        assert!(!car.is_available(&wanted, clash.iter()));

        car.active = false;
        assert!(!car.is_available(&wanted, std::iter::empty()));
    }

    #[test]
    fn rental_days_limits() {
        let car = car();
        assert_eq!(car.rental_days(&period((1, 1), (1, 8))).unwrap(), 7);
        assert!(matches!(
            car.rental_days(&period((1, 1), (6, 1))),
            Err(EngineError::InvalidDates(_))
        ));
        assert_eq!(car.base_price_minor(7).unwrap(), 24_500);
    }

    #[test]
    fn enum_strings() {
        assert_eq!(CarCategory::try_from("SUV").unwrap(), CarCategory::Suv);
        assert_eq!(FuelType::Electric.to_string(), "electric");
        assert!(Transmission::try_from("cvt").is_err());
        assert_eq!(normalize_plate(" ab 123 cd ").unwrap(), "AB123CD");
    }
}
