use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    BookingStatus, Car, CarSearch, CarUpdate, EngineError, NewCar, RentalPeriod, ResultEngine,
    bookings,
    cars::{self, normalize_plate, validate_daily_rate, validate_seats, validate_year},
    util::normalize_required_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Add a car to the fleet.
    ///
    /// Authorization: admin only.
    pub async fn add_car(
        &self,
        admin_id: Uuid,
        new_car: NewCar,
        now: DateTime<Utc>,
    ) -> ResultEngine<Car> {
        let car = Car {
            id: Uuid::new_v4(),
            make: normalize_required_text(&new_car.make, "make")?,
            model: normalize_required_text(&new_car.model, "model")?,
            year: new_car.year,
            category: new_car.category,
            seats: new_car.seats,
            transmission: new_car.transmission,
            fuel: new_car.fuel,
            daily_rate_minor: new_car.daily_rate_minor,
            location: normalize_required_text(&new_car.location, "location")?,
            plate_number: normalize_plate(&new_car.plate_number)?,
            active: true,
            created_at: now,
        };
        validate_year(car.year)?;
        validate_seats(car.seats)?;
        validate_daily_rate(car.daily_rate_minor)?;

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;

            let exists = cars::Entity::find()
                .filter(cars::Column::PlateNumber.eq(car.plate_number.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(car.plate_number.clone()));
            }

            cars::ActiveModel::from(&car).insert(&db_tx).await?;
            tracing::info!(car = %car.id, plate = %car.plate_number, "car added");
            Ok(car)
        })
    }

    /// Authorization: admin only.
    pub async fn update_car(
        &self,
        admin_id: Uuid,
        car_id: Uuid,
        update: CarUpdate,
    ) -> ResultEngine<Car> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            self.require_car(&db_tx, car_id).await?;

            let mut active = cars::ActiveModel {
                id: ActiveValue::Set(car_id),
                ..Default::default()
            };
            if let Some(make) = update.make.as_deref() {
                active.make = ActiveValue::Set(normalize_required_text(make, "make")?);
            }
            if let Some(model) = update.model.as_deref() {
                active.model_name = ActiveValue::Set(normalize_required_text(model, "model")?);
            }
            if let Some(year) = update.year {
                validate_year(year)?;
                active.year = ActiveValue::Set(year);
            }
            if let Some(category) = update.category {
                active.category = ActiveValue::Set(category.as_str().to_string());
            }
            if let Some(seats) = update.seats {
                validate_seats(seats)?;
                active.seats = ActiveValue::Set(i32::from(seats));
            }
            if let Some(transmission) = update.transmission {
                active.transmission = ActiveValue::Set(transmission.as_str().to_string());
            }
            if let Some(fuel) = update.fuel {
                active.fuel = ActiveValue::Set(fuel.as_str().to_string());
            }
            if let Some(rate) = update.daily_rate_minor {
                validate_daily_rate(rate)?;
                active.daily_rate_minor = ActiveValue::Set(rate);
            }
            if let Some(location) = update.location.as_deref() {
                active.location = ActiveValue::Set(normalize_required_text(location, "location")?);
            }

            let model = active.update(&db_tx).await?;
            Car::try_from(model)
        })
    }

    /// Show or hide a car. Existing bookings are kept.
    ///
    /// Authorization: admin only.
    pub async fn set_car_active(
        &self,
        admin_id: Uuid,
        car_id: Uuid,
        active: bool,
    ) -> ResultEngine<Car> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            self.require_car(&db_tx, car_id).await?;
            let model = cars::ActiveModel {
                id: ActiveValue::Set(car_id),
                active: ActiveValue::Set(active),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            tracing::info!(car = %car_id, active, "car visibility changed");
            Car::try_from(model)
        })
    }

    pub async fn car(&self, car_id: Uuid) -> ResultEngine<Car> {
        with_tx!(self, |db_tx| self.require_car(&db_tx, car_id).await)
    }

    /// Cars matching every filter, cheapest first.
    pub async fn search_cars(&self, search: CarSearch) -> ResultEngine<Vec<Car>> {
        with_tx!(self, |db_tx| {
            let mut query = cars::Entity::find();
            if !search.include_inactive {
                query = query.filter(cars::Column::Active.eq(true));
            }
            if let Some(category) = search.category {
                query = query.filter(cars::Column::Category.eq(category.as_str()));
            }
            if let Some(location) = search.location.as_deref().map(str::trim)
                && !location.is_empty()
            {
                query = query.filter(Expr::cust("LOWER(location)").eq(location.to_lowercase()));
            }
            if let Some(min_seats) = search.min_seats {
                query = query.filter(cars::Column::Seats.gte(i32::from(min_seats)));
            }
            if let Some(transmission) = search.transmission {
                query = query.filter(cars::Column::Transmission.eq(transmission.as_str()));
            }
            if let Some(fuel) = search.fuel {
                query = query.filter(cars::Column::Fuel.eq(fuel.as_str()));
            }
            if let Some(max_rate) = search.max_daily_rate_minor {
                query = query.filter(cars::Column::DailyRateMinor.lte(max_rate));
            }

            let models = query
                .order_by_asc(cars::Column::DailyRateMinor)
                .order_by_asc(cars::Column::Make)
                .order_by_asc(cars::Column::ModelName)
                .all(&db_tx)
                .await?;
            let cars = models
                .into_iter()
                .map(Car::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let Some(period) = search.period else {
                return Ok(cars);
            };

            let taken = self
                .taken_periods(&db_tx, cars.iter().map(|car| car.id).collect(), &period)
                .await?;
            Ok(cars
                .into_iter()
                .filter(|car| {
                    car.is_available(&period, taken.get(&car.id).into_iter().flatten())
                })
                .collect())
        })
    }

    pub async fn is_car_available(&self, car_id: Uuid, period: RentalPeriod) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let car = self.require_car(&db_tx, car_id).await?;
            let taken = self.taken_periods(&db_tx, vec![car_id], &period).await?;
            Ok(car.is_available(&period, taken.get(&car_id).into_iter().flatten()))
        })
    }

    /// Periods held by blocking bookings of `car_ids` that intersect `period`.
    pub(super) async fn taken_periods(
        &self,
        db: &DatabaseTransaction,
        car_ids: Vec<Uuid>,
        period: &RentalPeriod,
    ) -> ResultEngine<HashMap<Uuid, Vec<RentalPeriod>>> {
        if car_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let blocking = BookingStatus::BLOCKING.map(|status| status.as_str());
        let models = bookings::Entity::find()
            .filter(bookings::Column::CarId.is_in(car_ids))
            .filter(bookings::Column::Status.is_in(blocking))
            .filter(bookings::Column::StartDate.lt(period.end))
            .filter(bookings::Column::EndDate.gt(period.start))
            .all(db)
            .await?;

        let mut taken: HashMap<Uuid, Vec<RentalPeriod>> = HashMap::new();
        for model in models {
            taken
                .entry(model.car_id)
                .or_default()
                .push(RentalPeriod::new(model.start_date, model.end_date)?);
        }
        Ok(taken)
    }
}
