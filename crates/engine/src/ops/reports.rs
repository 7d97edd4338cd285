use std::collections::HashMap;

use sea_orm::{QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    BookingFilter, Car, ReportRange, ReportSummary, ResultEngine, cars,
    reports::{ExportRow, summarize, write_bookings_csv},
    users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Aggregated figures over the bookings starting within `range`.
    ///
    /// Authorization: admin only.
    pub async fn report_summary(
        &self,
        admin_id: Uuid,
        range: ReportRange,
    ) -> ResultEngine<ReportSummary> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;

            let bookings = self
                .filtered_bookings(&db_tx, &Self::range_filter(&range))
                .await?;
            let fleet = cars::Entity::find()
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Car::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            let names: HashMap<Uuid, String> = fleet
                .iter()
                .map(|car| (car.id, car.display_name()))
                .collect();

            let mut summary = summarize(&bookings, &names);
            summary.total_users = users::Entity::find().count(&db_tx).await?;
            summary.total_cars = fleet.len() as u64;
            summary.active_cars = fleet.iter().filter(|car| car.active).count() as u64;
            Ok(summary)
        })
    }

    /// Bookings starting within `range` as CSV, one row per booking.
    ///
    /// Authorization: admin only.
    pub async fn export_bookings_csv(
        &self,
        admin_id: Uuid,
        range: ReportRange,
    ) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;

            let bookings = self
                .filtered_bookings(&db_tx, &Self::range_filter(&range))
                .await?;
            let usernames: HashMap<Uuid, String> = users::Entity::find()
                .filter(users::Column::Id.is_in(bookings.iter().map(|b| b.user_id)))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|user| (user.id, user.username))
                .collect();
            let plates: HashMap<Uuid, String> = cars::Entity::find()
                .filter(cars::Column::Id.is_in(bookings.iter().map(|b| b.car_id)))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|car| (car.id, car.plate_number))
                .collect();

            let csv = write_bookings_csv(bookings.iter().map(|booking| ExportRow {
                booking,
                username: usernames
                    .get(&booking.user_id)
                    .map_or("", String::as_str),
                plate_number: plates.get(&booking.car_id).map_or("", String::as_str),
            }))?;
            tracing::debug!(rows = bookings.len(), "bookings exported");
            Ok(csv)
        })
    }

    fn range_filter(range: &ReportRange) -> BookingFilter {
        BookingFilter {
            from: Some(range.from),
            to: Some(range.to),
            ..Default::default()
        }
    }
}
