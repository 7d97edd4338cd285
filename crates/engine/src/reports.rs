//! Admin reporting over bookings.
//!
//! Reports are computed in memory from the bookings whose start date falls in
//! the requested range.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::{Booking, BookingStatus, EngineError, Money, ResultEngine};

/// How many cars [`ReportSummary::top_cars`] holds.
pub const TOP_CARS: usize = 5;

/// Inclusive range of booking start dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl ReportRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> ResultEngine<Self> {
        if to < from {
            return Err(EngineError::InvalidDates(
                "report range end precedes its start".to_string(),
            ));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopCar {
    pub car_id: Uuid,
    pub name: String,
    pub bookings: u32,
    pub revenue_minor: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthlyRevenue {
    /// `YYYY-MM`
    pub month: String,
    pub bookings: u32,
    pub revenue_minor: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_users: u64,
    pub total_cars: u64,
    pub active_cars: u64,
    pub bookings_by_status: BTreeMap<String, u32>,
    pub gross_revenue_minor: i64,
    pub discounts_minor: i64,
    pub cancellation_fees_minor: i64,
    pub refunds_minor: i64,
    pub top_cars: Vec<TopCar>,
    pub monthly: Vec<MonthlyRevenue>,
}

/// Aggregate booking figures. `car_names` resolves car ids for `top_cars`.
pub(crate) fn summarize(
    bookings: &[Booking],
    car_names: &HashMap<Uuid, String>,
) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for status in BookingStatus::ALL {
        summary
            .bookings_by_status
            .insert(status.as_str().to_string(), 0);
    }

    let mut per_car: HashMap<Uuid, (u32, i64)> = HashMap::new();
    let mut per_month: BTreeMap<String, (u32, i64)> = BTreeMap::new();

    for booking in bookings {
        *summary
            .bookings_by_status
            .entry(booking.status.as_str().to_string())
            .or_default() += 1;

        if booking.status == BookingStatus::Cancelled {
            summary.cancellation_fees_minor += booking.cancellation_fee_minor;
            summary.refunds_minor += booking.refund_minor;
            continue;
        }

        let car = per_car.entry(booking.car_id).or_default();
        car.0 += 1;

        if booking.status.is_revenue() {
            let total = booking.price.total_minor;
            summary.gross_revenue_minor += total;
            summary.discounts_minor +=
                booking.price.duration_discount_minor + booking.price.offer_discount_minor;
            car.1 += total;

            let month = format!(
                "{:04}-{:02}",
                booking.period.start.year(),
                booking.period.start.month()
            );
            let entry = per_month.entry(month).or_default();
            entry.0 += 1;
            entry.1 += total;
        }
    }

    let mut top_cars: Vec<TopCar> = per_car
        .into_iter()
        .map(|(car_id, (bookings, revenue_minor))| TopCar {
            car_id,
            name: car_names
                .get(&car_id)
                .cloned()
                .unwrap_or_else(|| car_id.to_string()),
            bookings,
            revenue_minor,
        })
        .collect();
    top_cars.sort_by(|a, b| {
        b.bookings
            .cmp(&a.bookings)
            .then(b.revenue_minor.cmp(&a.revenue_minor))
            .then(a.name.cmp(&b.name))
    });
    top_cars.truncate(TOP_CARS);
    summary.top_cars = top_cars;

    summary.monthly = per_month
        .into_iter()
        .map(|(month, (bookings, revenue_minor))| MonthlyRevenue {
            month,
            bookings,
            revenue_minor,
        })
        .collect();

    summary
}

/// A booking joined with the names needed by the CSV export.
pub(crate) struct ExportRow<'a> {
    pub booking: &'a Booking,
    pub username: &'a str,
    pub plate_number: &'a str,
}

pub(crate) fn write_bookings_csv<'a>(
    rows: impl IntoIterator<Item = ExportRow<'a>>,
) -> ResultEngine<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "id", "user", "car", "start", "end", "days", "status", "total", "discount", "tax",
        "fee", "refund",
    ])?;

    for row in rows {
        let b = row.booking;
        let discount = b.price.duration_discount_minor + b.price.offer_discount_minor;
        writer.write_record([
            b.id.to_string(),
            row.username.to_string(),
            row.plate_number.to_string(),
            b.period.start.to_string(),
            b.period.end.to_string(),
            b.price.days.to_string(),
            b.status.to_string(),
            Money::new(b.price.total_minor).to_string(),
            Money::new(discount).to_string(),
            Money::new(b.price.tax_minor).to_string(),
            Money::new(b.cancellation_fee_minor).to_string(),
            Money::new(b.refund_minor).to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| EngineError::Export(err.to_string()))
}
