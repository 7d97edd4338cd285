//! The module contains the `Booking` of a car and its lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{
    CancellationQuote, EngineError, PriceBreakdown, RentalPeriod, ResultEngine,
    macros::string_enum,
};

string_enum! {
    /// Lifecycle of a booking.
    ///
    /// ```text
    /// pending ──► confirmed ──► active ──► completed
    ///    │            │           │
    ///    └────────────┴───────────┴──► cancelled
    /// ```
    ///
    /// Cancelling an `active` rental is reserved to admins.
    pub enum BookingStatus: "booking status" {
        Pending => "pending",
        Confirmed => "confirmed",
        Active => "active",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl BookingStatus {
    /// Statuses that keep the car reserved for the booked period.
    pub const BLOCKING: [BookingStatus; 3] = [Self::Pending, Self::Confirmed, Self::Active];

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Active)
                | (Confirmed, Cancelled)
                | (Active, Completed)
                | (Active, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn blocks_car(self) -> bool {
        Self::BLOCKING.contains(&self)
    }

    /// Statuses whose total counts as revenue.
    pub fn is_revenue(self) -> bool {
        matches!(self, Self::Confirmed | Self::Active | Self::Completed)
    }

    pub(crate) fn ensure_transition(self, next: BookingStatus) -> ResultEngine<()> {
        if !self.can_transition_to(next) {
            return Err(EngineError::InvalidState(format!(
                "booking cannot move from {self} to {next}"
            )));
        }
        Ok(())
    }
}

/// A car booking with its frozen price.
#[derive(Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub period: RentalPeriod,
    pub price: PriceBreakdown,
    pub offer_id: Option<Uuid>,
    pub status: BookingStatus,
    /// Opaque reference returned by the payment provider.
    pub payment_reference: Option<String>,
    pub cancellation_fee_minor: i64,
    pub refund_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// What the customer paid through the payment provider.
    ///
    /// Only bookings that went through `confirm_payment` hold money.
    pub fn paid_minor(&self) -> i64 {
        if self.payment_reference.is_some() {
            self.price.amount_due_minor
        } else {
            0
        }
    }

    pub(crate) fn apply_cancellation(&mut self, quote: &CancellationQuote, now: DateTime<Utc>) {
        self.status = BookingStatus::Cancelled;
        self.cancellation_fee_minor = quote.fee_minor;
        self.refund_minor = quote.refund_minor;
        self.cancelled_at = Some(now);
        self.updated_at = now;
    }
}

/// A customer request for a car over a period.
#[derive(Clone, Debug)]
pub struct BookingRequest {
    pub car_id: Uuid,
    pub period: RentalPeriod,
    pub offer_code: Option<String>,
    /// Spend the user's store credit on this booking.
    pub use_credit: bool,
}

/// Admin listing filters. Dates filter on the booking start date, inclusive.
#[derive(Clone, Debug, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub car_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub car_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub daily_rate_minor: i64,
    pub base_minor: i64,
    pub duration_discount_minor: i64,
    pub offer_id: Option<Uuid>,
    pub offer_discount_minor: i64,
    pub tax_minor: i64,
    pub total_minor: i64,
    pub credit_applied_minor: i64,
    pub amount_due_minor: i64,
    pub status: String,
    pub payment_reference: Option<String>,
    pub cancellation_fee_minor: i64,
    pub refund_minor: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::cars::Entity",
        from = "Column::CarId",
        to = "super::cars::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Cars,
    #[sea_orm(
        belongs_to = "super::offers::Entity",
        from = "Column::OfferId",
        to = "super::offers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Offers,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::cars::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl Related<super::offers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Booking {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            car_id: model.car_id,
            period: RentalPeriod::new(model.start_date, model.end_date)?,
            price: PriceBreakdown {
                days: model.days,
                daily_rate_minor: model.daily_rate_minor,
                base_minor: model.base_minor,
                duration_discount_minor: model.duration_discount_minor,
                offer_discount_minor: model.offer_discount_minor,
                tax_minor: model.tax_minor,
                total_minor: model.total_minor,
                credit_applied_minor: model.credit_applied_minor,
                amount_due_minor: model.amount_due_minor,
            },
            offer_id: model.offer_id,
            status: BookingStatus::try_from(model.status.as_str())?,
            payment_reference: model.payment_reference,
            cancellation_fee_minor: model.cancellation_fee_minor,
            refund_minor: model.refund_minor,
            created_at: model.created_at,
            updated_at: model.updated_at,
            cancelled_at: model.cancelled_at,
        })
    }
}

impl From<&Booking> for ActiveModel {
    fn from(value: &Booking) -> Self {
        use sea_orm::ActiveValue::Set;

        let price = &value.price;
        Self {
            id: Set(value.id),
            user_id: Set(value.user_id),
            car_id: Set(value.car_id),
            start_date: Set(value.period.start),
            end_date: Set(value.period.end),
            days: Set(price.days),
            daily_rate_minor: Set(price.daily_rate_minor),
            base_minor: Set(price.base_minor),
            duration_discount_minor: Set(price.duration_discount_minor),
            offer_id: Set(value.offer_id),
            offer_discount_minor: Set(price.offer_discount_minor),
            tax_minor: Set(price.tax_minor),
            total_minor: Set(price.total_minor),
            credit_applied_minor: Set(price.credit_applied_minor),
            amount_due_minor: Set(price.amount_due_minor),
            status: Set(value.status.as_str().to_string()),
            payment_reference: Set(value.payment_reference.clone()),
            cancellation_fee_minor: Set(value.cancellation_fee_minor),
            refund_minor: Set(value.refund_minor),
            created_at: Set(value.created_at),
            updated_at: Set(value.updated_at),
            cancelled_at: Set(value.cancelled_at),
        }
    }
}
