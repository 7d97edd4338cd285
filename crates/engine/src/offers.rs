//! Promotional offers: discount codes with eligibility rules.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{CarCategory, EngineError, money::apply_bps};

/// How an offer reduces the price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Discount {
    /// Percentage of the subtotal, in basis points (`1000` = 10%).
    Percentage { bps: u32 },
    /// Fixed amount in minor units.
    Flat { amount_minor: i64 },
}

impl Discount {
    pub(crate) fn kind_str(self) -> &'static str {
        match self {
            Self::Percentage { .. } => "percentage",
            Self::Flat { .. } => "flat",
        }
    }

    pub(crate) fn value(self) -> i64 {
        match self {
            Self::Percentage { bps } => i64::from(bps),
            Self::Flat { amount_minor } => amount_minor,
        }
    }

    pub(crate) fn from_parts(kind: &str, value: i64) -> Result<Self, EngineError> {
        match kind {
            "percentage" => u32::try_from(value)
                .map(|bps| Self::Percentage { bps })
                .map_err(|_| EngineError::InvalidInput(format!("invalid percentage: {value}"))),
            "flat" => Ok(Self::Flat {
                amount_minor: value,
            }),
            other => Err(EngineError::InvalidInput(format!(
                "invalid discount kind: {other}"
            ))),
        }
    }

    pub(crate) fn validate(self) -> Result<(), EngineError> {
        match self {
            Self::Percentage { bps } if (1..=10_000).contains(&bps) => Ok(()),
            Self::Flat { amount_minor } if amount_minor > 0 => Ok(()),
            Self::Percentage { .. } => Err(EngineError::InvalidInput(
                "percentage must be between 0.01% and 100%".to_string(),
            )),
            Self::Flat { .. } => Err(EngineError::InvalidInput(
                "flat discount must be > 0".to_string(),
            )),
        }
    }
}

/// A promotional offer redeemable with its code.
#[derive(Clone, Debug, PartialEq)]
pub struct Offer {
    pub id: Uuid,
    /// Normalized code (NFKC, uppercase).
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub discount: Discount,
    /// Upper bound of a percentage discount.
    pub max_discount_minor: Option<i64>,
    /// Minimum subtotal (after duration discount) required.
    pub min_subtotal_minor: Option<i64>,
    pub valid_from: NaiveDate,
    /// Last valid day, inclusive.
    pub valid_until: NaiveDate,
    /// Total redemptions allowed, `None` for unlimited.
    pub usage_limit: Option<u32>,
    pub used_count: u32,
    pub per_user_limit: u32,
    pub car_category: Option<CarCategory>,
    pub first_booking_only: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Facts about a booking attempt an offer is checked against.
#[derive(Clone, Copy, Debug)]
pub struct OfferContext {
    pub today: NaiveDate,
    pub subtotal_minor: i64,
    pub car_category: CarCategory,
    /// Non-cancelled bookings of the user already carrying this offer.
    pub user_redemptions: u32,
    /// Non-cancelled bookings of the user, any offer.
    pub user_bookings: u32,
}

/// Why an offer cannot be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OfferRejection {
    Inactive,
    NotStarted,
    Expired,
    UsageExhausted,
    PerUserLimitReached,
    NotFirstBooking,
    CategoryMismatch,
    BelowMinimum,
}

impl OfferRejection {
    pub fn message(self) -> &'static str {
        match self {
            Self::Inactive => "offer is not active",
            Self::NotStarted => "offer is not valid yet",
            Self::Expired => "offer has expired",
            Self::UsageExhausted => "offer has been fully redeemed",
            Self::PerUserLimitReached => "offer already used the maximum number of times",
            Self::NotFirstBooking => "offer is reserved to the first booking",
            Self::CategoryMismatch => "offer does not apply to this car category",
            Self::BelowMinimum => "booking amount is below the offer minimum",
        }
    }
}

impl From<OfferRejection> for EngineError {
    fn from(value: OfferRejection) -> Self {
        EngineError::OfferNotApplicable(value.message().to_string())
    }
}

impl Offer {
    pub fn is_live(&self, today: NaiveDate) -> bool {
        self.active && self.valid_from <= today && today <= self.valid_until
    }

    pub fn remaining_uses(&self) -> Option<u32> {
        self.usage_limit
            .map(|limit| limit.saturating_sub(self.used_count))
    }

    /// Check every eligibility rule, reporting the first one that fails.
    pub fn check_eligibility(&self, ctx: &OfferContext) -> Result<(), OfferRejection> {
        if !self.active {
            return Err(OfferRejection::Inactive);
        }
        if ctx.today < self.valid_from {
            return Err(OfferRejection::NotStarted);
        }
        if ctx.today > self.valid_until {
            return Err(OfferRejection::Expired);
        }
        if self.remaining_uses() == Some(0) {
            return Err(OfferRejection::UsageExhausted);
        }
        if ctx.user_redemptions >= self.per_user_limit {
            return Err(OfferRejection::PerUserLimitReached);
        }
        if self.first_booking_only && ctx.user_bookings > 0 {
            return Err(OfferRejection::NotFirstBooking);
        }
        if let Some(category) = self.car_category
            && category != ctx.car_category
        {
            return Err(OfferRejection::CategoryMismatch);
        }
        if let Some(min) = self.min_subtotal_minor
            && ctx.subtotal_minor < min
        {
            return Err(OfferRejection::BelowMinimum);
        }
        Ok(())
    }

    /// Discount granted on `subtotal_minor`, never more than the subtotal.
    pub fn discount_for(&self, subtotal_minor: i64) -> i64 {
        let subtotal_minor = subtotal_minor.max(0);
        let raw = match self.discount {
            Discount::Percentage { bps } => {
                let amount = apply_bps(subtotal_minor, bps);
                self.max_discount_minor
                    .map_or(amount, |max| amount.min(max))
            }
            Discount::Flat { amount_minor } => amount_minor,
        };
        raw.clamp(0, subtotal_minor)
    }
}

/// Input of [`Engine::create_offer`](crate::Engine::create_offer).
#[derive(Clone, Debug)]
pub struct NewOffer {
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub discount: Discount,
    pub max_discount_minor: Option<i64>,
    pub min_subtotal_minor: Option<i64>,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub usage_limit: Option<u32>,
    pub per_user_limit: Option<u32>,
    pub car_category: Option<CarCategory>,
    pub first_booking_only: bool,
}

/// Partial update of an offer.
#[derive(Clone, Debug, Default)]
pub struct OfferUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub usage_limit: Option<u32>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "offers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub discount_kind: String,
    pub discount_value: i64,
    pub max_discount_minor: Option<i64>,
    pub min_subtotal_minor: Option<i64>,
    pub valid_from: NaiveDate,
    pub valid_until: NaiveDate,
    pub usage_limit: Option<i32>,
    pub used_count: i32,
    pub per_user_limit: i32,
    pub car_category: Option<String>,
    pub first_booking_only: bool,
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

fn to_u32(value: i32, label: &str) -> Result<u32, EngineError> {
    u32::try_from(value).map_err(|_| EngineError::InvalidInput(format!("invalid {label}: {value}")))
}

pub(crate) fn to_i32(value: u32, label: &str) -> Result<i32, EngineError> {
    i32::try_from(value).map_err(|_| EngineError::InvalidInput(format!("{label} too large")))
}

impl TryFrom<Model> for Offer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            discount: Discount::from_parts(&model.discount_kind, model.discount_value)?,
            usage_limit: model
                .usage_limit
                .map(|limit| to_u32(limit, "usage limit"))
                .transpose()?,
            used_count: to_u32(model.used_count, "used count")?,
            per_user_limit: to_u32(model.per_user_limit, "per user limit")?,
            car_category: model
                .car_category
                .as_deref()
                .map(CarCategory::try_from)
                .transpose()?,
            code: model.code,
            title: model.title,
            description: model.description,
            max_discount_minor: model.max_discount_minor,
            min_subtotal_minor: model.min_subtotal_minor,
            valid_from: model.valid_from,
            valid_until: model.valid_until,
            first_booking_only: model.first_booking_only,
            active: model.active,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<&Offer> for ActiveModel {
    type Error = EngineError;

    fn try_from(offer: &Offer) -> Result<Self, Self::Error> {
        use sea_orm::ActiveValue::Set;

        Ok(Self {
            id: Set(offer.id),
            code: Set(offer.code.clone()),
            title: Set(offer.title.clone()),
            description: Set(offer.description.clone()),
            discount_kind: Set(offer.discount.kind_str().to_string()),
            discount_value: Set(offer.discount.value()),
            max_discount_minor: Set(offer.max_discount_minor),
            min_subtotal_minor: Set(offer.min_subtotal_minor),
            valid_from: Set(offer.valid_from),
            valid_until: Set(offer.valid_until),
            usage_limit: Set(
                offer
                    .usage_limit
                    .map(|limit| to_i32(limit, "usage limit"))
                    .transpose()?,
            ),
            used_count: Set(to_i32(offer.used_count, "used count")?),
            per_user_limit: Set(to_i32(offer.per_user_limit, "per user limit")?),
            car_category: Set(
                offer.car_category.map(|category| category.as_str().to_string()),
            ),
            first_booking_only: Set(offer.first_booking_only),
            active: Set(offer.active),
            created_at: Set(offer.created_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn offer() -> Offer {
        Offer {
            id: Uuid::new_v4(),
            code: "WELCOME".to_string(),
            title: "Welcome".to_string(),
            description: None,
            discount: Discount::Percentage { bps: 1_500 },
            max_discount_minor: Some(5_000),
            min_subtotal_minor: Some(10_000),
            valid_from: date(3, 1),
            valid_until: date(3, 31),
            usage_limit: Some(2),
            used_count: 0,
            per_user_limit: 1,
            car_category: Some(CarCategory::Suv),
            first_booking_only: true,
            active: true,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
        }
    }

    fn ctx() -> OfferContext {
        OfferContext {
            today: date(3, 15),
            subtotal_minor: 20_000,
            car_category: CarCategory::Suv,
            user_redemptions: 0,
            user_bookings: 0,
        }
    }

    #[test]
    fn eligible_offer_passes() {
        assert_eq!(offer().check_eligibility(&ctx()), Ok(()));
    }

    #[test]
    fn validity_window_is_inclusive() {
        let offer = offer();
        let first_day = OfferContext { today: date(3, 1), ..ctx() };
        let last_day = OfferContext { today: date(3, 31), ..ctx() };
        assert!(offer.check_eligibility(&first_day).is_ok());
        assert!(offer.check_eligibility(&last_day).is_ok());
        assert_eq!(
            offer.check_eligibility(&OfferContext { today: date(2, 28), ..ctx() }),
            Err(OfferRejection::NotStarted)
        );
        assert_eq!(
            offer.check_eligibility(&OfferContext { today: date(4, 1), ..ctx() }),
            Err(OfferRejection::Expired)
        );
    }

    #[test]
    fn rejections_follow_rule_order() {
        let mut offer = offer();
        offer.used_count = 2;
        let ctx = OfferContext {
            user_redemptions: 1,
            ..ctx()
        };
        assert_eq!(offer.check_eligibility(&ctx), Err(OfferRejection::UsageExhausted));

        offer.used_count = 0;
        assert_eq!(
            offer.check_eligibility(&ctx),
            Err(OfferRejection::PerUserLimitReached)
        );

        offer.active = false;
        assert_eq!(offer.check_eligibility(&ctx), Err(OfferRejection::Inactive));
    }

    #[test]
    fn first_booking_category_and_minimum() {
        let offer = offer();
        assert_eq!(
            offer.check_eligibility(&OfferContext { user_bookings: 1, ..ctx() }),
            Err(OfferRejection::NotFirstBooking)
        );
        assert_eq!(
            offer.check_eligibility(&OfferContext {
                car_category: CarCategory::Economy,
                ..ctx()
            }),
            Err(OfferRejection::CategoryMismatch)
        );
        assert_eq!(
            offer.check_eligibility(&OfferContext {
                subtotal_minor: 9_999,
                ..ctx()
            }),
            Err(OfferRejection::BelowMinimum)
        );
    }

    #[test]
    fn percentage_discount_is_capped() {
        let offer = offer();
        assert_eq!(offer.discount_for(20_000), 3_000);
        assert_eq!(offer.discount_for(100_000), 5_000);
    }

    #[test]
    fn flat_discount_is_bounded_by_subtotal() {
        let mut offer = offer();
        offer.discount = Discount::Flat { amount_minor: 2_500 };
        assert_eq!(offer.discount_for(10_000), 2_500);
        assert_eq!(offer.discount_for(1_000), 1_000);
        assert_eq!(offer.discount_for(-5), 0);
    }

    #[test]
    fn discount_validation_and_storage() {
        assert!(Discount::Percentage { bps: 0 }.validate().is_err());
        assert!(Discount::Percentage { bps: 10_001 }.validate().is_err());
        assert!(Discount::Flat { amount_minor: 0 }.validate().is_err());

        let flat = Discount::Flat { amount_minor: 700 };
        assert_eq!(Discount::from_parts(flat.kind_str(), flat.value()).unwrap(), flat);
        assert!(Discount::from_parts("bogus", 1).is_err());
    }

    #[test]
    fn rejection_becomes_engine_error() {
        let err: EngineError = OfferRejection::Expired.into();
        assert_eq!(
            err,
            EngineError::OfferNotApplicable("offer has expired".to_string())
        );
    }
}
