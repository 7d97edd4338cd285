//! Rental pricing and cancellation fees.
//!
//! All arithmetic is done on `i64` minor units. Percentages are basis points
//! applied through [`apply_bps`], rounding half up.
//!
//! A quote is computed in this order:
//!
//! 1. `base = daily_rate * days`
//! 2. duration discount (monthly rate from 30 days, weekly rate from 7 days)
//! 3. offer discount on what is left
//! 4. tax on the discounted amount
//! 5. store credit on the taxed total

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{
    Car, EngineError, Offer, RentalPeriod, ResultEngine,
    money::{BPS_DENOMINATOR, apply_bps},
};

fn check_rate(name: &str, bps: u32) -> ResultEngine<()> {
    if i64::from(bps) > BPS_DENOMINATOR {
        return Err(EngineError::InvalidInput(format!(
            "{name} must be at most {BPS_DENOMINATOR} bps, got {bps}"
        )));
    }
    Ok(())
}

const WEEKLY_DAYS: i64 = 7;
const MONTHLY_DAYS: i64 = 30;

/// Tax and long-rental discount rates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    pub tax_rate_bps: u32,
    pub weekly_discount_bps: u32,
    pub monthly_discount_bps: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate_bps: 1_800,
            weekly_discount_bps: 1_000,
            monthly_discount_bps: 2_000,
        }
    }
}

impl PricingPolicy {
    /// Rates above 100% would turn a subtotal negative.
    pub fn validate(&self) -> ResultEngine<()> {
        check_rate("tax_rate_bps", self.tax_rate_bps)?;
        check_rate("weekly_discount_bps", self.weekly_discount_bps)?;
        check_rate("monthly_discount_bps", self.monthly_discount_bps)
    }

    pub fn duration_discount_bps(&self, days: i64) -> u32 {
        if days >= MONTHLY_DAYS {
            self.monthly_discount_bps
        } else if days >= WEEKLY_DAYS {
            self.weekly_discount_bps
        } else {
            0
        }
    }

    /// Price a rental of `car` over `period`.
    ///
    /// The offer is assumed eligible, callers check it beforehand.
    pub fn quote(
        &self,
        car: &Car,
        period: &RentalPeriod,
        offer: Option<&Offer>,
        credit_available_minor: i64,
    ) -> ResultEngine<PriceBreakdown> {
        let days = car.rental_days(period)?;
        let base_minor = car.base_price_minor(days)?;
        let duration_discount_minor = apply_bps(base_minor, self.duration_discount_bps(days));
        let subtotal_minor = base_minor - duration_discount_minor;

        let offer_discount_minor = offer.map_or(0, |offer| offer.discount_for(subtotal_minor));
        let taxable_minor = subtotal_minor - offer_discount_minor;
        let tax_minor = apply_bps(taxable_minor, self.tax_rate_bps);
        let total_minor = taxable_minor
            .checked_add(tax_minor)
            .ok_or_else(|| EngineError::InvalidInput("rental price overflow".to_string()))?;

        let credit_applied_minor = credit_available_minor.clamp(0, total_minor);

        Ok(PriceBreakdown {
            days,
            daily_rate_minor: car.daily_rate_minor,
            base_minor,
            duration_discount_minor,
            offer_discount_minor,
            tax_minor,
            total_minor,
            credit_applied_minor,
            amount_due_minor: total_minor - credit_applied_minor,
        })
    }
}

/// The itemized price of a rental. Persisted on the booking so later rate
/// changes never alter an accepted price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub days: i64,
    pub daily_rate_minor: i64,
    pub base_minor: i64,
    pub duration_discount_minor: i64,
    pub offer_discount_minor: i64,
    pub tax_minor: i64,
    pub total_minor: i64,
    pub credit_applied_minor: i64,
    pub amount_due_minor: i64,
}

impl PriceBreakdown {
    /// Amount left after the duration discount, before any offer.
    pub fn subtotal_minor(&self) -> i64 {
        self.base_minor - self.duration_discount_minor
    }
}

/// Fee schedule applied when a customer cancels a paid booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CancellationPolicy {
    /// Cancelling at least this many hours before pick-up is free.
    pub free_hours: i64,
    /// Between `late_hours` and `free_hours` the late fee applies.
    pub late_hours: i64,
    pub late_fee_bps: u32,
    /// Applied below `late_hours`.
    pub last_minute_fee_bps: u32,
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self {
            free_hours: 48,
            late_hours: 24,
            late_fee_bps: 2_500,
            last_minute_fee_bps: 5_000,
        }
    }
}

/// Money movements of a cancellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CancellationQuote {
    pub fee_minor: i64,
    pub refund_minor: i64,
    pub credit_restored_minor: i64,
}

impl CancellationPolicy {
    /// Fees never exceed the paid amount and the windows are ordered
    /// `0 <= late_hours <= free_hours`.
    pub fn validate(&self) -> ResultEngine<()> {
        check_rate("late_fee_bps", self.late_fee_bps)?;
        check_rate("last_minute_fee_bps", self.last_minute_fee_bps)?;
        if self.late_hours < 0 || self.free_hours < 0 {
            return Err(EngineError::InvalidInput(
                "cancellation windows must not be negative".to_string(),
            ));
        }
        if self.late_hours > self.free_hours {
            return Err(EngineError::InvalidInput(
                "late cancellation window must not exceed the free one".to_string(),
            ));
        }
        Ok(())
    }

    /// Fee rate for a cancellation at `now` of a rental picked up at `pickup`.
    ///
    /// Fails once the pick-up instant is reached: the rental can no longer be
    /// cancelled by its customer.
    pub fn fee_bps(&self, pickup: DateTime<Utc>, now: DateTime<Utc>) -> ResultEngine<u32> {
        if now >= pickup {
            return Err(EngineError::InvalidState(
                "the rental period has already started".to_string(),
            ));
        }
        let hours_before = (pickup - now).num_hours();
        Ok(if hours_before >= self.free_hours {
            0
        } else if hours_before >= self.late_hours {
            self.late_fee_bps
        } else {
            self.last_minute_fee_bps
        })
    }

    /// Split the paid amount into fee and refund.
    ///
    /// `paid_minor` is what the customer actually paid (0 while pending).
    /// Store credit used for the booking is always given back.
    pub fn quote(
        &self,
        pickup: DateTime<Utc>,
        now: DateTime<Utc>,
        paid_minor: i64,
        credit_applied_minor: i64,
    ) -> ResultEngine<CancellationQuote> {
        let fee_minor = apply_bps(paid_minor, self.fee_bps(pickup, now)?);
        Ok(CancellationQuote {
            fee_minor,
            refund_minor: paid_minor - fee_minor,
            credit_restored_minor: credit_applied_minor,
        })
    }

    /// Cancellation decided by an admin: no fee, everything paid is refunded.
    pub fn waived(paid_minor: i64, credit_applied_minor: i64) -> CancellationQuote {
        CancellationQuote {
            fee_minor: 0,
            refund_minor: paid_minor,
            credit_restored_minor: credit_applied_minor,
        }
    }
}
