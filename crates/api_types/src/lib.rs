//! JSON bodies exchanged with the car rental HTTP API.
//!
//! Amounts are integers in minor units (`4550` is `45.50`). Rental dates are
//! `YYYY-MM-DD`; the end date is the drop-off day and is not charged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub mod user {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Role {
        Customer,
        Admin,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Register {
        pub username: String,
        pub email: String,
        pub password: String,
        pub full_name: Option<String>,
        pub phone: Option<String>,
        /// Code of the friend who invited the user.
        pub referral_code: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
        pub email: String,
        pub full_name: Option<String>,
        pub phone: Option<String>,
        pub role: Role,
        pub active: bool,
        pub referral_code: String,
        pub credit_minor: i64,
        pub created_at: DateTime<Utc>,
    }

    /// Fields left out are unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub email: Option<String>,
        pub full_name: Option<String>,
        pub phone: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PasswordChange {
        pub old_password: String,
        pub new_password: String,
    }

    /// Admin update of an account.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserAdminUpdate {
        pub role: Option<Role>,
        pub active: Option<bool>,
    }
}

pub mod car {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CarCategory {
        Economy,
        Compact,
        Sedan,
        Suv,
        Luxury,
        Van,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Transmission {
        Manual,
        Automatic,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum FuelType {
        Petrol,
        Diesel,
        Hybrid,
        Electric,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CarView {
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
        pub active: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CarNew {
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

    #[derive(Debug, Default, Serialize, Deserialize)]
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CarActive {
        pub active: bool,
    }

    /// Query string of `GET /cars`.
    ///
    /// `start` and `end` must be given together; only cars free over that
    /// period are returned.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CarQuery {
        pub category: Option<CarCategory>,
        pub location: Option<String>,
        pub min_seats: Option<u8>,
        pub transmission: Option<Transmission>,
        pub fuel: Option<FuelType>,
        pub max_daily_rate_minor: Option<i64>,
        pub start: Option<NaiveDate>,
        pub end: Option<NaiveDate>,
    }
}

pub mod booking {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BookingStatus {
        Pending,
        Confirmed,
        Active,
        Completed,
        Cancelled,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingRequest {
        pub car_id: Uuid,
        pub start: NaiveDate,
        pub end: NaiveDate,
        pub offer_code: Option<String>,
        #[serde(default)]
        pub use_credit: bool,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PriceView {
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BookingView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub car_id: Uuid,
        pub start: NaiveDate,
        pub end: NaiveDate,
        pub status: BookingStatus,
        pub price: PriceView,
        pub offer_id: Option<Uuid>,
        pub payment_reference: Option<String>,
        pub cancellation_fee_minor: i64,
        pub refund_minor: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
        pub cancelled_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentConfirm {
        /// Reference returned by the payment provider.
        pub payment_reference: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CancellationQuoteView {
        pub fee_minor: i64,
        pub refund_minor: i64,
        pub credit_restored_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BookingQuery {
        pub status: Option<BookingStatus>,
    }

    /// Query string of `GET /admin/bookings`. Dates filter the start date.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AdminBookingQuery {
        pub status: Option<BookingStatus>,
        pub car_id: Option<Uuid>,
        pub user_id: Option<Uuid>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }
}

pub mod offer {
    use super::*;
    use crate::car::CarCategory;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Discount {
        /// Basis points: `1000` is 10%.
        Percentage { bps: u32 },
        Flat { amount_minor: i64 },
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OfferNew {
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
        #[serde(default)]
        pub first_booking_only: bool,
        /// Send an offer notification to every active user.
        #[serde(default)]
        pub notify_users: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OfferView {
        pub id: Uuid,
        pub code: String,
        pub title: String,
        pub description: Option<String>,
        pub discount: Discount,
        pub max_discount_minor: Option<i64>,
        pub min_subtotal_minor: Option<i64>,
        pub valid_from: NaiveDate,
        pub valid_until: NaiveDate,
        pub usage_limit: Option<u32>,
        pub used_count: u32,
        pub per_user_limit: u32,
        pub car_category: Option<CarCategory>,
        pub first_booking_only: bool,
        pub active: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct OfferUpdate {
        pub title: Option<String>,
        pub description: Option<String>,
        pub valid_until: Option<NaiveDate>,
        pub usage_limit: Option<u32>,
        pub active: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OfferValidate {
        pub code: String,
        pub car_id: Uuid,
        pub start: NaiveDate,
        pub end: NaiveDate,
    }
}

pub mod notification {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum NotificationKind {
        Welcome,
        BookingCreated,
        BookingConfirmed,
        BookingCancelled,
        BookingCompleted,
        Offer,
        ReferralReward,
        System,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct NotificationView {
        pub id: Uuid,
        pub kind: NotificationKind,
        pub title: String,
        pub message: String,
        pub read: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct NotificationQuery {
        #[serde(default)]
        pub unread_only: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UnreadCount {
        pub unread: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MarkedRead {
        pub updated: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Broadcast {
        pub title: String,
        pub message: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BroadcastSent {
        pub sent: u64,
    }
}

pub mod referral {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ReferralStatus {
        Pending,
        Rewarded,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReferralView {
        pub referee_id: Uuid,
        pub status: ReferralStatus,
        pub reward_minor: i64,
        pub created_at: DateTime<Utc>,
        pub rewarded_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReferralSummaryView {
        pub code: String,
        pub pending: u32,
        pub rewarded: u32,
        pub total_earned_minor: i64,
        pub referrals: Vec<ReferralView>,
    }
}

pub mod report {
    use std::collections::BTreeMap;

    use super::*;

    /// Inclusive range of booking start dates.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportQuery {
        pub from: NaiveDate,
        pub to: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TopCarView {
        pub car_id: Uuid,
        pub name: String,
        pub bookings: u32,
        pub revenue_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyRevenueView {
        pub month: String,
        pub bookings: u32,
        pub revenue_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportSummaryView {
        pub from: NaiveDate,
        pub to: NaiveDate,
        pub total_users: u64,
        pub total_cars: u64,
        pub active_cars: u64,
        pub bookings_by_status: BTreeMap<String, u32>,
        pub gross_revenue_minor: i64,
        pub discounts_minor: i64,
        pub cancellation_fees_minor: i64,
        pub refunds_minor: i64,
        pub top_cars: Vec<TopCarView>,
        pub monthly: Vec<MonthlyRevenueView>,
    }
}
