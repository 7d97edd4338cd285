//! Car rental engine: accounts, fleet, pricing, offers, bookings and the
//! bookkeeping around them (notifications, referrals, reports).
//!
//! Every operation lives on [`Engine`] and runs in its own database
//! transaction. Amounts are `i64` minor units, see [`Money`].

pub use bookings::{Booking, BookingFilter, BookingRequest, BookingStatus};
pub use cars::{
    Car, CarCategory, CarSearch, CarUpdate, FuelType, MAX_RENTAL_DAYS, NewCar, RentalPeriod,
    Transmission,
};
pub use error::EngineError;
pub use money::Money;
pub use notifications::{Notification, NotificationKind};
pub use offers::{Discount, NewOffer, Offer, OfferContext, OfferRejection, OfferUpdate};
pub use ops::{DEFAULT_REFERRAL_REWARD_MINOR, Engine, EngineBuilder};
pub use pricing::{CancellationPolicy, CancellationQuote, PriceBreakdown, PricingPolicy};
pub use referrals::{Referral, ReferralStatus, ReferralSummary};
pub use reports::{MonthlyRevenue, ReportRange, ReportSummary, TOP_CARS, TopCar};
pub use users::{AccountUpdate, NewUser, ProfileUpdate, Role, User};
pub use util::MIN_PASSWORD_LEN;

mod bookings;
mod cars;
mod error;
mod macros;
pub mod money;
mod notifications;
mod offers;
mod ops;
mod pricing;
mod referrals;
mod reports;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
