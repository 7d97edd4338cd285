//! Conversions between engine types and the JSON bodies of `api_types`.

use api_types::{
    booking::{BookingStatus, BookingView, CancellationQuoteView, PriceView},
    car::{CarCategory, CarView, FuelType, Transmission},
    notification::{NotificationKind, NotificationView},
    offer::{Discount, OfferView},
    referral::{ReferralStatus, ReferralSummaryView, ReferralView},
    report::{MonthlyRevenueView, ReportSummaryView, TopCarView},
    user::{Role, UserView},
};
use engine::ReportRange;

pub fn user_view(user: &engine::User) -> UserView {
    UserView {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        phone: user.phone.clone(),
        role: match user.role {
            engine::Role::Customer => Role::Customer,
            engine::Role::Admin => Role::Admin,
        },
        active: user.active,
        referral_code: user.referral_code.clone(),
        credit_minor: user.credit_minor,
        created_at: user.created_at,
    }
}

pub fn role(role: Role) -> engine::Role {
    match role {
        Role::Customer => engine::Role::Customer,
        Role::Admin => engine::Role::Admin,
    }
}

pub fn category(category: CarCategory) -> engine::CarCategory {
    match category {
        CarCategory::Economy => engine::CarCategory::Economy,
        CarCategory::Compact => engine::CarCategory::Compact,
        CarCategory::Sedan => engine::CarCategory::Sedan,
        CarCategory::Suv => engine::CarCategory::Suv,
        CarCategory::Luxury => engine::CarCategory::Luxury,
        CarCategory::Van => engine::CarCategory::Van,
    }
}

fn map_category(category: engine::CarCategory) -> CarCategory {
    match category {
        engine::CarCategory::Economy => CarCategory::Economy,
        engine::CarCategory::Compact => CarCategory::Compact,
        engine::CarCategory::Sedan => CarCategory::Sedan,
        engine::CarCategory::Suv => CarCategory::Suv,
        engine::CarCategory::Luxury => CarCategory::Luxury,
        engine::CarCategory::Van => CarCategory::Van,
    }
}

pub fn transmission(transmission: Transmission) -> engine::Transmission {
    match transmission {
        Transmission::Manual => engine::Transmission::Manual,
        Transmission::Automatic => engine::Transmission::Automatic,
    }
}

pub fn fuel(fuel: FuelType) -> engine::FuelType {
    match fuel {
        FuelType::Petrol => engine::FuelType::Petrol,
        FuelType::Diesel => engine::FuelType::Diesel,
        FuelType::Hybrid => engine::FuelType::Hybrid,
        FuelType::Electric => engine::FuelType::Electric,
    }
}

pub fn car_view(car: &engine::Car) -> CarView {
    CarView {
        id: car.id,
        make: car.make.clone(),
        model: car.model.clone(),
        year: car.year,
        category: map_category(car.category),
        seats: car.seats,
        transmission: match car.transmission {
            engine::Transmission::Manual => Transmission::Manual,
            engine::Transmission::Automatic => Transmission::Automatic,
        },
        fuel: match car.fuel {
            engine::FuelType::Petrol => FuelType::Petrol,
            engine::FuelType::Diesel => FuelType::Diesel,
            engine::FuelType::Hybrid => FuelType::Hybrid,
            engine::FuelType::Electric => FuelType::Electric,
        },
        daily_rate_minor: car.daily_rate_minor,
        location: car.location.clone(),
        plate_number: car.plate_number.clone(),
        active: car.active,
    }
}

pub fn booking_status(status: BookingStatus) -> engine::BookingStatus {
    match status {
        BookingStatus::Pending => engine::BookingStatus::Pending,
        BookingStatus::Confirmed => engine::BookingStatus::Confirmed,
        BookingStatus::Active => engine::BookingStatus::Active,
        BookingStatus::Completed => engine::BookingStatus::Completed,
        BookingStatus::Cancelled => engine::BookingStatus::Cancelled,
    }
}

pub fn price_view(price: &engine::PriceBreakdown) -> PriceView {
    PriceView {
        days: price.days,
        daily_rate_minor: price.daily_rate_minor,
        base_minor: price.base_minor,
        duration_discount_minor: price.duration_discount_minor,
        offer_discount_minor: price.offer_discount_minor,
        tax_minor: price.tax_minor,
        total_minor: price.total_minor,
        credit_applied_minor: price.credit_applied_minor,
        amount_due_minor: price.amount_due_minor,
    }
}

pub fn booking_view(booking: &engine::Booking) -> BookingView {
    BookingView {
        id: booking.id,
        user_id: booking.user_id,
        car_id: booking.car_id,
        start: booking.period.start,
        end: booking.period.end,
        status: match booking.status {
            engine::BookingStatus::Pending => BookingStatus::Pending,
            engine::BookingStatus::Confirmed => BookingStatus::Confirmed,
            engine::BookingStatus::Active => BookingStatus::Active,
            engine::BookingStatus::Completed => BookingStatus::Completed,
            engine::BookingStatus::Cancelled => BookingStatus::Cancelled,
        },
        price: price_view(&booking.price),
        offer_id: booking.offer_id,
        payment_reference: booking.payment_reference.clone(),
        cancellation_fee_minor: booking.cancellation_fee_minor,
        refund_minor: booking.refund_minor,
        created_at: booking.created_at,
        updated_at: booking.updated_at,
        cancelled_at: booking.cancelled_at,
    }
}

pub fn cancellation_view(quote: &engine::CancellationQuote) -> CancellationQuoteView {
    CancellationQuoteView {
        fee_minor: quote.fee_minor,
        refund_minor: quote.refund_minor,
        credit_restored_minor: quote.credit_restored_minor,
    }
}

pub fn discount(discount: Discount) -> engine::Discount {
    match discount {
        Discount::Percentage { bps } => engine::Discount::Percentage { bps },
        Discount::Flat { amount_minor } => engine::Discount::Flat { amount_minor },
    }
}

pub fn offer_view(offer: &engine::Offer) -> OfferView {
    OfferView {
        id: offer.id,
        code: offer.code.clone(),
        title: offer.title.clone(),
        description: offer.description.clone(),
        discount: match offer.discount {
            engine::Discount::Percentage { bps } => Discount::Percentage { bps },
            engine::Discount::Flat { amount_minor } => Discount::Flat { amount_minor },
        },
        max_discount_minor: offer.max_discount_minor,
        min_subtotal_minor: offer.min_subtotal_minor,
        valid_from: offer.valid_from,
        valid_until: offer.valid_until,
        usage_limit: offer.usage_limit,
        used_count: offer.used_count,
        per_user_limit: offer.per_user_limit,
        car_category: offer.car_category.map(map_category),
        first_booking_only: offer.first_booking_only,
        active: offer.active,
    }
}

pub fn notification_view(notification: &engine::Notification) -> NotificationView {
    use engine::NotificationKind as Kind;

    NotificationView {
        id: notification.id,
        kind: match notification.kind {
            Kind::Welcome => NotificationKind::Welcome,
            Kind::BookingCreated => NotificationKind::BookingCreated,
            Kind::BookingConfirmed => NotificationKind::BookingConfirmed,
            Kind::BookingCancelled => NotificationKind::BookingCancelled,
            Kind::BookingCompleted => NotificationKind::BookingCompleted,
            Kind::Offer => NotificationKind::Offer,
            Kind::ReferralReward => NotificationKind::ReferralReward,
            Kind::System => NotificationKind::System,
        },
        title: notification.title.clone(),
        message: notification.message.clone(),
        read: notification.read,
        created_at: notification.created_at,
    }
}

pub fn referral_summary_view(summary: &engine::ReferralSummary) -> ReferralSummaryView {
    ReferralSummaryView {
        code: summary.code.clone(),
        pending: summary.pending,
        rewarded: summary.rewarded,
        total_earned_minor: summary.total_earned_minor,
        referrals: summary
            .referrals
            .iter()
            .map(|referral| ReferralView {
                referee_id: referral.referee_id,
                status: match referral.status {
                    engine::ReferralStatus::Pending => ReferralStatus::Pending,
                    engine::ReferralStatus::Rewarded => ReferralStatus::Rewarded,
                },
                reward_minor: referral.reward_minor,
                created_at: referral.created_at,
                rewarded_at: referral.rewarded_at,
            })
            .collect(),
    }
}

pub fn report_view(range: ReportRange, summary: engine::ReportSummary) -> ReportSummaryView {
    ReportSummaryView {
        from: range.from,
        to: range.to,
        total_users: summary.total_users,
        total_cars: summary.total_cars,
        active_cars: summary.active_cars,
        bookings_by_status: summary.bookings_by_status,
        gross_revenue_minor: summary.gross_revenue_minor,
        discounts_minor: summary.discounts_minor,
        cancellation_fees_minor: summary.cancellation_fees_minor,
        refunds_minor: summary.refunds_minor,
        top_cars: summary
            .top_cars
            .into_iter()
            .map(|car| TopCarView {
                car_id: car.car_id,
                name: car.name,
                bookings: car.bookings,
                revenue_minor: car.revenue_minor,
            })
            .collect(),
        monthly: summary
            .monthly
            .into_iter()
            .map(|month| MonthlyRevenueView {
                month: month.month,
                bookings: month.bookings,
                revenue_minor: month.revenue_minor,
            })
            .collect(),
    }
}
