use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Booking, BookingFilter, BookingRequest, BookingStatus, CancellationPolicy, CancellationQuote,
    Car, EngineError, Money, NotificationKind, Offer, PriceBreakdown, ResultEngine, User,
    bookings, users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Price a booking request without reserving anything.
    pub async fn quote_booking(
        &self,
        user_id: Uuid,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> ResultEngine<PriceBreakdown> {
        with_tx!(self, |db_tx| {
            let user = self.require_active_user(&db_tx, user_id).await?;
            let car = self.require_car(&db_tx, request.car_id).await?;
            let (price, _) = self
                .price_request(&db_tx, &user, &car, &request, now.date_naive())
                .await?;
            Ok(price)
        })
    }

    /// Reserve a car. The booking starts `Pending` until its payment is
    /// confirmed.
    ///
    /// Store credit spent and the offer redemption are recorded right away.
    pub async fn create_booking(
        &self,
        user_id: Uuid,
        request: BookingRequest,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        let today = now.date_naive();
        if request.period.start < today {
            return Err(EngineError::InvalidDates(
                "a rental cannot start in the past".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let user = self.require_active_user(&db_tx, user_id).await?;
            let car = self.require_car(&db_tx, request.car_id).await?;

            let taken = self
                .taken_periods(&db_tx, vec![car.id], &request.period)
                .await?;
            if !car.is_available(&request.period, taken.get(&car.id).into_iter().flatten()) {
                tracing::debug!(car = %car.id, start = %request.period.start, "car unavailable");
                return Err(EngineError::CarUnavailable(format!(
                    "{} is not available from {} to {}",
                    car.display_name(),
                    request.period.start,
                    request.period.end
                )));
            }

            let (price, offer) = self
                .price_request(&db_tx, &user, &car, &request, today)
                .await?;

            let booking = Booking {
                id: Uuid::new_v4(),
                user_id,
                car_id: car.id,
                period: request.period,
                price,
                offer_id: offer.as_ref().map(|offer| offer.id),
                status: BookingStatus::Pending,
                payment_reference: None,
                cancellation_fee_minor: 0,
                refund_minor: 0,
                created_at: now,
                updated_at: now,
                cancelled_at: None,
            };
            bookings::ActiveModel::from(&booking).insert(&db_tx).await?;

            if price.credit_applied_minor > 0 {
                self.adjust_credit(&db_tx, &user, -price.credit_applied_minor)
                    .await?;
            }
            if let Some(offer) = &offer {
                self.adjust_offer_usage(&db_tx, offer.id, 1).await?;
                tracing::info!(offer = %offer.code, booking = %booking.id, "offer redeemed");
            }

            self.push_notification(
                &db_tx,
                user_id,
                NotificationKind::BookingCreated,
                "Booking received",
                format!(
                    "{} from {} to {}. Amount due: {}.",
                    car.display_name(),
                    booking.period.start,
                    booking.period.end,
                    Money::new(price.amount_due_minor)
                ),
                now,
            )
            .await?;

            tracing::info!(
                booking = %booking.id,
                car = %car.id,
                %user_id,
                total = %Money::new(price.total_minor),
                "booking created"
            );
            Ok(booking)
        })
    }

    /// Record the payment of a pending booking.
    ///
    /// `payment_reference` is whatever the payment provider returned.
    pub async fn confirm_payment(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        payment_reference: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        let reference = payment_reference.trim();
        if reference.is_empty() {
            return Err(EngineError::InvalidInput(
                "payment reference must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let user = self.require_active_user(&db_tx, user_id).await?;
            let mut booking = self
                .require_owned_booking(&db_tx, &user, booking_id)
                .await?;
            booking.status.ensure_transition(BookingStatus::Confirmed)?;

            booking.status = BookingStatus::Confirmed;
            booking.payment_reference = Some(reference.to_string());
            booking.updated_at = now;
            self.save_booking(&db_tx, &booking).await?;

            self.push_notification(
                &db_tx,
                user_id,
                NotificationKind::BookingConfirmed,
                "Booking confirmed",
                format!(
                    "Payment received. Your car is waiting for you on {}.",
                    booking.period.start
                ),
                now,
            )
            .await?;

            tracing::info!(booking = %booking.id, "booking confirmed");
            Ok(booking)
        })
    }

    /// What cancelling the booking at `now` would cost.
    pub async fn cancellation_quote(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<CancellationQuote> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let booking = self
                .require_owned_booking(&db_tx, &user, booking_id)
                .await?;
            self.customer_cancellation(&booking, now)
        })
    }

    /// Cancel a booking on behalf of its owner, charging the policy fee.
    pub async fn cancel_booking(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            let user = self.require_active_user(&db_tx, user_id).await?;
            let booking = self
                .require_owned_booking(&db_tx, &user, booking_id)
                .await?;
            let quote = self.customer_cancellation(&booking, now)?;
            self.cancel_with(&db_tx, booking, &quote, now).await
        })
    }

    /// Bookings of the user, latest rentals first.
    pub async fn bookings_for_user(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
    ) -> ResultEngine<Vec<Booking>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut query = bookings::Entity::find().filter(bookings::Column::UserId.eq(user_id));
            if let Some(status) = status {
                query = query.filter(bookings::Column::Status.eq(status.as_str()));
            }
            query
                .order_by_desc(bookings::Column::StartDate)
                .order_by_desc(bookings::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Booking::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// A booking seen by its owner or by an admin.
    pub async fn booking(&self, user_id: Uuid, booking_id: Uuid) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            self.require_visible_booking(&db_tx, &user, booking_id)
                .await
        })
    }

    /// Authorization: admin only.
    pub async fn list_bookings(
        &self,
        admin_id: Uuid,
        filter: BookingFilter,
    ) -> ResultEngine<Vec<Booking>> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            self.filtered_bookings(&db_tx, &filter).await
        })
    }

    /// Hand the car over to the customer.
    ///
    /// Authorization: admin only.
    pub async fn start_rental(
        &self,
        admin_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let mut booking = self.require_booking(&db_tx, booking_id).await?;
            booking.status.ensure_transition(BookingStatus::Active)?;
            if now.date_naive() < booking.period.start {
                return Err(EngineError::InvalidState(format!(
                    "rental starts on {}",
                    booking.period.start
                )));
            }

            booking.status = BookingStatus::Active;
            booking.updated_at = now;
            self.save_booking(&db_tx, &booking).await?;
            tracing::info!(booking = %booking.id, "rental started");
            Ok(booking)
        })
    }

    /// Close a rental once the car is back. The renter's first completed
    /// rental pays out a pending referral.
    ///
    /// Authorization: admin only.
    pub async fn complete_rental(
        &self,
        admin_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let mut booking = self.require_booking(&db_tx, booking_id).await?;
            booking.status.ensure_transition(BookingStatus::Completed)?;

            booking.status = BookingStatus::Completed;
            booking.updated_at = now;
            self.save_booking(&db_tx, &booking).await?;

            self.push_notification(
                &db_tx,
                booking.user_id,
                NotificationKind::BookingCompleted,
                "Thanks for riding with us",
                format!(
                    "Your rental from {} to {} is complete.",
                    booking.period.start, booking.period.end
                ),
                now,
            )
            .await?;

            let completed = bookings::Entity::find()
                .filter(bookings::Column::UserId.eq(booking.user_id))
                .filter(bookings::Column::Status.eq(BookingStatus::Completed.as_str()))
                .count(&db_tx)
                .await?;
            if completed == 1 {
                self.reward_referral(&db_tx, booking.user_id, now).await?;
            }

            tracing::info!(booking = %booking.id, "rental completed");
            Ok(booking)
        })
    }

    /// Cancel any non-terminal booking, `Active` ones included. No fee is
    /// charged.
    ///
    /// Authorization: admin only.
    pub async fn admin_cancel_booking(
        &self,
        admin_id: Uuid,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let booking = self.require_booking(&db_tx, booking_id).await?;
            booking.status.ensure_transition(BookingStatus::Cancelled)?;
            let quote =
                CancellationPolicy::waived(booking.paid_minor(), booking.price.credit_applied_minor);
            self.cancel_with(&db_tx, booking, &quote, now).await
        })
    }

    /// Price `request` for `user`, checking its offer code when present.
    async fn price_request(
        &self,
        db: &DatabaseTransaction,
        user: &User,
        car: &Car,
        request: &BookingRequest,
        today: NaiveDate,
    ) -> ResultEngine<(PriceBreakdown, Option<Offer>)> {
        let offer = match request
            .offer_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
        {
            Some(code) => Some(
                self.eligible_offer(db, user.id, code, car, &request.period, today)
                    .await?,
            ),
            None => None,
        };
        let credit = if request.use_credit {
            user.credit_minor
        } else {
            0
        };
        let price = self
            .pricing
            .quote(car, &request.period, offer.as_ref(), credit)?;
        Ok((price, offer))
    }

    /// Fee and refund of a cancellation requested by the customer.
    fn customer_cancellation(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> ResultEngine<CancellationQuote> {
        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(EngineError::InvalidState(format!(
                "a {} booking cannot be cancelled",
                booking.status
            )));
        }
        self.cancellation.quote(
            booking.period.pickup_at(),
            now,
            booking.paid_minor(),
            booking.price.credit_applied_minor,
        )
    }

    /// Cancel `booking`, restoring credit and releasing its offer redemption.
    async fn cancel_with(
        &self,
        db: &DatabaseTransaction,
        mut booking: Booking,
        quote: &CancellationQuote,
        now: DateTime<Utc>,
    ) -> ResultEngine<Booking> {
        booking.apply_cancellation(quote, now);
        self.save_booking(db, &booking).await?;

        if quote.credit_restored_minor > 0 {
            let owner = self.require_user(db, booking.user_id).await?;
            self.adjust_credit(db, &owner, quote.credit_restored_minor)
                .await?;
        }
        if let Some(offer_id) = booking.offer_id {
            self.adjust_offer_usage(db, offer_id, -1).await?;
        }

        self.push_notification(
            db,
            booking.user_id,
            NotificationKind::BookingCancelled,
            "Booking cancelled",
            format!(
                "Your booking from {} to {} was cancelled. Fee: {}, refund: {}.",
                booking.period.start,
                booking.period.end,
                Money::new(quote.fee_minor),
                Money::new(quote.refund_minor)
            ),
            now,
        )
        .await?;

        tracing::info!(
            booking = %booking.id,
            fee = %Money::new(quote.fee_minor),
            refund = %Money::new(quote.refund_minor),
            "booking cancelled"
        );
        Ok(booking)
    }

    pub(super) async fn filtered_bookings(
        &self,
        db: &DatabaseTransaction,
        filter: &BookingFilter,
    ) -> ResultEngine<Vec<Booking>> {
        let mut query = bookings::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(bookings::Column::Status.eq(status.as_str()));
        }
        if let Some(car_id) = filter.car_id {
            query = query.filter(bookings::Column::CarId.eq(car_id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(bookings::Column::UserId.eq(user_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(bookings::Column::StartDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(bookings::Column::StartDate.lte(to));
        }
        query
            .order_by_asc(bookings::Column::StartDate)
            .order_by_asc(bookings::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Booking::try_from)
            .collect()
    }

    async fn save_booking(&self, db: &DatabaseTransaction, booking: &Booking) -> ResultEngine<()> {
        bookings::ActiveModel::from(booking).update(db).await?;
        Ok(())
    }

    /// Add `delta` to the store credit of `user`.
    pub(super) async fn adjust_credit(
        &self,
        db: &DatabaseTransaction,
        user: &User,
        delta: i64,
    ) -> ResultEngine<i64> {
        let credit_minor = user
            .credit_minor
            .checked_add(delta)
            .filter(|credit| *credit >= 0)
            .ok_or_else(|| EngineError::InvalidInput("invalid credit balance".to_string()))?;
        users::ActiveModel {
            id: ActiveValue::Set(user.id),
            credit_minor: ActiveValue::Set(credit_minor),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(credit_minor)
    }
}
