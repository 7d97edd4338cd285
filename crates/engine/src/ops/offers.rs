use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BookingStatus, Car, EngineError, Money, NewOffer, NotificationKind, Offer, OfferContext,
    OfferUpdate, PriceBreakdown, RentalPeriod, ResultEngine, bookings,
    offers::{self, to_i32},
    util::{normalize_code, normalize_optional_text, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Publish a new offer. With `notify_users`, every active user is told
    /// about it.
    ///
    /// Authorization: admin only.
    pub async fn create_offer(
        &self,
        admin_id: Uuid,
        new_offer: NewOffer,
        notify_users: bool,
        now: DateTime<Utc>,
    ) -> ResultEngine<Offer> {
        new_offer.discount.validate()?;
        if new_offer.valid_until < new_offer.valid_from {
            return Err(EngineError::InvalidDates(
                "offer ends before it starts".to_string(),
            ));
        }
        let per_user_limit = new_offer.per_user_limit.unwrap_or(1);
        if per_user_limit == 0 {
            return Err(EngineError::InvalidInput(
                "per user limit must be >= 1".to_string(),
            ));
        }
        if new_offer.usage_limit == Some(0) {
            return Err(EngineError::InvalidInput(
                "usage limit must be >= 1".to_string(),
            ));
        }
        if new_offer.max_discount_minor.is_some_and(|max| max <= 0) {
            return Err(EngineError::InvalidInput(
                "max discount must be > 0".to_string(),
            ));
        }
        if new_offer.min_subtotal_minor.is_some_and(|min| min < 0) {
            return Err(EngineError::InvalidInput(
                "minimum amount must be >= 0".to_string(),
            ));
        }

        let offer = Offer {
            id: Uuid::new_v4(),
            code: normalize_code(&new_offer.code)?,
            title: normalize_required_text(&new_offer.title, "title")?,
            description: normalize_optional_text(new_offer.description.as_deref()),
            discount: new_offer.discount,
            max_discount_minor: new_offer.max_discount_minor,
            min_subtotal_minor: new_offer.min_subtotal_minor,
            valid_from: new_offer.valid_from,
            valid_until: new_offer.valid_until,
            usage_limit: new_offer.usage_limit,
            used_count: 0,
            per_user_limit,
            car_category: new_offer.car_category,
            first_booking_only: new_offer.first_booking_only,
            active: true,
            created_at: now,
        };

        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;

            let exists = offers::Entity::find()
                .filter(offers::Column::Code.eq(offer.code.as_str()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(offer.code.clone()));
            }

            offers::ActiveModel::try_from(&offer)?
                .insert(&db_tx)
                .await?;

            if notify_users {
                let message = format!(
                    "Use code {} until {}. {}",
                    offer.code,
                    offer.valid_until,
                    offer.description.as_deref().unwrap_or_default()
                );
                let sent = self
                    .push_notification_to_all(
                        &db_tx,
                        NotificationKind::Offer,
                        &offer.title,
                        message.trim_end(),
                        now,
                    )
                    .await?;
                tracing::debug!(offer = %offer.code, sent, "offer announced");
            }

            tracing::info!(offer = %offer.id, code = %offer.code, "offer created");
            Ok(offer)
        })
    }

    /// Authorization: admin only.
    pub async fn update_offer(
        &self,
        admin_id: Uuid,
        offer_id: Uuid,
        update: OfferUpdate,
    ) -> ResultEngine<Offer> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let offer = self.require_offer(&db_tx, offer_id).await?;

            let mut active = offers::ActiveModel {
                id: ActiveValue::Set(offer_id),
                ..Default::default()
            };
            if let Some(title) = update.title.as_deref() {
                active.title = ActiveValue::Set(normalize_required_text(title, "title")?);
            }
            if let Some(description) = update.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }
            if let Some(valid_until) = update.valid_until {
                if valid_until < offer.valid_from {
                    return Err(EngineError::InvalidDates(
                        "offer ends before it starts".to_string(),
                    ));
                }
                active.valid_until = ActiveValue::Set(valid_until);
            }
            if let Some(limit) = update.usage_limit {
                if limit == 0 || limit < offer.used_count {
                    return Err(EngineError::InvalidInput(format!(
                        "usage limit must be >= 1 and >= {} already used",
                        offer.used_count
                    )));
                }
                active.usage_limit = ActiveValue::Set(Some(to_i32(limit, "usage limit")?));
            }
            if let Some(flag) = update.active {
                active.active = ActiveValue::Set(flag);
            }

            let model = active.update(&db_tx).await?;
            Offer::try_from(model)
        })
    }

    /// Every offer, newest first.
    ///
    /// Authorization: admin only.
    pub async fn list_offers(&self, admin_id: Uuid) -> ResultEngine<Vec<Offer>> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            offers::Entity::find()
                .order_by_desc(offers::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Offer::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Offers redeemable on `today`, those expiring first listed first.
    pub async fn active_offers(&self, today: NaiveDate) -> ResultEngine<Vec<Offer>> {
        with_tx!(self, |db_tx| {
            let live = offers::Entity::find()
                .filter(offers::Column::Active.eq(true))
                .filter(offers::Column::ValidFrom.lte(today))
                .filter(offers::Column::ValidUntil.gte(today))
                .order_by_asc(offers::Column::ValidUntil)
                .order_by_asc(offers::Column::Code)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Offer::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(live
                .into_iter()
                .filter(|offer| offer.remaining_uses() != Some(0))
                .collect())
        })
    }

    /// Check that `code` applies to a rental of `car_id` over `period` and
    /// return the discounted price.
    pub async fn validate_offer(
        &self,
        user_id: Uuid,
        code: &str,
        car_id: Uuid,
        period: RentalPeriod,
        today: NaiveDate,
    ) -> ResultEngine<PriceBreakdown> {
        with_tx!(self, |db_tx| {
            self.require_active_user(&db_tx, user_id).await?;
            let car = self.require_car(&db_tx, car_id).await?;
            let offer = self
                .eligible_offer(&db_tx, user_id, code, &car, &period, today)
                .await?;
            self.pricing.quote(&car, &period, Some(&offer), 0)
        })
    }

    /// Load the offer behind `code` and check it against the rental.
    pub(super) async fn eligible_offer(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        code: &str,
        car: &Car,
        period: &RentalPeriod,
        today: NaiveDate,
    ) -> ResultEngine<Offer> {
        let code = normalize_code(code)?;
        let offer = offers::Entity::find()
            .filter(offers::Column::Code.eq(code.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("offer {code} not exists")))?;
        let offer = Offer::try_from(offer)?;

        let undiscounted = self.pricing.quote(car, period, None, 0)?;
        let ctx = OfferContext {
            today,
            subtotal_minor: undiscounted.subtotal_minor(),
            car_category: car.category,
            user_redemptions: self
                .count_user_bookings(db, user_id, Some(offer.id))
                .await?,
            user_bookings: self.count_user_bookings(db, user_id, None).await?,
        };

        if let Err(rejection) = offer.check_eligibility(&ctx) {
            tracing::debug!(
                %user_id,
                code = %offer.code,
                subtotal = %Money::new(ctx.subtotal_minor),
                reason = rejection.message(),
                "offer rejected"
            );
            return Err(rejection.into());
        }
        Ok(offer)
    }

    /// Non-cancelled bookings of the user, restricted to `offer_id` if given.
    async fn count_user_bookings(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        offer_id: Option<Uuid>,
    ) -> ResultEngine<u32> {
        let mut query = bookings::Entity::find()
            .filter(bookings::Column::UserId.eq(user_id))
            .filter(bookings::Column::Status.ne(BookingStatus::Cancelled.as_str()));
        if let Some(offer_id) = offer_id {
            query = query.filter(bookings::Column::OfferId.eq(offer_id));
        }
        let count = query.count(db).await?;
        u32::try_from(count)
            .map_err(|_| EngineError::InvalidInput("too many bookings".to_string()))
    }

    /// Move the redemption counter of an offer by `delta`, never below zero.
    pub(super) async fn adjust_offer_usage(
        &self,
        db: &DatabaseTransaction,
        offer_id: Uuid,
        delta: i32,
    ) -> ResultEngine<()> {
        let offer = self.require_offer(db, offer_id).await?;
        let used_count = to_i32(offer.used_count, "used count")?
            .saturating_add(delta)
            .max(0);
        offers::ActiveModel {
            id: ActiveValue::Set(offer_id),
            used_count: ActiveValue::Set(used_count),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }
}
