use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{Booking, Car, EngineError, Offer, ResultEngine, User, bookings, cars, offers, users};

use super::Engine;

/// Generates a `require_*` loader that maps a missing row to `KeyNotFound`
/// and converts the model into its domain type.
macro_rules! impl_require {
    ($fn_name:ident, $entity:path, $domain:ty, $err_msg:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db: &DatabaseTransaction,
            id: Uuid,
        ) -> ResultEngine<$domain> {
            let model = <$entity>::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound($err_msg.to_string()))?;
            <$domain>::try_from(model)
        }
    };
}

impl Engine {
    impl_require!(require_user, users::Entity, User, "user not exists");
    impl_require!(require_car, cars::Entity, Car, "car not exists");
    impl_require!(require_offer, offers::Entity, Offer, "offer not exists");
    impl_require!(require_booking, bookings::Entity, Booking, "booking not exists");

    /// Loads the caller and rejects disabled accounts.
    pub(super) async fn require_active_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let user = self.require_user(db, user_id).await?;
        if !user.active {
            return Err(EngineError::Forbidden("account is disabled".to_string()));
        }
        Ok(user)
    }

    pub(super) async fn require_admin(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let user = self.require_active_user(db, user_id).await?;
        if !user.is_admin() {
            return Err(EngineError::Forbidden("admin role required".to_string()));
        }
        Ok(user)
    }

    /// Loads a booking visible to `user`: its owner or an admin.
    ///
    /// Bookings of other customers are reported as missing.
    pub(super) async fn require_visible_booking(
        &self,
        db: &DatabaseTransaction,
        user: &User,
        booking_id: Uuid,
    ) -> ResultEngine<Booking> {
        let booking = self.require_booking(db, booking_id).await?;
        if booking.user_id != user.id && !user.is_admin() {
            return Err(EngineError::KeyNotFound("booking not exists".to_string()));
        }
        Ok(booking)
    }

    /// Loads a booking owned by `user`.
    pub(super) async fn require_owned_booking(
        &self,
        db: &DatabaseTransaction,
        user: &User,
        booking_id: Uuid,
    ) -> ResultEngine<Booking> {
        let booking = self.require_booking(db, booking_id).await?;
        if booking.user_id != user.id {
            return Err(EngineError::KeyNotFound("booking not exists".to_string()));
        }
        Ok(booking)
    }
}
