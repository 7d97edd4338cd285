use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Money, NotificationKind, Referral, ReferralStatus, ReferralSummary, ResultEngine, referrals,
};

use super::{Engine, with_tx};

impl Engine {
    /// The user's referral code and the people who signed up with it.
    pub async fn referrals_for(&self, user_id: Uuid) -> ResultEngine<ReferralSummary> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let referrals = referrals::Entity::find()
                .filter(referrals::Column::ReferrerId.eq(user_id))
                .order_by_desc(referrals::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Referral::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(ReferralSummary::new(user.referral_code, referrals))
        })
    }

    /// Pay the referrer of `referee_id`, if a referral is still pending.
    pub(super) async fn reward_referral(
        &self,
        db: &DatabaseTransaction,
        referee_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<Option<Referral>> {
        let Some(model) = referrals::Entity::find()
            .filter(referrals::Column::RefereeId.eq(referee_id))
            .filter(referrals::Column::Status.eq(ReferralStatus::Pending.as_str()))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let reward_minor = self.referral_reward_minor;
        let model = referrals::ActiveModel {
            id: ActiveValue::Set(model.id),
            status: ActiveValue::Set(ReferralStatus::Rewarded.as_str().to_string()),
            reward_minor: ActiveValue::Set(reward_minor),
            rewarded_at: ActiveValue::Set(Some(now)),
            ..Default::default()
        }
        .update(db)
        .await?;
        let referral = Referral::try_from(model)?;

        let referrer = self.require_user(db, referral.referrer_id).await?;
        self.adjust_credit(db, &referrer, reward_minor).await?;
        self.push_notification(
            db,
            referrer.id,
            NotificationKind::ReferralReward,
            "Referral reward",
            format!(
                "A friend completed their first rental. {} of credit was added to your account.",
                Money::new(reward_minor)
            ),
            now,
        )
        .await?;

        tracing::info!(
            referrer = %referral.referrer_id,
            referee = %referee_id,
            reward = %Money::new(reward_minor),
            "referral rewarded"
        );
        Ok(Some(referral))
    }
}
