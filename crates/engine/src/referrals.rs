//! Referrals: a user invites another one with their referral code and is
//! rewarded with store credit once the invitee completes a first rental.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, macros::string_enum};

string_enum! {
    pub enum ReferralStatus: "referral status" {
        Pending => "pending",
        Rewarded => "rewarded",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Referral {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub code: String,
    pub status: ReferralStatus,
    pub reward_minor: i64,
    pub created_at: DateTime<Utc>,
    pub rewarded_at: Option<DateTime<Utc>>,
}

/// A user's referral activity.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferralSummary {
    pub code: String,
    pub referrals: Vec<Referral>,
    pub pending: u32,
    pub rewarded: u32,
    pub total_earned_minor: i64,
}

impl ReferralSummary {
    pub fn new(code: String, referrals: Vec<Referral>) -> Self {
        let (pending, rewarded, total_earned_minor) =
            referrals
                .iter()
                .fold((0u32, 0u32, 0i64), |(pending, rewarded, earned), r| match r.status {
                    ReferralStatus::Pending => (pending + 1, rewarded, earned),
                    ReferralStatus::Rewarded => (pending, rewarded + 1, earned + r.reward_minor),
                });
        Self {
            code,
            referrals,
            pending,
            rewarded,
            total_earned_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referee_id: Uuid,
    pub code: String,
    pub status: String,
    pub reward_minor: i64,
    pub created_at: DateTime<Utc>,
    pub rewarded_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Referral {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            referrer_id: model.referrer_id,
            referee_id: model.referee_id,
            status: ReferralStatus::try_from(model.status.as_str())?,
            code: model.code,
            reward_minor: model.reward_minor,
            created_at: model.created_at,
            rewarded_at: model.rewarded_at,
        })
    }
}
