//! In-app notifications addressed to a user.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::{EngineError, macros::string_enum};

string_enum! {
    pub enum NotificationKind: "notification kind" {
        Welcome => "welcome",
        BookingCreated => "booking_created",
        BookingConfirmed => "booking_confirmed",
        BookingCancelled => "booking_cancelled",
        BookingCompleted => "booking_completed",
        Offer => "offer",
        ReferralReward => "referral_reward",
        System => "system",
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            read: false,
            created_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Notification {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: NotificationKind::try_from(model.kind.as_str())?,
            title: model.title,
            message: model.message,
            read: model.read,
            created_at: model.created_at,
        })
    }
}

impl From<&Notification> for ActiveModel {
    fn from(value: &Notification) -> Self {
        use sea_orm::ActiveValue::Set;

        Self {
            id: Set(value.id),
            user_id: Set(value.user_id),
            kind: Set(value.kind.as_str().to_string()),
            title: Set(value.title.clone()),
            message: Set(value.message.clone()),
            read: Set(value.read),
            created_at: Set(value.created_at),
        }
    }
}
