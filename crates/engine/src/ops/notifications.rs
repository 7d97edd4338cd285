use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, Notification, NotificationKind, ResultEngine, notifications, users,
    util::normalize_required_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Store a notification for `user_id` inside the current transaction.
    pub(super) async fn push_notification(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Uuid> {
        let notification = Notification::new(user_id, kind, title, message, now);
        notifications::ActiveModel::from(&notification)
            .insert(db)
            .await?;
        tracing::debug!(%user_id, kind = %kind, "notification stored");
        Ok(notification.id)
    }

    /// Store a notification for every active user. Returns how many were created.
    pub(super) async fn push_notification_to_all(
        &self,
        db: &DatabaseTransaction,
        kind: NotificationKind,
        title: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<u64> {
        let recipients = users::Entity::find()
            .filter(users::Column::Active.eq(true))
            .all(db)
            .await?;

        let mut sent = 0;
        for user in recipients {
            self.push_notification(db, user.id, kind, title, message, now)
                .await?;
            sent += 1;
        }
        Ok(sent)
    }

    /// Notifications of `user_id`, newest first.
    pub async fn notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
    ) -> ResultEngine<Vec<Notification>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;

            let mut query = notifications::Entity::find()
                .filter(notifications::Column::UserId.eq(user_id));
            if unread_only {
                query = query.filter(notifications::Column::Read.eq(false));
            }

            let models = query
                .order_by_desc(notifications::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            models
                .into_iter()
                .map(Notification::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    pub async fn unread_count(&self, user_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let count = notifications::Entity::find()
                .filter(notifications::Column::UserId.eq(user_id))
                .filter(notifications::Column::Read.eq(false))
                .count(&db_tx)
                .await?;
            Ok(count)
        })
    }

    pub async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_own_notification(&db_tx, user_id, notification_id)
                .await?;
            if !model.read {
                let active = notifications::ActiveModel {
                    id: ActiveValue::Set(model.id),
                    read: ActiveValue::Set(true),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Mark every unread notification of the user as read. Returns how many changed.
    pub async fn mark_all_notifications_read(&self, user_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let result = notifications::Entity::update_many()
                .col_expr(notifications::Column::Read, Expr::value(true))
                .filter(notifications::Column::UserId.eq(user_id))
                .filter(notifications::Column::Read.eq(false))
                .exec(&db_tx)
                .await?;
            Ok(result.rows_affected)
        })
    }

    pub async fn delete_notification(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_own_notification(&db_tx, user_id, notification_id)
                .await?;
            notifications::Entity::delete_by_id(model.id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Send a system notification to every active user.
    ///
    /// Authorization: admin only.
    pub async fn broadcast(
        &self,
        admin_id: Uuid,
        title: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<u64> {
        let title = normalize_required_text(title, "title")?;
        let message = normalize_required_text(message, "message")?;
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            let sent = self
                .push_notification_to_all(&db_tx, NotificationKind::System, &title, &message, now)
                .await?;
            tracing::info!(sent, "broadcast delivered");
            Ok(sent)
        })
    }

    async fn require_own_notification(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> ResultEngine<notifications::Model> {
        notifications::Entity::find_by_id(notification_id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("notification not exists".to_string()))
    }
}
