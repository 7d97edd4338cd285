use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    AccountUpdate, EngineError, NewUser, NotificationKind, ProfileUpdate, ReferralStatus,
    ResultEngine, Role, User, referrals,
    users::{self, hash_password, verify_password},
    util::{
        generate_code, normalize_code, normalize_email, normalize_optional_text,
        normalize_username, validate_password,
    },
};

use super::{Engine, with_tx};

impl Engine {
    /// Create a customer account.
    ///
    /// When `referral_code` is present, a pending referral is recorded for the
    /// owner of that code.
    pub async fn register(&self, new_user: NewUser, now: DateTime<Utc>) -> ResultEngine<User> {
        let username = normalize_username(&new_user.username)?;
        let email = normalize_email(&new_user.email)?;
        validate_password(&new_user.password)?;
        let referral_code = new_user
            .referral_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(normalize_code)
            .transpose()?;

        with_tx!(self, |db_tx| {
            self.ensure_unique_identity(&db_tx, &username, &email, None)
                .await?;

            let referrer = match &referral_code {
                Some(code) => {
                    let referrer = users::Entity::find()
                        .filter(users::Column::ReferralCode.eq(code.as_str()))
                        .filter(users::Column::Active.eq(true))
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| {
                            EngineError::InvalidInput(format!("unknown referral code: {code}"))
                        })?;
                    Some(referrer)
                }
                None => None,
            };

            let user = self
                .insert_user(
                    &db_tx,
                    username,
                    email,
                    &new_user.password,
                    normalize_optional_text(new_user.full_name.as_deref()),
                    normalize_optional_text(new_user.phone.as_deref()),
                    Role::Customer,
                    now,
                )
                .await?;

            if let (Some(referrer), Some(code)) = (referrer, referral_code) {
                referrals::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    referrer_id: ActiveValue::Set(referrer.id),
                    referee_id: ActiveValue::Set(user.id),
                    code: ActiveValue::Set(code),
                    status: ActiveValue::Set(ReferralStatus::Pending.as_str().to_string()),
                    reward_minor: ActiveValue::Set(0),
                    created_at: ActiveValue::Set(now),
                    rewarded_at: ActiveValue::Set(None),
                }
                .insert(&db_tx)
                .await?;
                tracing::info!(referrer = %referrer.id, referee = %user.id, "referral recorded");
            }

            self.push_notification(
                &db_tx,
                user.id,
                NotificationKind::Welcome,
                "Welcome aboard",
                format!(
                    "Hi {}, your account is ready. Share your code {} to earn rental credit.",
                    user.username, user.referral_code
                ),
                now,
            )
            .await?;

            tracing::info!(user = %user.id, username = %user.username, "user registered");
            Ok(user)
        })
    }

    /// Create an admin account. Used to bootstrap a deployment.
    pub async fn create_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<User> {
        let username = normalize_username(username)?;
        let email = normalize_email(email)?;
        validate_password(password)?;

        with_tx!(self, |db_tx| {
            self.ensure_unique_identity(&db_tx, &username, &email, None)
                .await?;
            let user = self
                .insert_user(&db_tx, username, email, password, None, None, Role::Admin, now)
                .await?;
            tracing::info!(user = %user.id, "admin created");
            Ok(user)
        })
    }

    /// Check credentials. Every failure is reported the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let denied = || EngineError::Forbidden("invalid credentials".to_string());
        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(Expr::cust("LOWER(username)").eq(username.trim().to_lowercase()))
                .one(&db_tx)
                .await?
                .ok_or_else(denied)?;

            if !model.active || !verify_password(&model.password, password) {
                tracing::debug!(username, "authentication rejected");
                return Err(denied());
            }
            User::try_from(model)
        })
    }

    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| self.require_user(&db_tx, user_id).await)
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> ResultEngine<User> {
        let email = update.email.as_deref().map(normalize_email).transpose()?;
        with_tx!(self, |db_tx| {
            let user = self.require_active_user(&db_tx, user_id).await?;

            if let Some(email) = &email
                && *email != user.email
            {
                self.ensure_unique_identity(&db_tx, "", email, Some(user_id))
                    .await?;
            }

            let mut active = users::ActiveModel {
                id: ActiveValue::Set(user_id),
                ..Default::default()
            };
            if let Some(email) = email {
                active.email = ActiveValue::Set(email);
            }
            if let Some(full_name) = update.full_name.as_deref() {
                active.full_name = ActiveValue::Set(normalize_optional_text(Some(full_name)));
            }
            if let Some(phone) = update.phone.as_deref() {
                active.phone = ActiveValue::Set(normalize_optional_text(Some(phone)));
            }
            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> ResultEngine<()> {
        validate_password(new_password)?;
        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            if !verify_password(&model.password, old_password) {
                return Err(EngineError::Forbidden("wrong password".to_string()));
            }

            let active = users::ActiveModel {
                id: ActiveValue::Set(user_id),
                password: ActiveValue::Set(hash_password(new_password)),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Every account, oldest first.
    ///
    /// Authorization: admin only.
    pub async fn list_users(&self, admin_id: Uuid) -> ResultEngine<Vec<User>> {
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            users::Entity::find()
                .order_by_asc(users::Column::CreatedAt)
                .order_by_asc(users::Column::Username)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Authorization: admin only. Admins cannot change their own role.
    pub async fn set_user_role(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> ResultEngine<User> {
        let change = AccountUpdate {
            role: Some(role),
            ..Default::default()
        };
        self.update_account(admin_id, user_id, change).await
    }

    /// Enable or disable an account. Disabled users cannot log in.
    ///
    /// Authorization: admin only. Admins cannot disable themselves.
    pub async fn set_user_active(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        active: bool,
    ) -> ResultEngine<User> {
        let change = AccountUpdate {
            active: Some(active),
            ..Default::default()
        };
        self.update_account(admin_id, user_id, change).await
    }

    /// Apply a role and/or status change in one transaction.
    ///
    /// Authorization: admin only. Admins cannot change their own account.
    pub async fn update_account(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        change: AccountUpdate,
    ) -> ResultEngine<User> {
        if change.role.is_none() && change.active.is_none() {
            return Err(EngineError::InvalidInput("nothing to update".to_string()));
        }
        with_tx!(self, |db_tx| {
            self.require_admin(&db_tx, admin_id).await?;
            if admin_id == user_id {
                return Err(EngineError::InvalidInput(
                    "admins cannot change their own account".to_string(),
                ));
            }
            self.require_user(&db_tx, user_id).await?;
            let mut model = users::ActiveModel {
                id: ActiveValue::Set(user_id),
                ..Default::default()
            };
            if let Some(role) = change.role {
                model.role = ActiveValue::Set(role.as_str().to_string());
            }
            if let Some(active) = change.active {
                model.active = ActiveValue::Set(active);
            }
            let model = model.update(&db_tx).await?;
            tracing::info!(
                %admin_id,
                %user_id,
                role = ?change.role.map(Role::as_str),
                active = ?change.active,
                "account updated"
            );
            User::try_from(model)
        })
    }

    /// Reject a username or email already taken by another account.
    ///
    /// An empty `username` skips the username check.
    async fn ensure_unique_identity(
        &self,
        db: &DatabaseTransaction,
        username: &str,
        email: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        if !username.is_empty() {
            let mut query = users::Entity::find()
                .filter(Expr::cust("LOWER(username)").eq(username.to_lowercase()));
            if let Some(id) = except {
                query = query.filter(users::Column::Id.ne(id));
            }
            if query.one(db).await?.is_some() {
                return Err(EngineError::ExistingKey(username.to_string()));
            }
        }

        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(users::Column::Id.ne(id));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(email.to_string()));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_user(
        &self,
        db: &DatabaseTransaction,
        username: String,
        email: String,
        password: &str,
        full_name: Option<String>,
        phone: Option<String>,
        role: Role,
        now: DateTime<Utc>,
    ) -> ResultEngine<User> {
        let referral_code = self.unused_referral_code(db).await?;
        let model = users::ActiveModel {
            id: ActiveValue::Set(Uuid::new_v4()),
            username: ActiveValue::Set(username),
            email: ActiveValue::Set(email),
            password: ActiveValue::Set(hash_password(password)),
            full_name: ActiveValue::Set(full_name),
            phone: ActiveValue::Set(phone),
            role: ActiveValue::Set(role.as_str().to_string()),
            active: ActiveValue::Set(true),
            referral_code: ActiveValue::Set(referral_code),
            credit_minor: ActiveValue::Set(0),
            created_at: ActiveValue::Set(now),
        }
        .insert(db)
        .await?;
        User::try_from(model)
    }

    async fn unused_referral_code(&self, db: &DatabaseTransaction) -> ResultEngine<String> {
        loop {
            let code = generate_code();
            let taken = users::Entity::find()
                .filter(users::Column::ReferralCode.eq(code.as_str()))
                .one(db)
                .await?
                .is_some();
            if !taken {
                return Ok(code);
            }
        }
    }
}
