use sea_orm::DatabaseConnection;

use crate::{CancellationPolicy, PricingPolicy, ResultEngine};

mod access;
mod bookings;
mod cars;
mod notifications;
mod offers;
mod referrals;
mod reports;
mod users;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Default store credit granted to a referrer, in minor units.
pub const DEFAULT_REFERRAL_REWARD_MINOR: i64 = 50_000;

/// Entry point of every business operation.
///
/// The engine is stateless apart from its policies: every call reads and
/// writes the database inside its own transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    pricing: PricingPolicy,
    cancellation: CancellationPolicy,
    referral_reward_minor: i64,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn cancellation_policy(&self) -> &CancellationPolicy {
        &self.cancellation
    }

    pub fn referral_reward_minor(&self) -> i64 {
        self.referral_reward_minor
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    pricing: PricingPolicy,
    cancellation: CancellationPolicy,
    referral_reward_minor: i64,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            pricing: PricingPolicy::default(),
            cancellation: CancellationPolicy::default(),
            referral_reward_minor: DEFAULT_REFERRAL_REWARD_MINOR,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn pricing(mut self, pricing: PricingPolicy) -> EngineBuilder {
        self.pricing = pricing;
        self
    }

    pub fn cancellation(mut self, cancellation: CancellationPolicy) -> EngineBuilder {
        self.cancellation = cancellation;
        self
    }

    pub fn referral_reward(mut self, reward_minor: i64) -> EngineBuilder {
        self.referral_reward_minor = reward_minor;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.referral_reward_minor < 0 {
            return Err(crate::EngineError::InvalidInput(
                "referral reward must be >= 0".to_string(),
            ));
        }
        self.pricing.validate()?;
        self.cancellation.validate()?;
        Ok(Engine {
            database: self.database,
            pricing: self.pricing,
            cancellation: self.cancellation,
            referral_reward_minor: self.referral_reward_minor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    async fn rejected(builder: EngineBuilder) -> String {
        match builder.build().await {
            Err(EngineError::InvalidInput(msg)) => msg,
            Err(err) => panic!("expected InvalidInput, got {err:?}"),
            Ok(_) => panic!("expected InvalidInput, the engine was built"),
        }
    }

    #[tokio::test]
    async fn discount_rates_above_full_price_are_rejected() {
        let msg = rejected(Engine::builder().pricing(PricingPolicy {
            monthly_discount_bps: 12_000,
            ..PricingPolicy::default()
        }))
        .await;
        assert!(msg.contains("monthly_discount_bps"));

        let msg = rejected(Engine::builder().pricing(PricingPolicy {
            weekly_discount_bps: 10_001,
            ..PricingPolicy::default()
        }))
        .await;
        assert!(msg.contains("weekly_discount_bps"));
    }

    #[tokio::test]
    async fn cancellation_fees_and_windows_are_checked() {
        let msg = rejected(Engine::builder().cancellation(CancellationPolicy {
            last_minute_fee_bps: 15_000,
            ..CancellationPolicy::default()
        }))
        .await;
        assert!(msg.contains("last_minute_fee_bps"));

        rejected(Engine::builder().cancellation(CancellationPolicy {
            late_hours: -1,
            ..CancellationPolicy::default()
        }))
        .await;
        rejected(Engine::builder().cancellation(CancellationPolicy {
            late_hours: 72,
            ..CancellationPolicy::default()
        }))
        .await;
        rejected(Engine::builder().referral_reward(-1)).await;
    }

    #[tokio::test]
    async fn full_rates_are_accepted() {
        let built = Engine::builder()
            .pricing(PricingPolicy {
                monthly_discount_bps: 10_000,
                ..PricingPolicy::default()
            })
            .cancellation(CancellationPolicy {
                late_fee_bps: 10_000,
                last_minute_fee_bps: 10_000,
                ..CancellationPolicy::default()
            })
            .build()
            .await;
        assert!(built.is_ok());
    }
}
