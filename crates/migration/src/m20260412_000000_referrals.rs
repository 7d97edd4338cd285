//! Referral tracking.
//!
//! A referral links the user who shared a code (`referrer_id`) with the user
//! who registered with it (`referee_id`). Each referee can be referred once.

use sea_orm_migration::prelude::*;

use crate::m20260301_000000_init::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Referrals {
    Table,
    Id,
    ReferrerId,
    RefereeId,
    Code,
    Status,
    RewardMinor,
    CreatedAt,
    RewardedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Referrals::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Referrals::ReferrerId).blob().not_null())
                    .col(ColumnDef::new(Referrals::RefereeId).blob().not_null())
                    .col(ColumnDef::new(Referrals::Code).string().not_null())
                    .col(
                        ColumnDef::new(Referrals::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Referrals::RewardMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Referrals::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Referrals::RewardedAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-referrals-referrer_id")
                            .from(Referrals::Table, Referrals::ReferrerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-referrals-referee_id")
                            .from(Referrals::Table, Referrals::RefereeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-referrals-referee_id-unique")
                    .table(Referrals::Table)
                    .col(Referrals::RefereeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-referrals-referrer_id")
                    .table(Referrals::Table)
                    .col(Referrals::ReferrerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Referrals::Table).to_owned())
            .await?;
        Ok(())
    }
}
