//! Initial schema migration.
//!
//! Creates the core tables for the rental platform:
//!
//! - `users`: accounts (customers and admins) with referral code and credit
//! - `cars`: rentable inventory
//! - `offers`: promotional discount codes
//! - `bookings`: rentals with their frozen price breakdown
//! - `notifications`: in-app messages addressed to a user

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    Email,
    Password,
    FullName,
    Phone,
    Role,
    Active,
    ReferralCode,
    CreditMinor,
    CreatedAt,
}

#[derive(Iden)]
enum Cars {
    Table,
    Id,
    Make,
    Model,
    Year,
    Category,
    Seats,
    Transmission,
    Fuel,
    DailyRateMinor,
    Location,
    PlateNumber,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum Offers {
    Table,
    Id,
    Code,
    Title,
    Description,
    DiscountKind,
    DiscountValue,
    MaxDiscountMinor,
    MinSubtotalMinor,
    ValidFrom,
    ValidUntil,
    UsageLimit,
    UsedCount,
    PerUserLimit,
    CarCategory,
    FirstBookingOnly,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum Bookings {
    Table,
    Id,
    UserId,
    CarId,
    StartDate,
    EndDate,
    Days,
    DailyRateMinor,
    BaseMinor,
    DurationDiscountMinor,
    OfferId,
    OfferDiscountMinor,
    TaxMinor,
    TotalMinor,
    CreditAppliedMinor,
    AmountDueMinor,
    Status,
    PaymentReference,
    CancellationFeeMinor,
    RefundMinor,
    CreatedAt,
    UpdatedAt,
    CancelledAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Kind,
    Title,
    Message,
    Read,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::FullName).string())
                    .col(ColumnDef::new(Users::Phone).string())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("customer"),
                    )
                    .col(
                        ColumnDef::new(Users::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::ReferralCode).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreditMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx-users-username-unique", Users::Username),
            ("idx-users-email-unique", Users::Email),
            ("idx-users-referral_code-unique", Users::ReferralCode),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Users::Table)
                        .col(col)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        // ───────────────────────────────────────────────────────────────────
        // 2. Cars
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cars::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Cars::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Cars::Make).string().not_null())
                    .col(ColumnDef::new(Cars::Model).string().not_null())
                    .col(ColumnDef::new(Cars::Year).integer().not_null())
                    .col(ColumnDef::new(Cars::Category).string().not_null())
                    .col(ColumnDef::new(Cars::Seats).integer().not_null())
                    .col(ColumnDef::new(Cars::Transmission).string().not_null())
                    .col(ColumnDef::new(Cars::Fuel).string().not_null())
                    .col(
                        ColumnDef::new(Cars::DailyRateMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cars::Location).string().not_null())
                    .col(ColumnDef::new(Cars::PlateNumber).string().not_null())
                    .col(
                        ColumnDef::new(Cars::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Cars::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cars-plate_number-unique")
                    .table(Cars::Table)
                    .col(Cars::PlateNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Offers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Offers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Offers::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Offers::Code).string().not_null())
                    .col(ColumnDef::new(Offers::Title).string().not_null())
                    .col(ColumnDef::new(Offers::Description).string())
                    .col(ColumnDef::new(Offers::DiscountKind).string().not_null())
                    .col(
                        ColumnDef::new(Offers::DiscountValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Offers::MaxDiscountMinor).big_integer())
                    .col(ColumnDef::new(Offers::MinSubtotalMinor).big_integer())
                    .col(ColumnDef::new(Offers::ValidFrom).date().not_null())
                    .col(ColumnDef::new(Offers::ValidUntil).date().not_null())
                    .col(ColumnDef::new(Offers::UsageLimit).integer())
                    .col(
                        ColumnDef::new(Offers::UsedCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Offers::PerUserLimit)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Offers::CarCategory).string())
                    .col(
                        ColumnDef::new(Offers::FirstBookingOnly)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Offers::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Offers::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-offers-code-unique")
                    .table(Offers::Table)
                    .col(Offers::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Bookings
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).blob().not_null().primary_key())
                    .col(ColumnDef::new(Bookings::UserId).blob().not_null())
                    .col(ColumnDef::new(Bookings::CarId).blob().not_null())
                    .col(ColumnDef::new(Bookings::StartDate).date().not_null())
                    .col(ColumnDef::new(Bookings::EndDate).date().not_null())
                    .col(ColumnDef::new(Bookings::Days).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::DailyRateMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::BaseMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::DurationDiscountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::OfferId).blob())
                    .col(
                        ColumnDef::new(Bookings::OfferDiscountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::TaxMinor).big_integer().not_null())
                    .col(ColumnDef::new(Bookings::TotalMinor).big_integer().not_null())
                    .col(
                        ColumnDef::new(Bookings::CreditAppliedMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::AmountDueMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Bookings::Status).string().not_null())
                    .col(ColumnDef::new(Bookings::PaymentReference).string())
                    .col(
                        ColumnDef::new(Bookings::CancellationFeeMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::RefundMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::UpdatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::CancelledAt).timestamp())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-user_id")
                            .from(Bookings::Table, Bookings::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-car_id")
                            .from(Bookings::Table, Bookings::CarId)
                            .to(Cars::Table, Cars::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-bookings-offer_id")
                            .from(Bookings::Table, Bookings::OfferId)
                            .to(Offers::Table, Offers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-car_id-start_date")
                    .table(Bookings::Table)
                    .col(Bookings::CarId)
                    .col(Bookings::StartDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-bookings-user_id")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Notifications
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .blob()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).blob().not_null())
                    .col(ColumnDef::new(Notifications::Kind).string().not_null())
                    .col(ColumnDef::new(Notifications::Title).string().not_null())
                    .col(ColumnDef::new(Notifications::Message).string().not_null())
                    .col(
                        ColumnDef::new(Notifications::Read)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-notifications-user_id")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-notifications-user_id-created_at")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Offers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cars::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
