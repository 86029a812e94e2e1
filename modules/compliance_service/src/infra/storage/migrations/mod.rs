//! Database migrations for compliance service

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_documents::Migration),
            Box::new(m20250301_000002_create_match_records::Migration),
            Box::new(m20250301_000003_create_party_snapshots::Migration),
            Box::new(m20250301_000004_create_users::Migration),
        ]
    }
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
    Name,
    DocumentType,
    FileType,
    StorageKey,
    SizeBytes,
    CreatedBy,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WatchlistReports {
    Table,
    Id,
    DocumentId,
    Status,
    StatusDetail,
    RowCount,
    UpdatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum WatchlistEntries {
    Table,
    Id,
    DocumentId,
    UploadedBy,
    RowNumber,
    Code,
    PartyKind,
    FullName,
    FirstName,
    LastName,
    Aliases,
    Description,
    DescriptionSegments,
    NationalId,
    PassportNumber,
    BirthPlace,
    BirthDate,
    Nationality,
    Address,
    AddressFragments,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    IsActive,
    CreatedAt,
}

fn timestamp<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

mod m20250301_000001_create_documents {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_documents"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Documents::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Documents::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(Documents::Name).string_len(255).not_null())
                        .col(ColumnDef::new(Documents::DocumentType).string_len(100).not_null())
                        .col(ColumnDef::new(Documents::FileType).string_len(10).not_null())
                        .col(ColumnDef::new(Documents::StorageKey).string().not_null())
                        .col(ColumnDef::new(Documents::SizeBytes).big_integer().not_null())
                        .col(ColumnDef::new(Documents::CreatedBy).uuid())
                        .col(ColumnDef::new(Documents::UpdatedBy).uuid())
                        .col(timestamp(Documents::CreatedAt))
                        .col(timestamp(Documents::UpdatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WatchlistReports::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WatchlistReports::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WatchlistReports::DocumentId)
                                .uuid()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(WatchlistReports::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(WatchlistReports::StatusDetail)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(WatchlistReports::RowCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(WatchlistReports::UpdatedBy).uuid())
                        .col(timestamp(WatchlistReports::CreatedAt))
                        .col(timestamp(WatchlistReports::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_watchlist_reports_document")
                                .from(WatchlistReports::Table, WatchlistReports::DocumentId)
                                .to(Documents::Table, Documents::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(WatchlistEntries::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WatchlistEntries::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(WatchlistEntries::DocumentId).uuid().not_null())
                        .col(ColumnDef::new(WatchlistEntries::UploadedBy).uuid())
                        .col(ColumnDef::new(WatchlistEntries::RowNumber).integer().not_null())
                        .col(ColumnDef::new(WatchlistEntries::Code).string().not_null())
                        .col(ColumnDef::new(WatchlistEntries::PartyKind).string_len(20).not_null())
                        .col(ColumnDef::new(WatchlistEntries::FullName).text().not_null())
                        .col(ColumnDef::new(WatchlistEntries::FirstName).string().not_null())
                        .col(ColumnDef::new(WatchlistEntries::LastName).text().not_null())
                        .col(ColumnDef::new(WatchlistEntries::Aliases).json().not_null())
                        .col(ColumnDef::new(WatchlistEntries::Description).text().not_null())
                        .col(
                            ColumnDef::new(WatchlistEntries::DescriptionSegments)
                                .json()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WatchlistEntries::NationalId).string_len(16))
                        .col(ColumnDef::new(WatchlistEntries::PassportNumber).string_len(20))
                        .col(ColumnDef::new(WatchlistEntries::BirthPlace).string())
                        .col(ColumnDef::new(WatchlistEntries::BirthDate).string_len(10))
                        .col(ColumnDef::new(WatchlistEntries::Nationality).string())
                        .col(ColumnDef::new(WatchlistEntries::Address).text())
                        .col(
                            ColumnDef::new(WatchlistEntries::AddressFragments)
                                .json()
                                .not_null(),
                        )
                        .col(timestamp(WatchlistEntries::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_watchlist_entries_document")
                                .from(WatchlistEntries::Table, WatchlistEntries::DocumentId)
                                .to(Documents::Table, Documents::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_watchlist_entries_document_row")
                        .table(WatchlistEntries::Table)
                        .col(WatchlistEntries::DocumentId)
                        .col(WatchlistEntries::RowNumber)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WatchlistEntries::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(WatchlistReports::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Documents::Table).to_owned())
                .await
        }
    }
}

mod m20250301_000002_create_match_records {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_match_records"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MatchRecords::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(MatchRecords::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(MatchRecords::ReportId).uuid().not_null())
                        .col(ColumnDef::new(MatchRecords::PartyType).string_len(20).not_null())
                        .col(ColumnDef::new(MatchRecords::ExternalPartyId).string().not_null())
                        .col(ColumnDef::new(MatchRecords::WatchlistEntryId).uuid())
                        .col(ColumnDef::new(MatchRecords::MatchedCode).string().not_null())
                        .col(ColumnDef::new(MatchRecords::SimilarityScore).double().not_null())
                        .col(timestamp(MatchRecords::CreatedAt))
                        .col(timestamp(MatchRecords::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_match_records_report")
                                .from(MatchRecords::Table, MatchRecords::ReportId)
                                .to(WatchlistReports::Table, WatchlistReports::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_match_records_entry")
                                .from(MatchRecords::Table, MatchRecords::WatchlistEntryId)
                                .to(WatchlistEntries::Table, WatchlistEntries::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("uq_match_records_natural_key")
                        .table(MatchRecords::Table)
                        .col(MatchRecords::ReportId)
                        .col(MatchRecords::PartyType)
                        .col(MatchRecords::ExternalPartyId)
                        .col(MatchRecords::MatchedCode)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MatchRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum MatchRecords {
        Table,
        Id,
        ReportId,
        PartyType,
        ExternalPartyId,
        WatchlistEntryId,
        MatchedCode,
        SimilarityScore,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000003_create_party_snapshots {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_party_snapshots"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExternalPartySnapshots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExternalPartySnapshots::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ExternalPartySnapshots::PartyType)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExternalPartySnapshots::ExternalPartyId)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ExternalPartySnapshots::Name).text().not_null())
                        .col(ColumnDef::new(ExternalPartySnapshots::NationalId).string())
                        .col(ColumnDef::new(ExternalPartySnapshots::PassportNumber).string())
                        .col(ColumnDef::new(ExternalPartySnapshots::BirthDate).string_len(10))
                        .col(ColumnDef::new(ExternalPartySnapshots::Nationality).string())
                        .col(ColumnDef::new(ExternalPartySnapshots::Email).string())
                        .col(timestamp(ExternalPartySnapshots::SyncedAt))
                        .to_owned(),
                )
                .await?;

            // target of the snapshot upsert's ON CONFLICT clause
            manager
                .create_index(
                    Index::create()
                        .name("uq_external_party_snapshots_key")
                        .table(ExternalPartySnapshots::Table)
                        .col(ExternalPartySnapshots::PartyType)
                        .col(ExternalPartySnapshots::ExternalPartyId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ExternalPartySnapshots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ExternalPartySnapshots {
        Table,
        Id,
        PartyType,
        ExternalPartyId,
        Name,
        NationalId,
        PassportNumber,
        BirthDate,
        Nationality,
        Email,
        SyncedAt,
    }
}

mod m20250301_000004_create_users {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_users"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                        .col(
                            ColumnDef::new(Users::Username)
                                .string_len(150)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(timestamp(Users::CreatedAt))
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UserProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserProfiles::UserId)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(UserProfiles::FullName).string().not_null())
                        .col(ColumnDef::new(UserProfiles::Phone).string_len(32))
                        .col(
                            ColumnDef::new(UserProfiles::EmailVerified)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(timestamp(UserProfiles::CreatedAt))
                        .col(timestamp(UserProfiles::UpdatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_user_profiles_user")
                                .from(UserProfiles::Table, UserProfiles::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OtpCodes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(OtpCodes::Id).uuid().not_null().primary_key())
                        .col(ColumnDef::new(OtpCodes::UserId).uuid().not_null())
                        .col(ColumnDef::new(OtpCodes::CodeHash).string_len(64).not_null())
                        .col(
                            ColumnDef::new(OtpCodes::ExpiresAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OtpCodes::ConsumedAt).timestamp_with_time_zone())
                        .col(timestamp(OtpCodes::CreatedAt))
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_otp_codes_user")
                                .from(OtpCodes::Table, OtpCodes::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_otp_codes_user")
                        .table(OtpCodes::Table)
                        .col(OtpCodes::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OtpCodes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum UserProfiles {
        Table,
        UserId,
        FullName,
        Phone,
        EmailVerified,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OtpCodes {
        Table,
        Id,
        UserId,
        CodeHash,
        ExpiresAt,
        ConsumedAt,
        CreatedAt,
    }
}
