//! SeaORM entities for database tables

/// Uploaded documents
pub mod document {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "documents")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub name: String,
        /// Type tag, e.g. "DTTOT Document"
        pub document_type: String,
        /// `csv` or `xlsx`
        pub file_type: String,
        pub storage_key: String,
        pub size_bytes: i64,
        pub created_by: Option<Uuid>,
        pub updated_by: Option<Uuid>,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_one = "super::watchlist_report::Entity")]
        WatchlistReport,
        #[sea_orm(has_many = "super::watchlist_entry::Entity")]
        WatchlistEntry,
    }

    impl Related<super::watchlist_report::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::WatchlistReport.def()
        }
    }

    impl Related<super::watchlist_entry::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::WatchlistEntry.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// One report per document
pub mod watchlist_report {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "watchlist_reports")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub document_id: Uuid,
        pub status: String,
        pub status_detail: String,
        pub row_count: i32,
        pub updated_by: Option<Uuid>,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::document::Entity",
            from = "Column::DocumentId",
            to = "super::document::Column::Id",
            on_delete = "Cascade"
        )]
        Document,
        #[sea_orm(has_many = "super::match_record::Entity")]
        MatchRecord,
    }

    impl Related<super::document::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Document.def()
        }
    }

    impl Related<super::match_record::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::MatchRecord.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Normalized DTTOT rows
pub mod watchlist_entry {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "watchlist_entries")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub document_id: Uuid,
        pub uploaded_by: Option<Uuid>,
        pub row_number: i32,
        pub code: String,
        pub party_kind: String,
        pub full_name: String,
        pub first_name: String,
        pub last_name: String,
        /// JSON array of strings
        pub aliases: Json,
        pub description: String,
        /// JSON array of strings
        pub description_segments: Json,
        pub national_id: Option<String>,
        pub passport_number: Option<String>,
        pub birth_place: Option<String>,
        pub birth_date: Option<String>,
        pub nationality: Option<String>,
        pub address: Option<String>,
        /// JSON array of strings
        pub address_fragments: Json,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::document::Entity",
            from = "Column::DocumentId",
            to = "super::document::Column::Id",
            on_delete = "Cascade"
        )]
        Document,
    }

    impl Related<super::document::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Document.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Match records of all party types, discriminated by `party_type`
pub mod match_record {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "match_records")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub report_id: Uuid,
        pub party_type: String,
        pub external_party_id: String,
        pub watchlist_entry_id: Option<Uuid>,
        pub matched_code: String,
        pub similarity_score: f64,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::watchlist_report::Entity",
            from = "Column::ReportId",
            to = "super::watchlist_report::Column::Id",
            on_delete = "Cascade"
        )]
        WatchlistReport,
    }

    impl Related<super::watchlist_report::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::WatchlistReport.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Local copies of external parties
pub mod party_snapshot {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "external_party_snapshots")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub party_type: String,
        pub external_party_id: String,
        pub name: String,
        pub national_id: Option<String>,
        pub passport_number: Option<String>,
        pub birth_date: Option<String>,
        pub nationality: Option<String>,
        pub email: Option<String>,
        pub synced_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub username: String,
        #[sea_orm(unique)]
        pub email: String,
        pub password_hash: String,
        pub is_active: bool,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_one = "super::user_profile::Entity")]
        UserProfile,
    }

    impl Related<super::user_profile::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::UserProfile.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod user_profile {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "user_profiles")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub user_id: Uuid,
        pub full_name: String,
        pub phone: Option<String>,
        pub email_verified: bool,
        pub created_at: DateTimeUtc,
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id",
            on_delete = "Cascade"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod otp_code {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "otp_codes")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        /// Hex SHA-256 of user id and code
        pub code_hash: String,
        pub expires_at: DateTimeUtc,
        pub consumed_at: Option<DateTimeUtc>,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::user::Entity",
            from = "Column::UserId",
            to = "super::user::Column::Id",
            on_delete = "Cascade"
        )]
        User,
    }

    impl Related<super::user::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
