//! Initial schema: accounts, catalog, borrow records and reviews.
//!
//! Built with the schema builder so the same migration runs on PostgreSQL
//! and SQLite. Copy-count bounds and rating bounds are table checks.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== Accounts ==========
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
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(254)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string_len(50).not_null())
                    .col(ColumnDef::new(Users::LastName).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Users::IsStaff)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StudentProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentProfiles::UserId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentProfiles::Phone)
                            .string_len(20)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(StudentProfiles::JoinedDate).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_profiles_user")
                            .from(StudentProfiles::Table, StudentProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ========== Catalog ==========
        manager
            .create_table(
                Table::create()
                    .table(Authors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Authors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Authors::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Authors::Bio).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Authors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Categories::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Categories::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Books::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Books::Title).string_len(300).not_null())
                    .col(ColumnDef::new(Books::AuthorId).uuid().null())
                    .col(ColumnDef::new(Books::CategoryId).uuid().null())
                    .col(ColumnDef::new(Books::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Books::Isbn).string_len(20).null().unique_key())
                    .col(ColumnDef::new(Books::Pages).integer().null())
                    .col(
                        ColumnDef::new(Books::Language)
                            .string_len(50)
                            .not_null()
                            .default("English"),
                    )
                    .col(
                        ColumnDef::new(Books::TotalCopies)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Books::AvailableCopies)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Books::PublishedDate).date().null())
                    .col(
                        ColumnDef::new(Books::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_books_author")
                            .from(Books::Table, Books::AuthorId)
                            .to(Authors::Table, Authors::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_books_category")
                            .from(Books::Table, Books::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .check(Expr::col(Books::AvailableCopies).gte(0))
                    .check(Expr::col(Books::AvailableCopies).lte(Expr::col(Books::TotalCopies)))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_books_created_at")
                    .table(Books::Table)
                    .col(Books::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ========== Lending ==========
        manager
            .create_table(
                Table::create()
                    .table(BorrowRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BorrowRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BorrowRecords::StudentId).uuid().not_null())
                    .col(ColumnDef::new(BorrowRecords::BookId).uuid().not_null())
                    .col(ColumnDef::new(BorrowRecords::BorrowDate).date().not_null())
                    .col(ColumnDef::new(BorrowRecords::DueDate).date().not_null())
                    .col(ColumnDef::new(BorrowRecords::ReturnDate).date().null())
                    .col(
                        ColumnDef::new(BorrowRecords::Status)
                            .string_len(10)
                            .not_null()
                            .default("borrowed"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_borrow_records_student")
                            .from(BorrowRecords::Table, BorrowRecords::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_borrow_records_book")
                            .from(BorrowRecords::Table, BorrowRecords::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(Expr::col(BorrowRecords::Status).is_in(["borrowed", "returned"]))
                    .check(
                        Expr::col(BorrowRecords::DueDate)
                            .gte(Expr::col(BorrowRecords::BorrowDate)),
                    )
                    .to_owned(),
            )
            .await?;

        // No uniqueness on (student_id, book_id): history keeps repeat borrows.
        manager
            .create_index(
                Index::create()
                    .name("idx_borrow_records_student_status")
                    .table(BorrowRecords::Table)
                    .col(BorrowRecords::StudentId)
                    .col(BorrowRecords::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_borrow_records_book_status")
                    .table(BorrowRecords::Table)
                    .col(BorrowRecords::BookId)
                    .col(BorrowRecords::Status)
                    .to_owned(),
            )
            .await?;

        // ========== Reviews ==========
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reviews::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reviews::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::BookId).uuid().not_null())
                    .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                    .col(ColumnDef::new(Reviews::Comment).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Reviews::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_student")
                            .from(Reviews::Table, Reviews::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_book")
                            .from(Reviews::Table, Reviews::BookId)
                            .to(Books::Table, Books::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .check(Expr::col(Reviews::Rating).between(1, 5))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_reviews_student_book")
                    .table(Reviews::Table)
                    .col(Reviews::StudentId)
                    .col(Reviews::BookId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reviews::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BorrowRecords::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Books::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Authors::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudentProfiles::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    IsStaff,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudentProfiles {
    Table,
    UserId,
    Phone,
    JoinedDate,
}

#[derive(DeriveIden)]
enum Authors {
    Table,
    Id,
    Name,
    Bio,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Books {
    Table,
    Id,
    Title,
    AuthorId,
    CategoryId,
    Description,
    Isbn,
    Pages,
    Language,
    TotalCopies,
    AvailableCopies,
    PublishedDate,
    CreatedAt,
}

#[derive(DeriveIden)]
enum BorrowRecords {
    Table,
    Id,
    StudentId,
    BookId,
    BorrowDate,
    DueDate,
    ReturnDate,
    Status,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    StudentId,
    BookId,
    Rating,
    Comment,
    CreatedAt,
}
