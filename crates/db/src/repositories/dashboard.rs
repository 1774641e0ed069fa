//! Dashboard repository for staff metrics and the public home page.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};
use uuid::Uuid;

use libris_core::dashboard::{
    BookBorrowCount, DashboardSummary, HOME_NEWEST_BOOKS, HOME_TOP_RATED_BOOKS, HomePage,
    LibraryTotals, RECENT_BORROWINGS, RecentBorrowing, StudentBorrowCount, TOP_LIST_SIZE,
};
use libris_shared::types::{BookId, UserId};

use crate::entities::{
    authors, books, borrow_records, categories, sea_orm_active_enums::BorrowStatus, users,
};

use super::book::BookRepository;
use super::borrow::{BorrowError, hydrate};

/// Dashboard repository.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Catalog and student totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn totals(&self) -> Result<LibraryTotals, DbErr> {
        Ok(LibraryTotals {
            books: books::Entity::find().count(&self.db).await?,
            authors: authors::Entity::find().count(&self.db).await?,
            categories: categories::Entity::find().count(&self.db).await?,
            students: users::Entity::find()
                .filter(users::Column::IsStaff.eq(false))
                .count(&self.db)
                .await?,
        })
    }

    /// The staff dashboard as of `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn summary(&self, today: NaiveDate) -> Result<DashboardSummary, BorrowError> {
        let totals = self.totals().await?;

        let active = borrow_records::Entity::find()
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed));
        let active_borrowings = active.clone().count(&self.db).await?;
        let overdue_borrowings = active
            .filter(borrow_records::Column::DueDate.lt(today))
            .count(&self.db)
            .await?;

        let recent = borrow_records::Entity::find()
            .order_by_desc(borrow_records::Column::BorrowDate)
            .order_by_desc(borrow_records::Column::Id)
            .limit(RECENT_BORROWINGS)
            .all(&self.db)
            .await?;
        let recent_borrowings = hydrate(&self.db, recent)
            .await?
            .into_iter()
            .map(|d| RecentBorrowing {
                id: d.record.id(),
                is_overdue: d.record.is_overdue(today),
                borrow_date: d.record.borrow_date(),
                due_date: d.record.due_date(),
                status: d.record.status(),
                username: d.student_username,
                book_title: d.book_title,
            })
            .collect();

        Ok(DashboardSummary {
            totals,
            active_borrowings,
            overdue_borrowings,
            top_books: self.top_books().await?,
            top_students: self.top_students().await?,
            recent_borrowings,
        })
    }

    /// The public home page.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn home(&self) -> Result<HomePage, DbErr> {
        let books = BookRepository::new(self.db.clone());
        let totals = self.totals().await?;
        Ok(HomePage {
            newest_books: books.newest(HOME_NEWEST_BOOKS).await?,
            top_rated_books: books.top_rated(HOME_TOP_RATED_BOOKS).await?,
            total_books: totals.books,
            total_authors: totals.authors,
            total_students: totals.students,
        })
    }

    /// Ids ranked by borrow count on `column`, most borrowed first.
    async fn ranked(&self, column: borrow_records::Column) -> Result<Vec<(Uuid, u64)>, DbErr> {
        let rows: Vec<(Uuid, i64)> = borrow_records::Entity::find()
            .select_only()
            .column(column)
            .column_as(Expr::col(borrow_records::Column::Id).count(), "borrow_count")
            .group_by(column)
            .order_by_desc(Expr::col(borrow_records::Column::Id).count())
            .order_by_asc(column)
            .limit(TOP_LIST_SIZE)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, u64::try_from(count).unwrap_or_default()))
            .collect())
    }

    async fn top_books(&self) -> Result<Vec<BookBorrowCount>, DbErr> {
        let ranked = self.ranked(borrow_records::Column::BookId).await?;
        if ranked.is_empty() {
            return Ok(Vec::new());
        }
        let titles: HashMap<Uuid, String> = books::Entity::find()
            .filter(books::Column::Id.is_in(ranked.iter().map(|(id, _)| *id)))
            .select_only()
            .column(books::Column::Id)
            .column(books::Column::Title)
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();
        Ok(ranked
            .into_iter()
            .map(|(id, borrow_count)| BookBorrowCount {
                book_id: BookId::from_uuid(id),
                title: titles.get(&id).cloned().unwrap_or_default(),
                borrow_count,
            })
            .collect())
    }

    async fn top_students(&self) -> Result<Vec<StudentBorrowCount>, DbErr> {
        let ranked = self.ranked(borrow_records::Column::StudentId).await?;
        if ranked.is_empty() {
            return Ok(Vec::new());
        }
        let usernames: HashMap<Uuid, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(ranked.iter().map(|(id, _)| *id)))
            .select_only()
            .column(users::Column::Id)
            .column(users::Column::Username)
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();
        Ok(ranked
            .into_iter()
            .map(|(id, borrow_count)| StudentBorrowCount {
                student_id: UserId::from_uuid(id),
                username: usernames.get(&id).cloned().unwrap_or_default(),
                borrow_count,
            })
            .collect())
    }
}

