//! Review repository.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr, TransactionTrait,
    sea_query::Expr,
};
use thiserror::Error;
use uuid::Uuid;

use libris_core::lending::{LendingError, LendingService};
use libris_core::review::{ReviewInput, average_rating};
use libris_shared::types::{BookId, PageRequest, PageResponse, ReviewId, UserId};

use crate::entities::{books, reviews, users};

use super::borrow::review_eligibility;

/// Error types for review operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// The review gate refused the submission.
    #[error(transparent)]
    Lending(#[from] LendingError),

    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A review with the names needed to display it.
#[derive(Debug, Clone)]
pub struct ReviewDetails {
    /// Review ID.
    pub id: ReviewId,
    /// Reviewed book.
    pub book_id: BookId,
    /// Book title.
    pub book_title: String,
    /// Reviewer.
    pub student_id: UserId,
    /// Reviewer's username.
    pub student_username: String,
    /// Rating, 1 to 5.
    pub rating: i32,
    /// Comment; may be empty.
    pub comment: String,
    /// Submission time.
    pub created_at: DateTime<FixedOffset>,
}

/// Average rating per book for the given books; unreviewed books are absent.
pub(crate) async fn rating_averages<C: ConnectionTrait>(
    db: &C,
    book_ids: &[Uuid],
) -> Result<HashMap<Uuid, Decimal>, DbErr> {
    if book_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64, i64)> = reviews::Entity::find()
        .select_only()
        .column(reviews::Column::BookId)
        .column_as(Expr::col(reviews::Column::Rating).sum(), "rating_sum")
        .column_as(Expr::col(reviews::Column::Id).count(), "rating_count")
        .filter(reviews::Column::BookId.is_in(book_ids.iter().copied()))
        .group_by(reviews::Column::BookId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(book_id, sum, count)| average_rating(sum, count).map(|avg| (book_id, avg)))
        .collect())
}

/// Review repository.
#[derive(Debug, Clone)]
pub struct ReviewRepository {
    db: DatabaseConnection,
    lending: LendingService,
}

impl ReviewRepository {
    /// Creates a new review repository applying `lending`'s review gate.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lending: LendingService) -> Self {
        Self { db, lending }
    }

    /// Submits a review.
    ///
    /// Allowed only after the student returned a borrow of the book, and only
    /// once per (student, book). A duplicate that races past the check is
    /// caught by the unique index and reported the same way.
    ///
    /// # Errors
    ///
    /// Returns `BookNotFound`, `NoReturnedBorrowFound`, `AlreadyReviewed`, or a
    /// database error.
    pub async fn submit(
        &self,
        student_id: UserId,
        book_id: BookId,
        input: ReviewInput,
    ) -> Result<reviews::Model, ReviewError> {
        let txn = self.db.begin().await?;

        books::Entity::find_by_id(book_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(ReviewError::BookNotFound(book_id))?;

        let eligibility = review_eligibility(&txn, &self.lending, student_id, book_id).await?;
        self.lending
            .check_review(eligibility.has_returned, eligibility.already_reviewed)
            .inspect_err(|e| {
                tracing::info!(
                    student_id = %student_id,
                    book_id = %book_id,
                    reason = e.code(),
                    "Review refused"
                );
            })?;

        let review = reviews::ActiveModel {
            id: Set(ReviewId::new().into_inner()),
            student_id: Set(student_id.into_inner()),
            book_id: Set(book_id.into_inner()),
            rating: Set(input.rating.value()),
            comment: Set(input.comment),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ReviewError::Lending(LendingError::AlreadyReviewed)
            }
            _ => ReviewError::Database(e),
        })?;

        txn.commit().await?;

        tracing::info!(
            student_id = %student_id,
            book_id = %book_id,
            rating = review.rating,
            "Review submitted"
        );

        Ok(review)
    }

    /// The student's review of a book, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for(
        &self,
        student_id: UserId,
        book_id: BookId,
    ) -> Result<Option<reviews::Model>, DbErr> {
        reviews::Entity::find()
            .filter(reviews::Column::StudentId.eq(student_id.into_inner()))
            .filter(reviews::Column::BookId.eq(book_id.into_inner()))
            .one(&self.db)
            .await
    }

    /// Reviews of a book, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_book(&self, book_id: BookId) -> Result<Vec<ReviewDetails>, DbErr> {
        let models = Self::newest_first(
            reviews::Entity::find().filter(reviews::Column::BookId.eq(book_id.into_inner())),
        )
        .all(&self.db)
        .await?;
        self.details(models).await
    }

    /// All reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn feed(&self, page: PageRequest) -> Result<PageResponse<ReviewDetails>, DbErr> {
        let total = reviews::Entity::find().count(&self.db).await?;
        let models = Self::newest_first(reviews::Entity::find())
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok(PageResponse::new(self.details(models).await?, page, total))
    }

    fn newest_first(query: Select<reviews::Entity>) -> Select<reviews::Entity> {
        query
            .order_by_desc(reviews::Column::CreatedAt)
            .order_by_desc(reviews::Column::Id)
    }

    async fn details(&self, models: Vec<reviews::Model>) -> Result<Vec<ReviewDetails>, DbErr> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let book_ids: Vec<Uuid> = models.iter().map(|m| m.book_id).collect();
        let student_ids: Vec<Uuid> = models.iter().map(|m| m.student_id).collect();

        let titles: HashMap<Uuid, String> = books::Entity::find()
            .filter(books::Column::Id.is_in(book_ids))
            .select_only()
            .column(books::Column::Id)
            .column(books::Column::Title)
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();
        let usernames: HashMap<Uuid, String> = users::Entity::find()
            .filter(users::Column::Id.is_in(student_ids))
            .select_only()
            .column(users::Column::Id)
            .column(users::Column::Username)
            .into_tuple::<(Uuid, String)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        Ok(models
            .into_iter()
            .map(|m| ReviewDetails {
                id: ReviewId::from_uuid(m.id),
                book_id: BookId::from_uuid(m.book_id),
                book_title: titles.get(&m.book_id).cloned().unwrap_or_default(),
                student_id: UserId::from_uuid(m.student_id),
                student_username: usernames.get(&m.student_id).cloned().unwrap_or_default(),
                rating: m.rating,
                comment: m.comment,
                created_at: m.created_at,
            })
            .collect())
    }
}
