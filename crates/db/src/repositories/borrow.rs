//! Borrow repository: the lending ledger's persistence.
//!
//! Every borrow and return changes a borrow record and the book's
//! `available_copies` together inside one database transaction. The book row
//! is locked (`SELECT ... FOR UPDATE` where the backend supports it) and the
//! counter updates carry their own guards, so a concurrent writer can never
//! push the counter out of `0..=total_copies`.

use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use libris_core::lending::{
    BorrowRecord, BorrowStatus as CoreBorrowStatus, CopyCount, LendingError, LendingService,
};
use libris_shared::types::{BookId, BorrowRecordId, PageRequest, PageResponse, UserId};

use crate::entities::{
    books, borrow_records, reviews, sea_orm_active_enums::BorrowStatus, users,
};

/// Error types for borrow operations.
#[derive(Debug, Error)]
pub enum BorrowError {
    /// A lending rule refused the operation.
    #[error(transparent)]
    Lending(#[from] LendingError),

    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// Borrowing account not found.
    #[error("Student not found: {0}")]
    StudentNotFound(UserId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Result of a successful borrow.
#[derive(Debug, Clone)]
pub struct BorrowOutcome {
    /// The new active record.
    pub record: BorrowRecord,
    /// When the book is due back.
    pub due_date: NaiveDate,
    /// Title of the borrowed book, for messaging.
    pub book_title: String,
}

/// Result of a successful return.
#[derive(Debug, Clone)]
pub struct ReturnOutcome {
    /// The closed record.
    pub record: BorrowRecord,
    /// Title of the returned book, for messaging.
    pub book_title: String,
}

/// Result of a staff bulk return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkReturnResult {
    /// Records moved from borrowed to returned.
    pub returned: u64,
    /// Records left alone: already returned or unknown.
    pub skipped: u64,
}

/// A borrow record with the names needed to display it.
#[derive(Debug, Clone)]
pub struct BorrowDetails {
    /// The record.
    pub record: BorrowRecord,
    /// Book title.
    pub book_title: String,
    /// Borrowing student's username.
    pub student_username: String,
}

/// Whether a student may review a book, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReviewEligibility {
    /// The student returned at least one borrow of the book.
    pub has_returned: bool,
    /// The student already reviewed the book.
    pub already_reviewed: bool,
    /// Both conditions allow a review.
    pub can_review: bool,
}

/// Converts a stored row into a checked ledger record.
pub(crate) fn to_record(model: &borrow_records::Model) -> Result<BorrowRecord, LendingError> {
    BorrowRecord::from_parts(
        BorrowRecordId::from_uuid(model.id),
        UserId::from_uuid(model.student_id),
        BookId::from_uuid(model.book_id),
        model.borrow_date,
        model.due_date,
        model.return_date,
        model.status.into(),
    )
}

/// Attaches book titles and usernames to borrow rows, keeping their order.
pub(crate) async fn hydrate<C: ConnectionTrait>(
    db: &C,
    models: Vec<borrow_records::Model>,
) -> Result<Vec<BorrowDetails>, BorrowError> {
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
        .all(db)
        .await?
        .into_iter()
        .collect();

    let usernames: HashMap<Uuid, String> = users::Entity::find()
        .filter(users::Column::Id.is_in(student_ids))
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Username)
        .into_tuple::<(Uuid, String)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    models
        .iter()
        .map(|model| -> Result<BorrowDetails, BorrowError> {
            Ok(BorrowDetails {
                record: to_record(model)?,
                book_title: titles.get(&model.book_id).cloned().unwrap_or_default(),
                student_username: usernames.get(&model.student_id).cloned().unwrap_or_default(),
            })
        })
        .collect()
}

fn status_filter(status: Option<CoreBorrowStatus>) -> Condition {
    match status {
        Some(status) => {
            Condition::all().add(borrow_records::Column::Status.eq(BorrowStatus::from(status)))
        }
        None => Condition::all(),
    }
}

/// Borrow repository for the lending ledger.
#[derive(Debug, Clone)]
pub struct BorrowRepository {
    db: DatabaseConnection,
    lending: LendingService,
}

impl BorrowRepository {
    /// Creates a new borrow repository applying `lending` rules.
    #[must_use]
    pub const fn new(db: DatabaseConnection, lending: LendingService) -> Self {
        Self { db, lending }
    }

    /// Lends a copy of a book to a student, due after the policy's loan period.
    ///
    /// # Errors
    ///
    /// See [`Self::borrow_book_due`].
    pub async fn borrow_book(
        &self,
        student_id: UserId,
        book_id: BookId,
        today: NaiveDate,
    ) -> Result<BorrowOutcome, BorrowError> {
        self.borrow_book_due(student_id, book_id, today, None).await
    }

    /// Lends a copy of a book to a student.
    ///
    /// Preconditions, in order: a copy is available, the student does not
    /// already hold the book, the student is below the borrow limit. The new
    /// record and the decremented counter are committed together. `due_date`
    /// overrides the loan period and may not precede `today`.
    ///
    /// The student row is locked before the book row, so concurrent borrows by
    /// one student serialize on the limit check.
    ///
    /// # Errors
    ///
    /// Returns `StudentNotFound`, `BookNotFound`, a `LendingError` refusal, or
    /// a database error. Nothing is written on failure.
    pub async fn borrow_book_due(
        &self,
        student_id: UserId,
        book_id: BookId,
        today: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Result<BorrowOutcome, BorrowError> {
        let txn = self.db.begin().await?;

        users::Entity::find_by_id(student_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(BorrowError::StudentNotFound(student_id))?;

        let book = books::Entity::find_by_id(book_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(BorrowError::BookNotFound(book_id))?;
        let copies = CopyCount::from_db(book.total_copies, book.available_copies)?;

        let held = borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(student_id.into_inner()))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed));
        let already_borrowed = held
            .clone()
            .filter(borrow_records::Column::BookId.eq(book_id.into_inner()))
            .count(&txn)
            .await?
            > 0;
        let active_count = held.count(&txn).await?;

        let (record, _) = self
            .lending
            .open_loan(
                BorrowRecordId::new(),
                student_id,
                book_id,
                copies,
                already_borrowed,
                active_count,
                today,
                due_date,
            )
            .inspect_err(|e| {
                tracing::info!(
                    student_id = %student_id,
                    book_id = %book_id,
                    reason = e.code(),
                    "Borrow refused"
                );
            })?;

        borrow_records::ActiveModel {
            id: Set(record.id().into_inner()),
            student_id: Set(student_id.into_inner()),
            book_id: Set(book_id.into_inner()),
            borrow_date: Set(record.borrow_date()),
            due_date: Set(record.due_date()),
            return_date: Set(None),
            status: Set(BorrowStatus::Borrowed),
        }
        .insert(&txn)
        .await?;

        let decremented = books::Entity::update_many()
            .col_expr(
                books::Column::AvailableCopies,
                Expr::col(books::Column::AvailableCopies).sub(1),
            )
            .filter(books::Column::Id.eq(book_id.into_inner()))
            .filter(books::Column::AvailableCopies.gt(0))
            .exec(&txn)
            .await?;
        if decremented.rows_affected != 1 {
            // Lost a race for the last copy; dropping `txn` rolls back the insert.
            return Err(LendingError::NoCopiesAvailable.into());
        }

        txn.commit().await?;

        tracing::info!(
            student_id = %student_id,
            book_id = %book_id,
            record_id = %record.id(),
            due_date = %record.due_date(),
            "Book borrowed"
        );

        Ok(BorrowOutcome {
            due_date: record.due_date(),
            record,
            book_title: book.title,
        })
    }

    /// Takes a book back.
    ///
    /// `requester` is the student returning their own borrow; `None` is the
    /// staff path and skips the ownership check. The status flip and the
    /// incremented counter are committed together.
    ///
    /// # Errors
    ///
    /// Returns `NotBorrowedOrNotOwner` when the record is unknown, already
    /// returned, or owned by someone else; `CopyCountInvariant` if the book
    /// has every copy on the shelf; or a database error.
    pub async fn return_book(
        &self,
        record_id: BorrowRecordId,
        requester: Option<UserId>,
        today: NaiveDate,
    ) -> Result<ReturnOutcome, BorrowError> {
        let txn = self.db.begin().await?;

        let model = borrow_records::Entity::find_by_id(record_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(LendingError::NotBorrowedOrNotOwner)?;
        let mut record = to_record(&model)?;

        let book = books::Entity::find_by_id(model.book_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| BorrowError::BookNotFound(record.book_id()))?;
        let copies = CopyCount::from_db(book.total_copies, book.available_copies)?;

        self.lending
            .close_loan(&mut record, copies, requester, today)
            .inspect_err(|e| {
                if e.is_user_facing() {
                    tracing::info!(record_id = %record_id, reason = e.code(), "Return refused");
                } else {
                    tracing::error!(record_id = %record_id, error = %e, "Return hit a ledger invariant");
                }
            })?;

        let flipped = borrow_records::Entity::update_many()
            .col_expr(
                borrow_records::Column::Status,
                Expr::value(BorrowStatus::Returned),
            )
            .col_expr(borrow_records::Column::ReturnDate, Expr::value(today))
            .filter(borrow_records::Column::Id.eq(record_id.into_inner()))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed))
            .exec(&txn)
            .await?;
        if flipped.rows_affected != 1 {
            return Err(LendingError::NotBorrowedOrNotOwner.into());
        }

        let incremented = books::Entity::update_many()
            .col_expr(
                books::Column::AvailableCopies,
                Expr::col(books::Column::AvailableCopies).add(1),
            )
            .filter(books::Column::Id.eq(book.id))
            .filter(
                Expr::col(books::Column::AvailableCopies)
                    .lt(Expr::col(books::Column::TotalCopies)),
            )
            .exec(&txn)
            .await?;
        if incremented.rows_affected != 1 {
            tracing::error!(record_id = %record_id, book_id = %book.id, "Return would overfill shelf");
            return Err(LendingError::CopyCountInvariant {
                total: i64::from(book.total_copies),
                available: i64::from(book.available_copies) + 1,
            }
            .into());
        }

        txn.commit().await?;

        tracing::info!(
            record_id = %record_id,
            book_id = %book.id,
            staff = requester.is_none(),
            "Book returned"
        );

        Ok(ReturnOutcome {
            record,
            book_title: book.title,
        })
    }

    /// Returns every active record among `ids` on behalf of staff.
    ///
    /// Each record goes through the same atomic path as [`Self::return_book`].
    /// Already-returned and unknown records are skipped, not failed.
    ///
    /// # Errors
    ///
    /// Returns a database error or a ledger invariant fault; records processed
    /// before it stay returned.
    pub async fn bulk_return(
        &self,
        ids: &[BorrowRecordId],
        today: NaiveDate,
    ) -> Result<BulkReturnResult, BorrowError> {
        let mut result = BulkReturnResult::default();

        for &id in ids {
            match self.return_book(id, None, today).await {
                Ok(_) => result.returned += 1,
                Err(BorrowError::Lending(e)) if e.is_user_facing() => {
                    tracing::warn!(record_id = %id, reason = e.code(), "Skipped in bulk return");
                    result.skipped += 1;
                }
                Err(BorrowError::BookNotFound(book_id)) => {
                    tracing::warn!(record_id = %id, book_id = %book_id, "Skipped in bulk return");
                    result.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            returned = result.returned,
            skipped = result.skipped,
            "Bulk return finished"
        );

        Ok(result)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Finds a borrow record by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the row is inconsistent.
    pub async fn find_by_id(&self, id: BorrowRecordId) -> Result<Option<BorrowDetails>, BorrowError> {
        let Some(model) = borrow_records::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(hydrate(&self.db, vec![model]).await?.into_iter().next())
    }

    /// A student's active borrows, soonest due first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_for_student(
        &self,
        student_id: UserId,
    ) -> Result<Vec<BorrowDetails>, BorrowError> {
        let models = borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(student_id.into_inner()))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed))
            .order_by_asc(borrow_records::Column::DueDate)
            .order_by_asc(borrow_records::Column::Id)
            .all(&self.db)
            .await?;
        hydrate(&self.db, models).await
    }

    /// The student's active borrow of a book, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_for_student_book(
        &self,
        student_id: UserId,
        book_id: BookId,
    ) -> Result<Option<BorrowDetails>, BorrowError> {
        let Some(model) = borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(student_id.into_inner()))
            .filter(borrow_records::Column::BookId.eq(book_id.into_inner()))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(hydrate(&self.db, vec![model]).await?.into_iter().next())
    }

    /// A student's borrow history, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history_for_student(
        &self,
        student_id: UserId,
        status: Option<CoreBorrowStatus>,
    ) -> Result<Vec<BorrowDetails>, BorrowError> {
        let models = borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(student_id.into_inner()))
            .filter(status_filter(status))
            .order_by_desc(borrow_records::Column::BorrowDate)
            .order_by_desc(borrow_records::Column::Id)
            .all(&self.db)
            .await?;
        hydrate(&self.db, models).await
    }

    /// All borrow records, newest first, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_all(
        &self,
        status: Option<CoreBorrowStatus>,
        page: PageRequest,
    ) -> Result<PageResponse<BorrowDetails>, BorrowError> {
        let query = borrow_records::Entity::find().filter(status_filter(status));
        let total = query.clone().count(&self.db).await?;
        let models = query
            .order_by_desc(borrow_records::Column::BorrowDate)
            .order_by_desc(borrow_records::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok(PageResponse::new(hydrate(&self.db, models).await?, page, total))
    }

    /// Number of active borrows held by a student.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_active(&self, student_id: UserId) -> Result<u64, DbErr> {
        borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(student_id.into_inner()))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed))
            .count(&self.db)
            .await
    }

    /// Review eligibility for a student and a book.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn review_eligibility(
        &self,
        student_id: UserId,
        book_id: BookId,
    ) -> Result<ReviewEligibility, DbErr> {
        review_eligibility(&self.db, &self.lending, student_id, book_id).await
    }
}

/// Reads both review gate facts on any connection or transaction.
pub(crate) async fn review_eligibility<C: ConnectionTrait>(
    db: &C,
    lending: &LendingService,
    student_id: UserId,
    book_id: BookId,
) -> Result<ReviewEligibility, DbErr> {
    let has_returned = borrow_records::Entity::find()
        .filter(borrow_records::Column::StudentId.eq(student_id.into_inner()))
        .filter(borrow_records::Column::BookId.eq(book_id.into_inner()))
        .filter(borrow_records::Column::Status.eq(BorrowStatus::Returned))
        .count(db)
        .await?
        > 0;
    let already_reviewed = reviews::Entity::find()
        .filter(reviews::Column::StudentId.eq(student_id.into_inner()))
        .filter(reviews::Column::BookId.eq(book_id.into_inner()))
        .count(db)
        .await?
        > 0;
    Ok(ReviewEligibility {
        has_returned,
        already_reviewed,
        can_review: lending.can_review(has_returned, already_reviewed),
    })
}
