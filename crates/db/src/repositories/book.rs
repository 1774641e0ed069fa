//! Book repository: listing, detail and staff edits.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
    TransactionTrait,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use libris_core::catalog::{BookInput, BookSort};
use libris_core::dashboard::BookCard;
use libris_shared::types::{AuthorId, BookId, CategoryId, PageRequest, PageResponse};

use crate::entities::{
    authors, books, borrow_records, categories, sea_orm_active_enums::BorrowStatus,
};

use super::catalog::CatalogRepoError;
use super::review::rating_averages;

const HAS_NO_REVIEWS: &str =
    "(SELECT COUNT(*) FROM reviews WHERE reviews.book_id = books.id) = 0";
const AVERAGE_RATING: &str =
    "(SELECT AVG(reviews.rating * 1.0) FROM reviews WHERE reviews.book_id = books.id)";

/// Filters for the book listing.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Case-insensitive match on title or author name.
    pub q: Option<String>,
    /// Only books in this category.
    pub category: Option<CategoryId>,
    /// Sort order.
    pub sort: BookSort,
}

/// A book with its author, category and rating.
#[derive(Debug, Clone)]
pub struct BookDetail {
    /// Book row.
    pub book: books::Model,
    /// Author, if set.
    pub author: Option<authors::Model>,
    /// Category, if set.
    pub category: Option<categories::Model>,
    /// Mean rating at 2 dp, `None` when unreviewed.
    pub average_rating: Option<Decimal>,
}

impl BookDetail {
    /// At least one copy on the shelf.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.book.available_copies > 0
    }
}

fn sorted(query: Select<books::Entity>, sort: BookSort) -> Select<books::Entity> {
    match sort {
        BookSort::Newest => query
            .order_by_desc(books::Column::CreatedAt)
            .order_by_desc(books::Column::Id),
        BookSort::Oldest => query
            .order_by_asc(books::Column::CreatedAt)
            .order_by_asc(books::Column::Id),
        BookSort::Rating => query
            .order_by(Expr::cust(HAS_NO_REVIEWS), Order::Asc)
            .order_by(Expr::cust(AVERAGE_RATING), Order::Desc)
            .order_by_desc(books::Column::CreatedAt)
            .order_by_desc(books::Column::Id),
    }
}

/// Builds listing cards, keeping the order of `models`.
pub(crate) async fn cards<C: ConnectionTrait>(
    db: &C,
    models: Vec<books::Model>,
) -> Result<Vec<BookCard>, DbErr> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|b| b.id).collect();
    let author_ids: Vec<Uuid> = models.iter().filter_map(|b| b.author_id).collect();
    let category_ids: Vec<Uuid> = models.iter().filter_map(|b| b.category_id).collect();

    let author_names: HashMap<Uuid, String> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        authors::Entity::find()
            .filter(authors::Column::Id.is_in(author_ids))
            .select_only()
            .column(authors::Column::Id)
            .column(authors::Column::Name)
            .into_tuple::<(Uuid, String)>()
            .all(db)
            .await?
            .into_iter()
            .collect()
    };
    let category_names: HashMap<Uuid, String> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .select_only()
            .column(categories::Column::Id)
            .column(categories::Column::Name)
            .into_tuple::<(Uuid, String)>()
            .all(db)
            .await?
            .into_iter()
            .collect()
    };
    let averages = rating_averages(db, &ids).await?;

    Ok(models
        .into_iter()
        .map(|book| BookCard {
            id: BookId::from_uuid(book.id),
            author_name: book.author_id.and_then(|id| author_names.get(&id).cloned()),
            category_name: book.category_id.and_then(|id| category_names.get(&id).cloned()),
            average_rating: averages.get(&book.id).copied(),
            is_available: book.available_copies > 0,
            title: book.title,
        })
        .collect())
}

/// Book repository.
#[derive(Debug, Clone)]
pub struct BookRepository {
    db: DatabaseConnection,
}

impl BookRepository {
    /// Creates a new book repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists books matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        query: &BookQuery,
        page: PageRequest,
    ) -> Result<PageResponse<BookCard>, DbErr> {
        let mut select = books::Entity::find().left_join(authors::Entity);

        if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((books::Entity, books::Column::Title))))
                            .like(pattern.as_str()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            authors::Entity,
                            authors::Column::Name,
                        ))))
                        .like(pattern.as_str()),
                    ),
            );
        }
        if let Some(category) = query.category {
            select = select.filter(books::Column::CategoryId.eq(category.into_inner()));
        }

        let total = select.clone().count(&self.db).await?;
        let models = sorted(select, query.sort)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(cards(&self.db, models).await?, page, total))
    }

    /// The most recently added books.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn newest(&self, limit: u64) -> Result<Vec<BookCard>, DbErr> {
        let models = sorted(books::Entity::find(), BookSort::Newest)
            .limit(limit)
            .all(&self.db)
            .await?;
        cards(&self.db, models).await
    }

    /// The best rated books; only reviewed books qualify.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn top_rated(&self, limit: u64) -> Result<Vec<BookCard>, DbErr> {
        let models = sorted(
            books::Entity::find().filter(Expr::cust(HAS_NO_REVIEWS).not()),
            BookSort::Rating,
        )
        .limit(limit)
        .all(&self.db)
        .await?;
        cards(&self.db, models).await
    }

    /// Finds a book by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: BookId) -> Result<Option<books::Model>, DbErr> {
        books::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Loads a book with its author, category and average rating.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_detail(&self, id: BookId) -> Result<Option<BookDetail>, DbErr> {
        let Some((book, author)) = books::Entity::find_by_id(id.into_inner())
            .find_also_related(authors::Entity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let category = match book.category_id {
            Some(category_id) => categories::Entity::find_by_id(category_id).one(&self.db).await?,
            None => None,
        };
        let average_rating = rating_averages(&self.db, &[book.id])
            .await?
            .get(&book.id)
            .copied();
        Ok(Some(BookDetail {
            book,
            author,
            category,
            average_rating,
        }))
    }

    /// Creates a book.
    ///
    /// # Errors
    ///
    /// Returns `AuthorNotFound`, `CategoryNotFound`, `DuplicateIsbn`, or a
    /// database error.
    pub async fn create(&self, input: BookInput) -> Result<books::Model, CatalogRepoError> {
        self.check_references(&input, None).await?;
        let isbn = input.isbn.clone();

        let book = books::ActiveModel {
            id: Set(BookId::new().into_inner()),
            title: Set(input.title),
            author_id: Set(input.author_id.map(AuthorId::into_inner)),
            category_id: Set(input.category_id.map(CategoryId::into_inner)),
            description: Set(input.description),
            isbn: Set(input.isbn),
            pages: Set(input.pages),
            language: Set(input.language),
            total_copies: Set(input.total_copies),
            available_copies: Set(input.available_copies),
            published_date: Set(input.published_date),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_isbn_violation(e, isbn))?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Replaces a book's fields.
    ///
    /// The copy counts must leave room for every copy currently on loan:
    /// `available + on_loan <= total`.
    ///
    /// # Errors
    ///
    /// Returns `BookNotFound`, `CopiesOnLoan`, a reference error, or a
    /// database error.
    pub async fn update(
        &self,
        id: BookId,
        input: BookInput,
    ) -> Result<books::Model, CatalogRepoError> {
        self.check_references(&input, Some(id)).await?;
        let isbn = input.isbn.clone();

        let txn = self.db.begin().await?;

        let book = books::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(CatalogRepoError::BookNotFound(id))?;

        let on_loan = borrow_records::Entity::find()
            .filter(borrow_records::Column::BookId.eq(book.id))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed))
            .count(&txn)
            .await?;
        let available = u64::try_from(input.available_copies).unwrap_or_default();
        let total = u64::try_from(input.total_copies).unwrap_or_default();
        if available + on_loan > total {
            return Err(CatalogRepoError::CopiesOnLoan {
                on_loan,
                total: input.total_copies,
                available: input.available_copies,
            });
        }

        let mut active: books::ActiveModel = book.into();
        active.title = Set(input.title);
        active.author_id = Set(input.author_id.map(AuthorId::into_inner));
        active.category_id = Set(input.category_id.map(CategoryId::into_inner));
        active.description = Set(input.description);
        active.isbn = Set(input.isbn);
        active.pages = Set(input.pages);
        active.language = Set(input.language);
        active.total_copies = Set(input.total_copies);
        active.available_copies = Set(input.available_copies);
        active.published_date = Set(input.published_date);
        let book = active
            .update(&txn)
            .await
            .map_err(|e| map_isbn_violation(e, isbn))?;

        txn.commit().await?;

        tracing::info!(book_id = %id, "Book updated");
        Ok(book)
    }

    /// Deletes a book with its borrow history and reviews.
    ///
    /// # Errors
    ///
    /// Returns `BookNotFound` or a database error.
    pub async fn delete(&self, id: BookId) -> Result<(), CatalogRepoError> {
        let result = books::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(CatalogRepoError::BookNotFound(id));
        }
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    /// Number of books.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        books::Entity::find().count(&self.db).await
    }

    async fn check_references(
        &self,
        input: &BookInput,
        current: Option<BookId>,
    ) -> Result<(), CatalogRepoError> {
        if let Some(author_id) = input.author_id {
            authors::Entity::find_by_id(author_id.into_inner())
                .one(&self.db)
                .await?
                .ok_or(CatalogRepoError::AuthorNotFound(author_id))?;
        }
        if let Some(category_id) = input.category_id {
            categories::Entity::find_by_id(category_id.into_inner())
                .one(&self.db)
                .await?
                .ok_or(CatalogRepoError::CategoryNotFound(category_id))?;
        }
        if let Some(isbn) = &input.isbn {
            let mut query = books::Entity::find().filter(books::Column::Isbn.eq(isbn.as_str()));
            if let Some(current) = current {
                query = query.filter(books::Column::Id.ne(current.into_inner()));
            }
            if query.count(&self.db).await? > 0 {
                return Err(CatalogRepoError::DuplicateIsbn(isbn.clone()));
            }
        }
        Ok(())
    }
}

fn map_isbn_violation(err: DbErr, isbn: Option<String>) -> CatalogRepoError {
    match (err.sql_err(), isbn) {
        (Some(SqlErr::UniqueConstraintViolation(_)), Some(isbn)) => {
            CatalogRepoError::DuplicateIsbn(isbn)
        }
        _ => CatalogRepoError::Database(err),
    }
}
