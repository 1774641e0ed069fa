//! Author and category repositories, plus the shared catalog error.

use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, sea_query::Expr,
};
use thiserror::Error;
use uuid::Uuid;

use libris_core::catalog::{AuthorInput, CatalogError, CategoryInput};
use libris_shared::types::{AuthorId, BookId, CategoryId};

use crate::entities::{authors, books, categories};

/// Error types for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogRepoError {
    /// Input rejected by catalog rules.
    #[error(transparent)]
    Validation(#[from] CatalogError),

    /// Book not found.
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// Author not found.
    #[error("Author not found: {0}")]
    AuthorNotFound(AuthorId),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Category name already used.
    #[error("Category '{0}' already exists")]
    DuplicateCategory(String),

    /// ISBN already used by another book.
    #[error("ISBN '{0}' is already used by another book")]
    DuplicateIsbn(String),

    /// The edit would leave fewer shelf slots than copies out on loan.
    #[error("{on_loan} copies are on loan; total {total} with {available} available is inconsistent")]
    CopiesOnLoan {
        /// Copies currently borrowed.
        on_loan: u64,
        /// Requested total.
        total: i32,
        /// Requested available.
        available: i32,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Counts books per author or category id.
async fn book_counts(
    db: &DatabaseConnection,
    column: books::Column,
) -> Result<HashMap<Uuid, u64>, DbErr> {
    let rows: Vec<(Option<Uuid>, i64)> = books::Entity::find()
        .select_only()
        .column(column)
        .column_as(Expr::col(books::Column::Id).count(), "book_count")
        .filter(column.is_not_null())
        .group_by(column)
        .into_tuple()
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(id, count)| id.map(|id| (id, u64::try_from(count).unwrap_or_default())))
        .collect())
}

/// An author with the number of books in the catalog.
#[derive(Debug, Clone)]
pub struct AuthorSummary {
    /// Author row.
    pub author: authors::Model,
    /// Books by this author.
    pub book_count: u64,
}

/// An author with their books, newest first.
#[derive(Debug, Clone)]
pub struct AuthorDetail {
    /// Author row.
    pub author: authors::Model,
    /// Books by this author.
    pub books: Vec<books::Model>,
}

/// Author repository.
#[derive(Debug, Clone)]
pub struct AuthorRepository {
    db: DatabaseConnection,
}

impl AuthorRepository {
    /// Creates a new author repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists authors by name with their book counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<AuthorSummary>, DbErr> {
        let counts = book_counts(&self.db, books::Column::AuthorId).await?;
        let authors = authors::Entity::find()
            .order_by_asc(authors::Column::Name)
            .all(&self.db)
            .await?;
        Ok(authors
            .into_iter()
            .map(|author| AuthorSummary {
                book_count: counts.get(&author.id).copied().unwrap_or_default(),
                author,
            })
            .collect())
    }

    /// Finds an author by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AuthorId) -> Result<Option<authors::Model>, DbErr> {
        authors::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Loads an author and their books, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_detail(&self, id: AuthorId) -> Result<Option<AuthorDetail>, DbErr> {
        let Some(author) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let books = books::Entity::find()
            .filter(books::Column::AuthorId.eq(author.id))
            .order_by_desc(books::Column::CreatedAt)
            .order_by_desc(books::Column::Id)
            .all(&self.db)
            .await?;
        Ok(Some(AuthorDetail { author, books }))
    }

    /// Creates an author.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: AuthorInput) -> Result<authors::Model, CatalogRepoError> {
        let author = authors::ActiveModel {
            id: Set(AuthorId::new().into_inner()),
            name: Set(input.name),
            bio: Set(input.bio),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await?;
        tracing::info!(author_id = %author.id, "Author created");
        Ok(author)
    }

    /// Updates an author.
    ///
    /// # Errors
    ///
    /// Returns `AuthorNotFound` or a database error.
    pub async fn update(
        &self,
        id: AuthorId,
        input: AuthorInput,
    ) -> Result<authors::Model, CatalogRepoError> {
        let author = self
            .find_by_id(id)
            .await?
            .ok_or(CatalogRepoError::AuthorNotFound(id))?;
        let mut active: authors::ActiveModel = author.into();
        active.name = Set(input.name);
        active.bio = Set(input.bio);
        Ok(active.update(&self.db).await?)
    }

    /// Deletes an author; their books keep existing without an author.
    ///
    /// # Errors
    ///
    /// Returns `AuthorNotFound` or a database error.
    pub async fn delete(&self, id: AuthorId) -> Result<(), CatalogRepoError> {
        let result = authors::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(CatalogRepoError::AuthorNotFound(id));
        }
        tracing::info!(author_id = %id, "Author deleted");
        Ok(())
    }

    /// Number of authors.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        authors::Entity::find().count(&self.db).await
    }
}

/// A category with the number of books in it.
#[derive(Debug, Clone)]
pub struct CategorySummary {
    /// Category row.
    pub category: categories::Model,
    /// Books in this category.
    pub book_count: u64,
}

fn map_category_violation(err: DbErr, name: &str) -> CatalogRepoError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            CatalogRepoError::DuplicateCategory(name.to_string())
        }
        _ => CatalogRepoError::Database(err),
    }
}

/// Category repository.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists categories by name with their book counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_counts(&self) -> Result<Vec<CategorySummary>, DbErr> {
        let counts = book_counts(&self.db, books::Column::CategoryId).await?;
        let categories = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(categories
            .into_iter()
            .map(|category| CategorySummary {
                book_count: counts.get(&category.id).copied().unwrap_or_default(),
                category,
            })
            .collect())
    }

    /// Finds a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: CategoryId) -> Result<Option<categories::Model>, DbErr> {
        categories::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCategory` or a database error.
    pub async fn create(&self, input: CategoryInput) -> Result<categories::Model, CatalogRepoError> {
        let taken = categories::Entity::find()
            .filter(categories::Column::Name.eq(&input.name))
            .count(&self.db)
            .await?
            > 0;
        if taken {
            return Err(CatalogRepoError::DuplicateCategory(input.name));
        }
        let name = input.name.clone();
        let category = categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            name: Set(input.name),
            description: Set(input.description),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_category_violation(e, &name))?;
        tracing::info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    /// Updates a category.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound`, `DuplicateCategory` or a database error.
    pub async fn update(
        &self,
        id: CategoryId,
        input: CategoryInput,
    ) -> Result<categories::Model, CatalogRepoError> {
        let category = self
            .find_by_id(id)
            .await?
            .ok_or(CatalogRepoError::CategoryNotFound(id))?;
        let name = input.name.clone();
        let mut active: categories::ActiveModel = category.into();
        active.name = Set(input.name);
        active.description = Set(input.description);
        active
            .update(&self.db)
            .await
            .map_err(|e| map_category_violation(e, &name))
    }

    /// Deletes a category; its books keep existing uncategorized.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` or a database error.
    pub async fn delete(&self, id: CategoryId) -> Result<(), CatalogRepoError> {
        let result = categories::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(CatalogRepoError::CategoryNotFound(id));
        }
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Number of categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&self) -> Result<u64, DbErr> {
        categories::Entity::find().count(&self.db).await
    }
}
