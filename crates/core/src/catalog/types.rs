//! Catalog input types and validation.

use std::str::FromStr;

use chrono::NaiveDate;
use libris_shared::types::{AuthorId, CategoryId};
use serde::{Deserialize, Serialize};

use super::error::CatalogError;

/// Language recorded when none is given.
pub const DEFAULT_LANGUAGE: &str = "English";

const TITLE_MAX: usize = 300;
const AUTHOR_NAME_MAX: usize = 200;
const CATEGORY_NAME_MAX: usize = 100;
const ISBN_MAX: usize = 20;
const LANGUAGE_MAX: usize = 50;

fn required(field: &'static str, value: &str, max: usize) -> Result<String, CatalogError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CatalogError::Required(field));
    }
    bounded(field, value, max)
}

fn bounded(field: &'static str, value: &str, max: usize) -> Result<String, CatalogError> {
    if value.chars().count() > max {
        return Err(CatalogError::TooLong { field, max });
    }
    Ok(value.to_string())
}

/// Book listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookSort {
    /// Most recently added first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Highest average rating first, unrated last.
    Rating,
}

impl FromStr for BookSort {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "rating" => Ok(Self::Rating),
            other => Err(CatalogError::UnknownSort(other.to_string())),
        }
    }
}

/// Validated book fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookInput {
    /// Title.
    pub title: String,
    /// Author, if known.
    pub author_id: Option<AuthorId>,
    /// Category, if any.
    pub category_id: Option<CategoryId>,
    /// Description; may be empty.
    pub description: String,
    /// ISBN; blank input becomes `None`.
    pub isbn: Option<String>,
    /// Page count.
    pub pages: Option<i32>,
    /// Language.
    pub language: String,
    /// Copies owned.
    pub total_copies: i32,
    /// Copies on the shelf.
    pub available_copies: i32,
    /// Publication date.
    pub published_date: Option<NaiveDate>,
}

impl BookInput {
    /// Validates raw book fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for a blank title, oversize fields, negative
    /// counts, or more available copies than total copies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        title: &str,
        author_id: Option<AuthorId>,
        category_id: Option<CategoryId>,
        description: Option<&str>,
        isbn: Option<&str>,
        pages: Option<i32>,
        language: Option<&str>,
        total_copies: i32,
        available_copies: i32,
        published_date: Option<NaiveDate>,
    ) -> Result<Self, CatalogError> {
        let title = required("title", title, TITLE_MAX)?;
        let isbn = match isbn.map(str::trim).filter(|s| !s.is_empty()) {
            Some(isbn) => Some(bounded("isbn", isbn, ISBN_MAX)?),
            None => None,
        };
        if pages.is_some_and(|p| p < 0) {
            return Err(CatalogError::Negative("pages"));
        }
        let language = match language.map(str::trim).filter(|s| !s.is_empty()) {
            Some(language) => bounded("language", language, LANGUAGE_MAX)?,
            None => DEFAULT_LANGUAGE.to_string(),
        };
        check_copies(total_copies, available_copies)?;

        Ok(Self {
            title,
            author_id,
            category_id,
            description: description.map(str::trim).unwrap_or_default().to_string(),
            isbn,
            pages,
            language,
            total_copies,
            available_copies,
            published_date,
        })
    }
}

/// Checks `0 <= available <= total`.
///
/// # Errors
///
/// `Negative` or `AvailableExceedsTotal`.
pub fn check_copies(total: i32, available: i32) -> Result<(), CatalogError> {
    if total < 0 {
        return Err(CatalogError::Negative("total_copies"));
    }
    if available < 0 {
        return Err(CatalogError::Negative("available_copies"));
    }
    if available > total {
        return Err(CatalogError::AvailableExceedsTotal { total, available });
    }
    Ok(())
}

/// Validated author fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorInput {
    /// Name.
    pub name: String,
    /// Biography; may be empty.
    pub bio: String,
}

impl AuthorInput {
    /// Validates raw author fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for a blank or oversize name.
    pub fn new(name: &str, bio: Option<&str>) -> Result<Self, CatalogError> {
        Ok(Self {
            name: required("name", name, AUTHOR_NAME_MAX)?,
            bio: bio.map(str::trim).unwrap_or_default().to_string(),
        })
    }
}

/// Validated category fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    /// Name, unique across categories.
    pub name: String,
    /// Description; may be empty.
    pub description: String,
}

impl CategoryInput {
    /// Validates raw category fields.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` for a blank or oversize name.
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, CatalogError> {
        Ok(Self {
            name: required("name", name, CATEGORY_NAME_MAX)?,
            description: description.map(str::trim).unwrap_or_default().to_string(),
        })
    }
}
