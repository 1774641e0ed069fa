//! User repository: accounts and student profiles.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, SqlErr, TransactionTrait,
};
use thiserror::Error;

use libris_core::auth::{NewAccount, ProfileChanges, RegistrationError};
use libris_core::dashboard::ProfileStats;
use libris_shared::types::UserId;

use crate::entities::{
    borrow_records, sea_orm_active_enums::BorrowStatus, student_profiles, users,
};

/// Error types for user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Registration or profile input rejected.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(UserId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// A user with their profile.
#[derive(Debug, Clone)]
pub struct UserWithProfile {
    /// Account row.
    pub user: users::Model,
    /// Profile row; staff accounts created outside registration may lack one.
    pub profile: Option<student_profiles::Model>,
}

/// Maps a unique violation on insert/update to the matching taken error.
fn map_unique_violation(err: DbErr) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains("username") => {
            RegistrationError::UsernameTaken.into()
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => RegistrationError::EmailTaken.into(),
        _ => UserError::Database(err),
    }
}

/// User repository for account operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account and its student profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `UsernameTaken`/`EmailTaken` for duplicates, or a database
    /// error. On any failure neither row is written.
    pub async fn register(
        &self,
        account: NewAccount,
        password_hash: String,
        is_staff: bool,
        today: NaiveDate,
    ) -> Result<UserWithProfile, UserError> {
        if self.username_exists(&account.username).await? {
            return Err(RegistrationError::UsernameTaken.into());
        }
        if self.email_exists(&account.email, None).await? {
            return Err(RegistrationError::EmailTaken.into());
        }

        let now = chrono::Utc::now().into();
        let id = UserId::new();
        let txn = self.db.begin().await?;

        let user = users::ActiveModel {
            id: Set(id.into_inner()),
            username: Set(account.username),
            email: Set(account.email),
            password_hash: Set(password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            is_staff: Set(is_staff),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(map_unique_violation)?;

        let profile = student_profiles::ActiveModel {
            user_id: Set(user.id),
            phone: Set(account.phone),
            joined_date: Set(today),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(user_id = %id, username = %user.username, is_staff, "Account registered");

        Ok(UserWithProfile {
            user,
            profile: Some(profile),
        })
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Finds a user by username.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await
    }

    /// Loads a user together with their profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_profile(&self, id: UserId) -> Result<Option<UserWithProfile>, DbErr> {
        let found = users::Entity::find_by_id(id.into_inner())
            .find_also_related(student_profiles::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(user, profile)| UserWithProfile { user, profile }))
    }

    /// Checks if a username is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn username_exists(&self, username: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Checks if an email is registered, optionally ignoring one account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str, except: Option<UserId>) -> Result<bool, DbErr> {
        let mut query = users::Entity::find().filter(users::Column::Email.eq(email));
        if let Some(except) = except {
            query = query.filter(users::Column::Id.ne(except.into_inner()));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    /// Applies profile changes in one transaction.
    ///
    /// `new_password_hash` replaces the stored hash when set. A missing
    /// profile row is created.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `EmailTaken` (another account uses the email), or a
    /// database error.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: ProfileChanges,
        new_password_hash: Option<String>,
        today: NaiveDate,
    ) -> Result<UserWithProfile, UserError> {
        if let Some(email) = &changes.email {
            if self.email_exists(email, Some(id)).await? {
                return Err(RegistrationError::EmailTaken.into());
            }
        }

        let txn = self.db.begin().await?;

        let (user, profile) = users::Entity::find_by_id(id.into_inner())
            .find_also_related(student_profiles::Entity)
            .one(&txn)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let mut active: users::ActiveModel = user.into();
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(hash) = new_password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(chrono::Utc::now().into());
        let user = active.update(&txn).await.map_err(map_unique_violation)?;

        let profile = match (profile, changes.phone) {
            (Some(profile), Some(phone)) => {
                let mut active: student_profiles::ActiveModel = profile.into();
                active.phone = Set(phone);
                Some(active.update(&txn).await?)
            }
            (Some(profile), None) => Some(profile),
            (None, phone) => Some(
                student_profiles::ActiveModel {
                    user_id: Set(user.id),
                    phone: Set(phone.unwrap_or_default()),
                    joined_date: Set(today),
                }
                .insert(&txn)
                .await?,
            ),
        };

        txn.commit().await?;

        tracing::info!(user_id = %id, "Profile updated");

        Ok(UserWithProfile { user, profile })
    }

    /// Borrowing statistics for a student.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn profile_stats(&self, id: UserId) -> Result<ProfileStats, DbErr> {
        let total = borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        let active = borrow_records::Entity::find()
            .filter(borrow_records::Column::StudentId.eq(id.into_inner()))
            .filter(borrow_records::Column::Status.eq(BorrowStatus::Borrowed))
            .count(&self.db)
            .await?;
        Ok(ProfileStats::from_counts(active, total))
    }
}
