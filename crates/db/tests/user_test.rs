//! Integration tests for the User repository.

mod common;

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use libris_core::auth::{RegistrationError, validate_profile_update, validate_registration};
use libris_db::entities::{student_profiles, users};
use libris_db::repositories::UserError;
use libris_shared::types::UserId;
use sea_orm::{EntityTrait, PaginatorTrait};

use common::{Library, today};

#[tokio::test]
async fn test_register_creates_user_and_profile() {
    let lib = Library::new().await;
    let account = validate_registration(
        "ada",
        "Ada@Example.com",
        "Ada",
        "Lovelace",
        Some("555-0100"),
        "password123",
        "password123",
    )
    .unwrap();

    let created = lib
        .users
        .register(account, "$argon2id$test_hash".to_string(), false, today())
        .await
        .expect("Failed to register");

    assert_eq!(created.user.username, "ada");
    assert_eq!(created.user.email, "ada@example.com");
    assert!(!created.user.is_staff);
    let profile = created.profile.expect("Profile should exist");
    assert_eq!(profile.phone, "555-0100");
    assert_eq!(profile.joined_date, today());

    let found = lib
        .users
        .find_by_username("ada")
        .await
        .unwrap()
        .expect("User should exist");
    assert_eq!(found.id, created.user.id);
}

#[tokio::test]
async fn test_duplicate_username_and_email_are_rejected() {
    let lib = Library::new().await;
    lib.student("ada").await;

    let same_username =
        validate_registration("ada", "other@example.com", "A", "L", None, "password123", "password123")
            .unwrap();
    let result = lib
        .users
        .register(same_username, "hash".to_string(), false, today())
        .await;
    assert!(matches!(
        result,
        Err(UserError::Registration(RegistrationError::UsernameTaken))
    ));

    let same_email =
        validate_registration("grace", "ADA@example.com", "G", "H", None, "password123", "password123")
            .unwrap();
    let result = lib
        .users
        .register(same_email, "hash".to_string(), false, today())
        .await;
    assert!(matches!(
        result,
        Err(UserError::Registration(RegistrationError::EmailTaken))
    ));

    assert_eq!(users::Entity::find().count(&lib.db).await.unwrap(), 1);
    assert_eq!(
        student_profiles::Entity::find().count(&lib.db).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn test_update_profile_changes_fields() {
    let lib = Library::new().await;
    let ada = lib.student("ada").await;
    let changes = validate_profile_update(
        Some("Augusta"),
        None,
        Some("augusta@example.com"),
        Some("555-0199"),
        None,
        None,
    )
    .unwrap();

    let updated = lib
        .users
        .update_profile(ada, changes, None, today())
        .await
        .expect("Failed to update profile");

    assert_eq!(updated.user.first_name, "Augusta");
    assert_eq!(updated.user.last_name, "User");
    assert_eq!(updated.user.email, "augusta@example.com");
    assert_eq!(updated.profile.unwrap().phone, "555-0199");
}

#[tokio::test]
async fn test_update_profile_rejects_taken_email() {
    let lib = Library::new().await;
    let ada = lib.student("ada").await;
    lib.student("grace").await;
    let changes =
        validate_profile_update(None, None, Some("grace@example.com"), None, None, None).unwrap();

    let result = lib.users.update_profile(ada, changes, None, today()).await;

    assert!(matches!(
        result,
        Err(UserError::Registration(RegistrationError::EmailTaken))
    ));
}

#[tokio::test]
async fn test_update_profile_keeps_own_email() {
    let lib = Library::new().await;
    let ada = lib.student("ada").await;
    let changes =
        validate_profile_update(None, None, Some("ada@example.com"), None, None, None).unwrap();

    lib.users
        .update_profile(ada, changes, Some("$argon2id$new_hash".to_string()), today())
        .await
        .expect("Own email is not a conflict");

    let user = lib.users.find_by_id(ada).await.unwrap().unwrap();
    assert_eq!(user.password_hash, "$argon2id$new_hash");
}

#[tokio::test]
async fn test_update_unknown_user() {
    let lib = Library::new().await;
    let changes = validate_profile_update(Some("X"), None, None, None, None, None).unwrap();

    let result = lib
        .users
        .update_profile(UserId::new(), changes, None, today())
        .await;

    assert!(matches!(result, Err(UserError::NotFound(_))));
}

#[tokio::test]
async fn test_profile_stats_counts_borrows() {
    let lib = Library::new().await;
    let ada = lib.student("ada").await;
    let first = lib.book("First", 1).await;
    let second = lib.book("Second", 1).await;
    let borrowed = lib.borrows.borrow_book(ada, first, today()).await.unwrap();
    lib.borrows.borrow_book(ada, second, today()).await.unwrap();
    lib.borrows
        .return_book(borrowed.record.id(), Some(ada), today())
        .await
        .unwrap();

    let stats = lib.users.profile_stats(ada).await.unwrap();

    assert_eq!(stats.currently_borrowed, 1);
    assert_eq!(stats.total_borrowed, 2);
    assert_eq!(stats.returned, 1);
}

#[tokio::test]
async fn test_register_many_students() {
    let lib = Library::new().await;

    for n in 0..8 {
        let first: String = FirstName().fake();
        let last: String = LastName().fake();
        let email: String = SafeEmail().fake();
        let account = validate_registration(
            &format!("student{n}"),
            &format!("{n}.{email}"),
            &first,
            &last,
            None,
            "password123",
            "password123",
        )
        .unwrap();
        lib.users
            .register(account, "hash".to_string(), false, today())
            .await
            .expect("Failed to register");
    }

    assert_eq!(users::Entity::find().count(&lib.db).await.unwrap(), 8);
    assert_eq!(student_profiles::Entity::find().count(&lib.db).await.unwrap(), 8);
}
