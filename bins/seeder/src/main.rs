//! Database seeder for Libris development and demos.
//!
//! Seeds categories, authors, books, a staff account and a handful of
//! students, then replays a few weeks of borrowing so the dashboard, the
//! rating sort and the review feed have something to show.
//!
//! Usage: cargo run --bin seeder

use anyhow::{Context, bail};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;

use libris_core::auth::{hash_password, validate_registration};
use libris_core::catalog::{AuthorInput, BookInput, CategoryInput};
use libris_core::lending::{LendingPolicy, LendingService};
use libris_core::review::ReviewInput;
use libris_db::{
    AuthorRepository, BookRepository, BorrowRepository, CategoryRepository, ReviewRepository,
    UserRepository,
};
use libris_shared::types::{AuthorId, BookId, CategoryId, UserId};

/// Password for every seeded account.
const SEED_PASSWORD: &str = "password123";

const CATEGORIES: &[(&str, &str)] = &[
    ("Fiction", "Novels and short stories"),
    ("Science Fiction", "Speculative futures and other worlds"),
    ("History", "Accounts of the past"),
    ("Science", "Popular and introductory science"),
    ("Philosophy", "Classic and modern philosophy"),
    ("Poetry", "Collections and anthologies"),
];

const AUTHORS: &[(&str, &str)] = &[
    ("Jane Austen", "English novelist of the Regency era."),
    ("Ursula K. Le Guin", "American author of speculative fiction."),
    ("Octavia E. Butler", "American science fiction writer."),
    ("Mary Beard", "British classicist."),
    ("Carl Sagan", "Astronomer and science communicator."),
    ("Marcus Aurelius", "Roman emperor and Stoic philosopher."),
    ("Toni Morrison", "American novelist, Nobel laureate."),
    ("Stanislaw Lem", "Polish writer of science fiction and essays."),
    ("Emily Dickinson", "American poet."),
    ("Yuval Noah Harari", "Israeli historian."),
];

/// Title, author index, category index, total copies, ISBN.
const BOOKS: &[(&str, usize, usize, i32, &str)] = &[
    ("Pride and Prejudice", 0, 0, 3, "9780141439518"),
    ("Emma", 0, 0, 2, "9780141439587"),
    ("The Left Hand of Darkness", 1, 1, 2, "9780441478125"),
    ("The Dispossessed", 1, 1, 1, "9780061054884"),
    ("Kindred", 2, 1, 2, "9780807083697"),
    ("Parable of the Sower", 2, 1, 1, "9781538732182"),
    ("SPQR", 3, 2, 2, "9781631492228"),
    ("Cosmos", 4, 3, 3, "9780345539434"),
    ("Pale Blue Dot", 4, 3, 1, "9780345376596"),
    ("Meditations", 5, 4, 2, "9780140449334"),
    ("Beloved", 6, 0, 2, "9781400033416"),
    ("Song of Solomon", 6, 0, 1, "9781400033423"),
    ("Solaris", 7, 1, 2, "9780156027601"),
    ("The Cyberiad", 7, 1, 1, "9780156027595"),
    ("The Complete Poems", 8, 5, 1, "9780316184137"),
    ("Sapiens", 9, 2, 4, "9780062316097"),
];

const STUDENTS: &[(&str, &str, &str)] = &[
    ("alice", "Alice", "Nguyen"),
    ("bruno", "Bruno", "Costa"),
    ("chiara", "Chiara", "Rossi"),
    ("dmitri", "Dmitri", "Volkov"),
    ("esme", "Esme", "Okafor"),
    ("farid", "Farid", "Haddad"),
];

/// Student index, book index, days ago borrowed, days kept (`None` = still out),
/// rating given after returning.
const HISTORY: &[(usize, usize, i64, Option<i64>, Option<(i32, &str)>)] = &[
    (0, 0, 40, Some(10), Some((5, "Witty from the first line."))),
    (0, 7, 35, Some(12), Some((4, "Made me look up more often."))),
    (1, 2, 38, Some(14), Some((5, ""))),
    (1, 12, 30, Some(9), Some((4, "Strange and haunting."))),
    (2, 4, 33, Some(7), Some((5, "Could not put it down."))),
    (2, 0, 28, Some(13), Some((4, "A comfort read."))),
    (3, 9, 27, Some(6), Some((3, "Dense but rewarding."))),
    (3, 15, 25, Some(11), None),
    (4, 10, 24, Some(12), Some((5, "Unforgettable."))),
    (5, 6, 22, Some(10), Some((4, ""))),
    (0, 3, 20, None, None),
    (1, 15, 18, None, None),
    (2, 7, 9, None, None),
    (4, 13, 5, None, None),
    (5, 0, 3, None, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    println!("Connecting to database...");
    let db = libris_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    if BookRepository::new(db.clone()).count().await? > 0 {
        println!("Catalog already has books, skipping seed.");
        return Ok(());
    }

    println!("Seeding categories...");
    let categories = seed_categories(&db).await?;

    println!("Seeding authors...");
    let authors = seed_authors(&db).await?;

    println!("Seeding books...");
    let books = seed_books(&db, &authors, &categories).await?;

    println!("Seeding accounts...");
    let students = seed_accounts(&db).await?;

    println!("Replaying borrowing history...");
    seed_history(&db, &students, &books).await?;

    println!("Seeding complete! Every account uses the password '{SEED_PASSWORD}'.");
    Ok(())
}

async fn seed_categories(db: &DatabaseConnection) -> anyhow::Result<Vec<CategoryId>> {
    let repo = CategoryRepository::new(db.clone());
    let mut ids = Vec::with_capacity(CATEGORIES.len());
    for (name, description) in CATEGORIES {
        let category = repo.create(CategoryInput::new(name, Some(description))?).await?;
        ids.push(CategoryId::from_uuid(category.id));
    }
    println!("  Created {} categories", ids.len());
    Ok(ids)
}

async fn seed_authors(db: &DatabaseConnection) -> anyhow::Result<Vec<AuthorId>> {
    let repo = AuthorRepository::new(db.clone());
    let mut ids = Vec::with_capacity(AUTHORS.len());
    for (name, bio) in AUTHORS {
        let author = repo.create(AuthorInput::new(name, Some(bio))?).await?;
        ids.push(AuthorId::from_uuid(author.id));
    }
    println!("  Created {} authors", ids.len());
    Ok(ids)
}

async fn seed_books(
    db: &DatabaseConnection,
    authors: &[AuthorId],
    categories: &[CategoryId],
) -> anyhow::Result<Vec<BookId>> {
    let repo = BookRepository::new(db.clone());
    let mut ids = Vec::with_capacity(BOOKS.len());
    for &(title, author, category, copies, isbn) in BOOKS {
        let input = BookInput::new(
            title,
            authors.get(author).copied(),
            categories.get(category).copied(),
            None,
            Some(isbn),
            None,
            None,
            copies,
            copies,
            None,
        )?;
        let book = repo.create(input).await?;
        ids.push(BookId::from_uuid(book.id));
    }
    println!("  Created {} books", ids.len());
    Ok(ids)
}

async fn seed_accounts(db: &DatabaseConnection) -> anyhow::Result<Vec<UserId>> {
    let repo = UserRepository::new(db.clone());
    let password_hash = hash_password(SEED_PASSWORD)?;
    let joined = Utc::now().date_naive() - Duration::days(60);

    let staff = validate_registration(
        "librarian",
        "librarian@libris.dev",
        "Head",
        "Librarian",
        None,
        SEED_PASSWORD,
        SEED_PASSWORD,
    )?;
    repo.register(staff, password_hash.clone(), true, joined).await?;
    println!("  Created staff account: librarian");

    let mut ids = Vec::with_capacity(STUDENTS.len());
    for (username, first_name, last_name) in STUDENTS {
        let account = validate_registration(
            username,
            &format!("{username}@libris.dev"),
            first_name,
            last_name,
            None,
            SEED_PASSWORD,
            SEED_PASSWORD,
        )?;
        let created = repo
            .register(account, password_hash.clone(), false, joined)
            .await?;
        ids.push(UserId::from_uuid(created.user.id));
    }
    println!("  Created {} students", ids.len());
    Ok(ids)
}

async fn seed_history(
    db: &DatabaseConnection,
    students: &[UserId],
    books: &[BookId],
) -> anyhow::Result<()> {
    let lending = LendingService::new(LendingPolicy::default());
    let borrows = BorrowRepository::new(db.clone(), lending);
    let reviews = ReviewRepository::new(db.clone(), lending);
    let today = Utc::now().date_naive();

    let (mut borrowed, mut reviewed) = (0, 0);
    for &(student, book, days_ago, kept, review) in HISTORY {
        let (Some(&student_id), Some(&book_id)) = (students.get(student), books.get(book)) else {
            bail!("history entry refers to an unknown student or book");
        };
        let borrow_date: NaiveDate = today - Duration::days(days_ago);
        let outcome = borrows.borrow_book(student_id, book_id, borrow_date).await?;
        borrowed += 1;

        let Some(kept) = kept else { continue };
        borrows
            .return_book(outcome.record.id(), Some(student_id), borrow_date + Duration::days(kept))
            .await?;

        if let Some((rating, comment)) = review {
            reviews
                .submit(student_id, book_id, ReviewInput::new(rating, Some(comment))?)
                .await?;
            reviewed += 1;
        }
    }
    println!("  Recorded {borrowed} borrows and {reviewed} reviews");
    Ok(())
}
