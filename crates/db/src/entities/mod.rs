//! `SeaORM` entity definitions.

pub mod prelude;

pub mod authors;
pub mod books;
pub mod borrow_records;
pub mod categories;
pub mod reviews;
pub mod sea_orm_active_enums;
pub mod student_profiles;
pub mod users;
