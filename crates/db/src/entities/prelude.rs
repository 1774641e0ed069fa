//! Entity re-exports.

pub use super::authors::Entity as Authors;
pub use super::books::Entity as Books;
pub use super::borrow_records::Entity as BorrowRecords;
pub use super::categories::Entity as Categories;
pub use super::reviews::Entity as Reviews;
pub use super::student_profiles::Entity as StudentProfiles;
pub use super::users::Entity as Users;
