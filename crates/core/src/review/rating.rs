//! Ratings and review input.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::lending::LendingError;

/// Lowest allowed rating.
pub const MIN_RATING: i32 = 1;

/// Highest allowed rating.
pub const MAX_RATING: i32 = 5;

/// A star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(i32);

impl Rating {
    /// Creates a rating.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRating` outside `1..=5`.
    pub fn new(value: i32) -> Result<Self, LendingError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LendingError::InvalidRating(value))
        }
    }

    /// The numeric value.
    #[must_use]
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = LendingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// A validated review submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    /// Rating.
    pub rating: Rating,
    /// Free text, trimmed; may be empty.
    pub comment: String,
}

impl ReviewInput {
    /// Validates raw submission fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRating` outside `1..=5`.
    pub fn new(rating: i32, comment: Option<&str>) -> Result<Self, LendingError> {
        Ok(Self {
            rating: Rating::new(rating)?,
            comment: comment.map(str::trim).unwrap_or_default().to_string(),
        })
    }
}

/// Mean rating rounded half-up to 2 decimal places; `None` with no reviews.
#[must_use]
pub fn average_rating(sum: i64, count: i64) -> Option<Decimal> {
    if count <= 0 {
        return None;
    }
    let mean = Decimal::from(sum).checked_div(Decimal::from(count))?;
    let mut rounded = mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    Some(rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(5, true)]
    #[case(6, false)]
    #[case(-3, false)]
    fn test_rating_bounds(#[case] value: i32, #[case] ok: bool) {
        assert_eq!(Rating::new(value).is_ok(), ok);
    }

    #[test]
    fn test_rating_conversions() {
        let rating = Rating::try_from(4).unwrap();
        assert_eq!(i32::from(rating), 4);
        assert!(Rating::try_from(0).is_err());
    }

    #[test]
    fn test_review_input_trims_comment() {
        let input = ReviewInput::new(4, Some("  great read \n")).unwrap();
        assert_eq!(input.comment, "great read");
        assert_eq!(ReviewInput::new(3, None).unwrap().comment, "");
        assert_eq!(
            ReviewInput::new(9, Some("x")),
            Err(LendingError::InvalidRating(9))
        );
    }

    #[rstest]
    #[case(0, 0, None)]
    #[case(4, 1, Some(dec!(4.00)))]
    #[case(9, 2, Some(dec!(4.50)))]
    #[case(13, 3, Some(dec!(4.33)))]
    #[case(14, 3, Some(dec!(4.67)))]
    fn test_average_rating(#[case] sum: i64, #[case] count: i64, #[case] expected: Option<Decimal>) {
        assert_eq!(average_rating(sum, count), expected);
    }

    #[test]
    fn test_average_rating_keeps_two_places() {
        assert_eq!(average_rating(8, 2).unwrap().to_string(), "4.00");
    }
}
