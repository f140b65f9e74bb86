//! Review star rating.

use serde::{Deserialize, Serialize};

/// Error returned when a rating is outside `1..=5`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5 (got {value})")]
pub struct RatingError {
    /// The rejected value.
    pub value: i32,
}

/// A review rating from 1 to 5 stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Rating(u8);

impl Rating {
    /// Lowest allowed rating.
    pub const MIN: i32 = 1;
    /// Highest allowed rating.
    pub const MAX: i32 = 5;

    /// Validate a raw rating.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` if `value` is not in `1..=5`.
    pub fn new(value: i32) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(&i32::from(*v)))
            .map(Self)
            .ok_or(RatingError { value })
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = RatingError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}
