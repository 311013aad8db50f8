//! Aggregate rating

/// Lowest accepted star rating
pub const MIN_RATING: i64 = 1;
/// Highest accepted star rating
pub const MAX_RATING: i64 = 5;

/// Mean of the ratings rounded to one decimal place; `0.0` for no ratings
///
/// # Examples
/// ```
/// use peerfolio_common::rating::average_rating;
///
/// assert_eq!(average_rating(&[]), 0.0);
/// assert_eq!(average_rating(&[4, 5]), 4.5);
/// ```
pub fn average_rating(ratings: &[i64]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().sum();
    let mean = sum as f64 / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}
