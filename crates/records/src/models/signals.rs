use super::Availability;

/// Running totals of reader ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RatingAggregate {
    /// Sum of all submitted ratings
    pub sum: u64,
    /// Number of submitted ratings
    pub count: u64,
}
impl RatingAggregate {
    pub fn new(sum: u64, count: u64) -> Self {
        Self { sum, count }
    }

    /// Build an aggregate from a one-to-five star histogram, where
    /// `stars[0]` is the number of one-star ratings.
    pub fn from_stars(stars: [u64; 5]) -> Self {
        stars.iter().zip(1u64..).fold(Self::default(), |acc, (count, weight)| Self {
            sum: acc.sum.saturating_add(count.saturating_mul(weight)),
            count: acc.count.saturating_add(*count),
        })
    }
}

/// Optional ranking inputs attached to a work.
///
/// Every source is optional: `None` (or an empty indicator list) means
/// "no data", which is not the same thing as zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignalSources {
    pub rating: Option<RatingAggregate>,
    /// Readers who marked the work as want-to-read
    pub want_to_read: Option<u64>,
    /// Readers who marked the work as already read
    pub already_read: Option<u64>,
    pub availability: Vec<Availability>,
}
impl SignalSources {
    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.want_to_read.is_none() && self.already_read.is_none() && self.availability.is_empty()
    }
}
