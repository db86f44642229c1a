//! Ranking signals.

use folio_records::models::{Availability, SignalSources};

/// Ranking inputs derived from a work's [`SignalSources`].
///
/// Every field is `None` when its source is absent. Zero is only ever
/// reported when a source actually says zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Signals {
    /// Mean rating; absent unless at least one rating exists
    pub rating_average: Option<f64>,
    pub rating_count: Option<u64>,
    pub want_count: Option<u64>,
    pub read_count: Option<u64>,
    /// Want-to-read and already-read combined
    pub readinglog_count: Option<u64>,
    /// Highest-precedence availability indicator
    pub availability: Option<Availability>,
}
impl Signals {
    pub fn compute(sources: &SignalSources) -> Self {
        let readinglog_count = match (sources.want_to_read, sources.already_read) {
            (None, None) => None,
            (want, read) => Some(want.unwrap_or(0).saturating_add(read.unwrap_or(0))),
        };
        Self {
            rating_average: sources
                .rating
                .filter(|rating| rating.count > 0)
                .map(|rating| rating.sum as f64 / rating.count as f64),
            rating_count: sources.rating.map(|rating| rating.count),
            want_count: sources.want_to_read,
            read_count: sources.already_read,
            readinglog_count,
            availability: sources.availability.iter().copied().max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_records::models::RatingAggregate;
    use rstest::rstest;

    #[test]
    fn test_no_sources_no_signals() {
        assert_eq!(Signals::compute(&SignalSources::default()), Signals::default());
    }

    #[test]
    fn test_zero_ratings_have_no_average() {
        let signals = Signals::compute(&SignalSources {
            rating: Some(RatingAggregate::new(0, 0)),
            ..Default::default()
        });
        assert_eq!(signals.rating_average, None);
        assert_eq!(signals.rating_count, Some(0));
    }

    #[test]
    fn test_rating_average() {
        let signals = Signals::compute(&SignalSources {
            rating: Some(RatingAggregate::from_stars([0, 0, 1, 1, 2])),
            ..Default::default()
        });
        assert_eq!(signals.rating_average, Some(4.25));
        assert_eq!(signals.rating_count, Some(4));
    }

    #[test]
    fn test_reading_log() {
        let signals = Signals::compute(&SignalSources {
            want_to_read: Some(7),
            ..Default::default()
        });
        assert_eq!(signals.want_count, Some(7));
        assert_eq!(signals.read_count, None);
        assert_eq!(signals.readinglog_count, Some(7));

        let signals = Signals::compute(&SignalSources {
            want_to_read: Some(0),
            already_read: Some(3),
            ..Default::default()
        });
        assert_eq!(signals.want_count, Some(0));
        assert_eq!(signals.readinglog_count, Some(3));
    }

    #[rstest]
    #[case(vec![], None)]
    #[case(vec![Availability::Unavailable], Some(Availability::Unavailable))]
    #[case(vec![Availability::Borrowable, Availability::Unavailable], Some(Availability::Borrowable))]
    #[case(vec![Availability::Borrowable, Availability::OpenAccess, Availability::Unavailable], Some(Availability::OpenAccess))]
    fn test_availability_precedence(#[case] indicators: Vec<Availability>, #[case] expected: Option<Availability>) {
        let signals = Signals::compute(&SignalSources {
            availability: indicators,
            ..Default::default()
        });
        assert_eq!(signals.availability, expected);
    }
}
