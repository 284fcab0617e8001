//! Median daily NAV change.

use rust_decimal::{Decimal, RoundingStrategy};

use nw_md::NavPoint;

/// Newest points considered (yields at most ten adjacent differences).
pub const GROWTH_SAMPLE_POINTS: usize = 11;

/// Median of the absolute day-over-day NAV changes over the newest
/// [`GROWTH_SAMPLE_POINTS`] points of a newest-first history.
///
/// Fewer than two points yields zero. With an even number of differences the
/// two middle values are averaged and rounded to 7 decimal places.
pub fn estimate_daily_growth(history: &[NavPoint]) -> Decimal {
    if history.len() < 2 {
        return Decimal::ZERO;
    }

    let window = &history[..history.len().min(GROWTH_SAMPLE_POINTS)];
    let mut diffs: Vec<Decimal> = window
        .windows(2)
        .map(|pair| (pair[0].nav - pair[1].nav).abs())
        .collect();
    diffs.sort();

    let mid = diffs.len() / 2;
    if diffs.len() % 2 == 1 {
        diffs[mid]
    } else {
        ((diffs[mid - 1] + diffs[mid]) / Decimal::TWO)
            .round_dp_with_strategy(7, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use rust_decimal_macros::dec;

    fn history(navs: &[Decimal]) -> Vec<NavPoint> {
        let newest = NaiveDate::from_ymd_opt(2024, 10, 10).unwrap();
        navs.iter()
            .enumerate()
            .map(|(i, nav)| NavPoint {
                date: newest - Days::new(i as u64),
                nav: *nav,
            })
            .collect()
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        let h = history(&[dec!(10), dec!(10.1), dec!(10.05), dec!(10.2)]);
        assert_eq!(estimate_daily_growth(&h), dec!(0.1));
    }

    #[test]
    fn short_histories_yield_zero() {
        assert_eq!(estimate_daily_growth(&[]), Decimal::ZERO);
        assert_eq!(estimate_daily_growth(&history(&[dec!(100.0123)])), Decimal::ZERO);
    }

    #[test]
    fn even_count_averages_and_rounds_to_seven_places() {
        // diffs: 0.00001, 0.00002 -> mean 0.000015
        let h = history(&[dec!(1.00003), dec!(1.00002), dec!(1.0)]);
        assert_eq!(estimate_daily_growth(&h), dec!(0.000015));

        // diffs: 0.0000001, 0.0000002 -> mean 0.00000015 -> 0.0000002 (ties to even)
        let h = history(&[dec!(1.0000003), dec!(1.0000002), dec!(1.0)]);
        assert_eq!(estimate_daily_growth(&h), dec!(0.0000002));
    }

    #[test]
    fn only_newest_eleven_points_count() {
        // Ten diffs of 0.01 from the newest 11 points, then a huge jump that must be ignored.
        let mut navs: Vec<Decimal> = (0..11).map(|i| dec!(100.10) - Decimal::from(i) * dec!(0.01)).collect();
        navs.push(dec!(50));
        navs.push(dec!(10));
        assert_eq!(estimate_daily_growth(&history(&navs)), dec!(0.01));
    }

    #[test]
    fn falling_nav_counts_as_absolute_change() {
        let h = history(&[dec!(1.000), dec!(1.002), dec!(1.003)]);
        // diffs 0.002, 0.001 -> mean 0.0015
        assert_eq!(estimate_daily_growth(&h), dec!(0.0015));
    }
}
