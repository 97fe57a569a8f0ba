//! Forward-filling a series into one bar per interval.

use ohlc_ingestor::{Bar, BarSeries};

/// Fills every missing timestamp between the first and last bar.
///
/// A synthesized bar repeats the previous close for all four prices and has
/// zero volume. Real bars are passed through untouched, so densifying a
/// dense series is a no-op.
pub fn densify(series: &BarSeries) -> BarSeries {
    densify_counted(series).0
}

/// Like [`densify`], also returning how many bars were synthesized.
pub fn densify_counted(series: &BarSeries) -> (BarSeries, usize) {
    let interval = series.interval();
    let (Some(first), Some(last)) = (series.first_timestamp(), series.last_timestamp()) else {
        return (series.clone(), 0);
    };

    let expected = usize::try_from(interval.steps_between(first, last) + 1).unwrap_or(0);
    let mut out = Vec::with_capacity(expected.max(series.len()));
    let mut synthesized = 0;
    let mut prev_close: Option<f64> = None;
    let mut next = first;

    for bar in series.bars() {
        if let Some(close) = prev_close {
            while next < bar.timestamp {
                out.push(Bar::flat(next, close));
                synthesized += 1;
                next = interval.step(next, 1);
            }
        }
        out.push(*bar);
        prev_close = Some(bar.close);
        next = interval.step(bar.timestamp, 1);
    }

    (BarSeries::from_bars(interval, out), synthesized)
}

#[cfg(test)]
mod tests {
    use ohlc_ingestor::Interval;

    use super::*;
    use crate::gaps::find_series_gaps;

    const M: Interval = Interval::MINUTE;

    fn bar(ts: i64, close: f64, volume: f64) -> Bar {
        Bar::new(ts, close - 1.0, close + 1.0, close - 2.0, close, volume)
    }

    #[test]
    fn holes_get_flat_bars_at_previous_close() {
        let s = BarSeries::from_bars(M, vec![bar(0, 10.0, 5.0), bar(180, 12.0, 3.0)]);
        let (dense, added) = densify_counted(&s);

        assert_eq!(added, 2);
        assert_eq!(
            dense.bars(),
            &[
                bar(0, 10.0, 5.0),
                Bar::flat(60, 10.0),
                Bar::flat(120, 10.0),
                bar(180, 12.0, 3.0)
            ]
        );
        assert!(find_series_gaps(&dense).is_empty());
    }

    #[test]
    fn fill_tracks_the_latest_real_close() {
        let s = BarSeries::from_bars(
            M,
            vec![bar(0, 10.0, 1.0), bar(120, 11.0, 1.0), bar(240, 9.0, 1.0)],
        );
        let dense = densify(&s);
        assert_eq!(dense.get(60), Some(&Bar::flat(60, 10.0)));
        assert_eq!(dense.get(180), Some(&Bar::flat(180, 11.0)));
    }

    #[test]
    fn empty_and_dense_series_are_unchanged() {
        let empty = BarSeries::empty(M);
        assert_eq!(densify_counted(&empty), (empty.clone(), 0));

        let dense = BarSeries::from_bars(M, vec![bar(0, 1.0, 1.0), bar(60, 2.0, 1.0)]);
        assert_eq!(densify_counted(&dense), (dense.clone(), 0));
    }

    #[test]
    fn densify_is_idempotent() {
        let s = BarSeries::from_bars(M, vec![bar(0, 1.0, 1.0), bar(600, 2.0, 1.0)]);
        let once = densify(&s);
        assert_eq!(densify(&once), once);
        assert_eq!(once.len(), 11);
    }
}
