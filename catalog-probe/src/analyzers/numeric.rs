//! Numeric distribution summary: quartiles, IQR fences and outlier counting.

use serde::{Deserialize, Serialize};

use super::value::SampleValue;

/// Multiplier applied to the IQR when placing outlier fences.
pub const FENCE_MULTIPLIER: f64 = 1.5;

/// Distribution statistics over the numeric-coercible part of a sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    /// Number of values that coerced to a finite number
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Values strictly outside `[lower_fence, upper_fence]`
    pub outlier_count: usize,
}

/// Summarizes the numeric-coercible subset of `values`.
///
/// Values that do not coerce (see [`SampleValue::as_f64`]) are skipped. Returns
/// `None` when nothing coerces.
pub fn summarize_numeric<'a>(
    values: impl IntoIterator<Item = &'a SampleValue>,
) -> Option<NumericSummary> {
    let mut numbers: Vec<f64> = values.into_iter().filter_map(SampleValue::as_f64).collect();
    if numbers.is_empty() {
        return None;
    }
    numbers.sort_by(f64::total_cmp);
    summarize_sorted(&numbers)
}

/// Summary over values that are already sorted ascending and finite.
///
/// Every statistic stays finite: spreads that exceed the `f64` range
/// saturate at `f64::MAX`.
pub fn summarize_sorted(sorted: &[f64]) -> Option<NumericSummary> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let count = sorted.len();
    let mean = mean_of(sorted, count as f64).clamp(min, max);

    let p25 = percentile(sorted, 25.0)?;
    let p50 = percentile(sorted, 50.0)?;
    let p75 = percentile(sorted, 75.0)?;
    let iqr = saturate(p75 - p25);
    let lower_fence = saturate(p25 - FENCE_MULTIPLIER * iqr);
    let upper_fence = saturate(p75 + FENCE_MULTIPLIER * iqr);
    let outlier_count = sorted
        .iter()
        .filter(|&&v| v < lower_fence || v > upper_fence)
        .count();

    Some(NumericSummary {
        count,
        min,
        max,
        mean,
        p25,
        p50,
        p75,
        iqr,
        lower_fence,
        upper_fence,
        outlier_count,
    })
}

/// Percentile at rank `p` (0-100) with linear interpolation between neighbours.
///
/// `sorted` must be ascending and finite. Returns `None` for an empty slice.
/// The result always lies between the two neighbours it interpolates.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let position = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
    let lower_index = position.floor() as usize;
    let upper_index = position.ceil() as usize;
    let fraction = position - position.floor();

    if lower_index == upper_index {
        return Some(sorted[lower_index]);
    }

    let lower = sorted[lower_index];
    let upper = sorted[upper_index];
    let span = upper - lower;
    let value = if span.is_finite() {
        lower + span * fraction
    } else {
        // neighbours of opposite sign near the range limits
        lower * (1.0 - fraction) + upper * fraction
    };
    Some(value.max(lower).min(upper))
}

fn mean_of(sorted: &[f64], count: f64) -> f64 {
    let sum: f64 = sorted.iter().sum();
    if sum.is_finite() {
        sum / count
    } else {
        sorted.iter().map(|v| v / count).sum()
    }
}

/// Maps an overflowed result back onto the largest finite value of its sign.
fn saturate(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else if value.is_sign_negative() {
        f64::MIN
    } else {
        f64::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<SampleValue> {
        values.iter().copied().map(SampleValue::Integer).collect()
    }

    #[test]
    fn test_reference_sample_with_one_outlier() {
        let values = ints(&[10, 10, 20, 20, 30, 30, 40, 40, 50, 100]);
        let summary = summarize_numeric(&values).unwrap();

        assert_eq!(summary.min, 10.0);
        assert_eq!(summary.max, 100.0);
        assert_eq!(summary.mean, 35.0);
        assert_eq!(summary.p25, 20.0);
        assert_eq!(summary.p50, 30.0);
        assert_eq!(summary.p75, 40.0);
        assert_eq!(summary.iqr, 20.0);
        assert_eq!(summary.lower_fence, -10.0);
        assert_eq!(summary.upper_fence, 70.0);
        assert_eq!(summary.outlier_count, 1);
    }

    #[test]
    fn test_constant_column() {
        let values = ints(&[7; 10]);
        let summary = summarize_numeric(&values).unwrap();

        assert_eq!(summary.min, 7.0);
        assert_eq!(summary.max, 7.0);
        assert_eq!(summary.mean, 7.0);
        assert_eq!(summary.p25, 7.0);
        assert_eq!(summary.p50, 7.0);
        assert_eq!(summary.p75, 7.0);
        assert_eq!(summary.iqr, 0.0);
        assert_eq!(summary.lower_fence, 7.0);
        assert_eq!(summary.upper_fence, 7.0);
        assert_eq!(summary.outlier_count, 0);
    }

    #[test]
    fn test_single_value_for_every_percentile() {
        let sorted = [4.0];
        assert_eq!(percentile(&sorted, 0.0), Some(4.0));
        assert_eq!(percentile(&sorted, 50.0), Some(4.0));
        assert_eq!(percentile(&sorted, 100.0), Some(4.0));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn test_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        // position = 0.25 * 3 = 0.75
        assert_eq!(percentile(&sorted, 25.0), Some(1.75));
        assert_eq!(percentile(&sorted, 50.0), Some(2.5));
        assert_eq!(percentile(&sorted, 100.0), Some(4.0));
    }

    #[test]
    fn test_text_coerces_and_garbage_is_skipped() {
        let values = vec![
            SampleValue::Text("1.5".into()),
            SampleValue::Text("n/a".into()),
            SampleValue::Float(2.5),
            SampleValue::Boolean(true),
            SampleValue::Null,
        ];
        let summary = summarize_numeric(&values).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, 2.0);
    }

    #[test]
    fn test_extreme_spread_stays_finite() {
        let values = vec![SampleValue::Float(-1e308), SampleValue::Float(1e308)];
        let summary = summarize_numeric(&values).unwrap();

        let close = |a: f64, b: f64| ((a - b) / b).abs() < 1e-12;
        assert!(close(summary.p25, -5e307));
        assert_eq!(summary.p50, 0.0);
        assert!(close(summary.p75, 5e307));
        assert!(summary.p75 <= summary.max);
        assert!(close(summary.iqr, 1e308));
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.lower_fence, f64::MIN);
        assert_eq!(summary.upper_fence, f64::MAX);
        assert!(summary.lower_fence <= summary.p25);
        assert_eq!(summary.outlier_count, 0);

        let json = serde_json::to_value(&summary).unwrap();
        for key in ["p25", "p50", "p75", "iqr", "lower_fence", "upper_fence", "mean"] {
            assert!(json[key].is_f64(), "{key} is not a number");
        }
    }

    #[test]
    fn test_mean_of_huge_values() {
        let values = vec![SampleValue::Float(1e308), SampleValue::Float(1e308)];
        let summary = summarize_numeric(&values).unwrap();
        assert_eq!(summary.mean, 1e308);
        assert_eq!(summary.p50, 1e308);

        let mixed = vec![SampleValue::Float(f64::MAX), SampleValue::Float(f64::MAX), SampleValue::Float(0.0)];
        let summary = summarize_numeric(&mixed).unwrap();
        assert!(summary.mean.is_finite());
        assert!(summary.mean <= summary.max);
    }

    #[test]
    fn test_no_numeric_values() {
        let values = vec![SampleValue::Text("OPEN".into()), SampleValue::Null];
        assert!(summarize_numeric(&values).is_none());
    }
}
