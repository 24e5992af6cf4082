//! Derived columns for the review-count study design.

use super::dataset::{DataError, Dataset};

/// Quantile boundary splitting the review count into low and high groups.
pub const REVIEW_HIGH_QUANTILE: f64 = 2.0 / 3.0;

/// Sample quantile with linear interpolation between order statistics.
///
/// Non-finite values are ignored; `None` if nothing finite remains.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    finite.sort_by(f64::total_cmp);

    let pos = q * (finite.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(finite[lo] + frac * (finite[hi] - finite[lo]))
}

/// 1.0 where the value lies above its `q` quantile, 0.0 otherwise.
///
/// Missing values fall in the low group.
pub fn quantile_indicator(values: &[f64], q: f64) -> Vec<f64> {
    match quantile(values, q) {
        Some(threshold) => values
            .iter()
            .map(|&v| if v > threshold { 1.0 } else { 0.0 })
            .collect(),
        None => vec![0.0; values.len()],
    }
}

/// Elementwise product of two columns.
pub fn interaction(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

/// Natural logarithm; non-positive inputs give non-finite results.
pub fn log(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.ln()).collect()
}

/// Add `review_high`, its interactions and `log_review_count`.
///
/// Requires `review_count`, `memory_score`, `average_hue`,
/// `sharpness_measure` and `person_total_count_x`.
pub fn prepare_review_features(data: &mut Dataset) -> Result<(), DataError> {
    let review_count = data.column("review_count")?.to_vec();
    let review_high = quantile_indicator(&review_count, REVIEW_HIGH_QUANTILE);

    let interactions = [
        ("memory_score_review_high", "memory_score"),
        ("average_hue_review_high", "average_hue"),
        ("sharpness_measure_review_high", "sharpness_measure"),
        ("person_total_count_review_high", "person_total_count_x"),
    ];
    for (name, source) in interactions {
        let values = interaction(data.column(source)?, &review_high);
        data.add_column(name, values)?;
    }

    data.add_column("review_high", review_high)?;
    data.add_column("log_review_count", log(&review_count))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(4.0));
        assert!((quantile(&values, 2.0 / 3.0).unwrap() - 3.0).abs() < 1e-12);
        assert!((quantile(&values, 0.5).unwrap() - 2.5).abs() < 1e-12);
        assert_eq!(quantile(&[f64::NAN], 0.5), None);
    }

    #[test]
    fn test_quantile_indicator_splits_top_third() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let high = quantile_indicator(&values, REVIEW_HIGH_QUANTILE);
        // 2/3 quantile of 1..=9 is 6.333.., so 7, 8, 9 are high
        assert_eq!(high, vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_log_of_non_positive_is_not_finite() {
        let logged = log(&[std::f64::consts::E, 0.0, -1.0]);
        assert!((logged[0] - 1.0).abs() < 1e-12);
        assert!(!logged[1].is_finite());
        assert!(!logged[2].is_finite());
    }

    #[test]
    fn test_prepare_review_features() {
        let mut data = Dataset::from_columns([
            ("review_count", vec![1.0, 10.0, 100.0]),
            ("memory_score", vec![0.5, 0.6, 0.7]),
            ("average_hue", vec![0.1, 0.2, 0.3]),
            ("sharpness_measure", vec![2.0, 3.0, 4.0]),
            ("person_total_count_x", vec![1.0, 2.0, 3.0]),
        ])
        .unwrap();

        prepare_review_features(&mut data).unwrap();

        assert_eq!(data.column("review_high").unwrap(), [0.0, 0.0, 1.0]);
        assert_eq!(data.column("memory_score_review_high").unwrap(), [0.0, 0.0, 0.7]);
        assert_eq!(data.column("person_total_count_review_high").unwrap(), [0.0, 0.0, 3.0]);
        let logs = data.column("log_review_count").unwrap();
        assert!((logs[2] - 100f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_requires_source_columns() {
        let mut data = Dataset::from_columns([("review_count", vec![1.0, 2.0])]).unwrap();
        assert!(matches!(
            prepare_review_features(&mut data),
            Err(DataError::UnknownColumn(_))
        ));
    }
}
