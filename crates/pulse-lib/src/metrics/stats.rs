//! Order statistics with fixed, library-independent definitions.

fn sorted(data: &[f64]) -> Vec<f64> {
    let mut values = data.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values
}

/// Classic median: middle element, or the mean of the two middle elements on
/// even length. Returns `None` for an empty slice.
pub fn median(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let values = sorted(data);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Percentile `p` (0–100) with linear interpolation between order statistics,
/// i.e. position `(n - 1) * p / 100` in the sorted samples.
pub fn percentile(data: &[f64], p: f64) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let values = sorted(data);
    let pos = (values.len() - 1) as f64 * p.clamp(0.0, 100.0) / 100.0;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(values[lo] + (values[hi] - values[lo]) * frac)
}

/// Sign of a real value as -1, 0 or +1.
pub fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn percentile_interpolates_between_order_statistics() {
        let data = [9.0, 5.0, 5.0, 5.0, 9.0, 5.0, 5.0, 5.0];
        // position 5.25 between 5.0 and 9.0
        assert!((percentile(&data, 75.0).unwrap() - 6.0).abs() < 1e-12);
        assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0, 5.0], 50.0), Some(3.0));
        assert_eq!(percentile(&[7.0], 75.0), Some(7.0));
    }

    #[test]
    fn percentile_extremes_are_min_and_max() {
        let data = [4.0, -2.0, 8.0, 1.0];
        assert_eq!(percentile(&data, 0.0), Some(-2.0));
        assert_eq!(percentile(&data, 100.0), Some(8.0));
    }

    #[test]
    fn upper_quartile_does_not_drop_when_larger_values_are_added() {
        let mut data = vec![3.0, 7.0, 1.0, 4.0, 4.0, 9.0, 2.0];
        let mut q3 = percentile(&data, 75.0).unwrap();
        for extra in [20.0, 25.0, 30.0, 100.0] {
            data.push(extra);
            let next = percentile(&data, 75.0).unwrap();
            assert!(next >= q3, "{} < {}", next, q3);
            q3 = next;
        }
    }

    #[test]
    fn sign_has_three_states() {
        assert_eq!(sign(2.5), 1);
        assert_eq!(sign(-0.1), -1);
        assert_eq!(sign(0.0), 0);
    }
}
