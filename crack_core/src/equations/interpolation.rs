//! # Sample Lookup and Interpolation
//!
//! Helpers on ascending position arrays: snapping a position to the nearest
//! sample and piecewise-linear interpolation with constant extrapolation.

/// Index and value of the entry of `arr` closest to `v`.
///
/// `arr` must be ascending. On equal distance to both neighbours the smaller
/// entry is chosen. Returns `None` for an empty array.
///
/// ```rust
/// use crack_core::equations::interpolation::find_closest_value;
///
/// let x = [0.0, 1.0, 2.0];
/// assert_eq!(find_closest_value(&x, 1.4), Some((1, 1.0)));
/// assert_eq!(find_closest_value(&x, 1.5), Some((1, 1.0)));
/// assert_eq!(find_closest_value(&x, f64::INFINITY), Some((2, 2.0)));
/// ```
pub fn find_closest_value(arr: &[f64], v: f64) -> Option<(usize, f64)> {
    if arr.is_empty() {
        return None;
    }
    let i = arr.partition_point(|&a| a < v);
    let i = if i == 0 {
        0
    } else if i == arr.len() {
        i - 1
    } else {
        let dist_l = (v - arr[i - 1]).abs();
        let dist_r = (v - arr[i]).abs();
        if dist_r < dist_l {
            i
        } else {
            i - 1
        }
    };
    Some((i, arr[i]))
}

/// Linear interpolation of `(xp, fp)` evaluated at a single point.
///
/// `xp` must be ascending. Outside `[xp[0], xp[last]]` the outermost value is
/// held constant. Returns `None` if `xp` is empty or `fp` is shorter than
/// `xp`, and NaN for a NaN `xi`.
///
/// ```rust
/// use crack_core::equations::interpolation::interp_at;
///
/// assert_eq!(interp_at(0.5, &[0.0, 1.0], &[0.0, 10.0]), Some(5.0));
/// assert_eq!(interp_at(0.5, &[], &[]), None);
/// ```
pub fn interp_at(xi: f64, xp: &[f64], fp: &[f64]) -> Option<f64> {
    if xp.is_empty() || fp.len() < xp.len() {
        return None;
    }
    if xi.is_nan() {
        return Some(f64::NAN);
    }
    let last = xp.len() - 1;
    if xi <= xp[0] {
        return Some(fp[0]);
    }
    if xi >= xp[last] {
        return Some(fp[last]);
    }
    // xp[j - 1] <= xi < xp[j]
    let j = xp.partition_point(|&p| p <= xi);
    let (x0, x1) = (xp[j - 1], xp[j]);
    let (f0, f1) = (fp[j - 1], fp[j]);
    Some(f0 + (f1 - f0) * (xi - x0) / (x1 - x0))
}

/// Linear interpolation of `(xp, fp)` at every entry of `x`.
///
/// Returns an empty vector if `xp` is empty or `fp` is shorter than `xp`.
pub fn interp(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&xi| interp_at(xi, xp, fp))
        .collect::<Option<Vec<f64>>>()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_closest_ties_toward_smaller() {
        let x = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(find_closest_value(&x, 0.5), Some((0, 0.0)));
        assert_eq!(find_closest_value(&x, 2.5), Some((2, 2.0)));
        assert_eq!(find_closest_value(&x, 2.51), Some((3, 3.0)));
    }

    #[test]
    fn test_closest_outside_range() {
        let x = [1.0, 2.0];
        assert_eq!(find_closest_value(&x, -5.0), Some((0, 1.0)));
        assert_eq!(find_closest_value(&x, f64::NEG_INFINITY), Some((0, 1.0)));
        assert_eq!(find_closest_value(&x, 9.0), Some((1, 2.0)));
        assert_eq!(find_closest_value(&[], 1.0), None);
    }

    #[test]
    fn test_closest_exact_hit() {
        let x = [0.0, 0.25, 0.5];
        assert_eq!(find_closest_value(&x, 0.25), Some((1, 0.25)));
    }

    #[test]
    fn test_interp_inside_and_outside() {
        let xp = [1.0, 3.0];
        let fp = [10.0, 30.0];
        let values = interp(&[0.0, 1.0, 2.0, 3.0, 4.0], &xp, &fp);
        let expected = [10.0, 10.0, 20.0, 30.0, 30.0];
        for (v, e) in values.iter().zip(expected.iter()) {
            assert!(approx_eq(*v, *e), "{} != {}", v, e);
        }
    }

    #[test]
    fn test_interp_multiple_segments() {
        let xp = [0.0, 1.0, 3.0];
        let fp = [0.0, 100.0, 0.0];
        assert!(approx_eq(interp_at(0.5, &xp, &fp).unwrap(), 50.0));
        assert!(approx_eq(interp_at(2.0, &xp, &fp).unwrap(), 50.0));
        assert!(approx_eq(interp_at(1.0, &xp, &fp).unwrap(), 100.0));
    }

    #[test]
    fn test_interp_empty() {
        assert!(interp(&[1.0], &[], &[]).is_empty());
    }

    #[test]
    fn test_interp_at_rejects_bad_tables() {
        assert_eq!(interp_at(1.0, &[], &[]), None);
        assert_eq!(interp_at(1.0, &[0.0, 2.0], &[5.0]), None);
        assert!(interp(&[1.0], &[0.0, 2.0], &[5.0]).is_empty());
        assert!(interp_at(f64::NAN, &[0.0, 2.0], &[5.0, 7.0]).unwrap().is_nan());
        assert_eq!(interp_at(-1.0, &[0.0], &[3.0]), Some(3.0));
    }
}
