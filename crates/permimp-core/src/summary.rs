//! Mergeable summary statistics over repetition importances.

/// Count, sum, variance accumulator, and range of a set of values.
///
/// [`merge`](Self::merge) combines two summaries with the pairwise update of
/// Chan et al., so partial summaries can be reduced in any grouping. The mean
/// is `sum / count`, so a run of infinite values keeps an infinite mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    count: usize,
    sum: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Default for Summary {
    fn default() -> Self {
        Self::empty()
    }
}

impl Summary {
    /// A summary of no values.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    /// A summary of one value.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        Self {
            count: 1,
            sum: value,
            m2: 0.0,
            min: value,
            max: value,
        }
    }

    /// Add one value.
    pub fn push(&mut self, value: f64) {
        *self = self.merge(&Self::from_value(value));
    }

    /// Combine two summaries.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        if self.count == 0 {
            return *other;
        }
        if other.count == 0 {
            return *self;
        }
        let count = self.count + other.count;
        let (n_a, n_b, n) = (self.count as f64, other.count as f64, count as f64);
        // inf - inf: equal infinite means contribute no spread.
        let delta = match other.mean() - self.mean() {
            d if d.is_nan() && self.mean() == other.mean() => 0.0,
            d => d,
        };
        Self {
            count,
            sum: self.sum + other.sum,
            m2: self.m2 + other.m2 + delta * delta * n_a * n_b / n,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Number of values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Arithmetic mean, 0.0 when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Population variance (ddof = 0), 0.0 when empty.
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation.
    #[must_use]
    pub fn std(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Smallest value, `+inf` when empty.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value, `-inf` when empty.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl FromIterator<f64> for Summary {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut summary = Self::empty();
        for value in iter {
            summary.push(value);
        }
        summary
    }
}

/// Linearly interpolated quantile of `sorted` (ascending), `q` in [0, 1].
///
/// Returns NaN for an empty slice.
pub(crate) fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            if sorted[lo] == sorted[hi] {
                return sorted[lo];
            }
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn known_values() {
        let s: Summary = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert_eq!(s.count(), 8);
        assert!((s.mean() - 5.0).abs() < EPS);
        assert!((s.variance() - 4.0).abs() < EPS);
        assert!((s.std() - 2.0).abs() < EPS);
        assert_eq!(s.min(), 2.0);
        assert_eq!(s.max(), 9.0);
    }

    #[test]
    fn merge_matches_sequential() {
        let values = [0.3, 1.7, -2.0, 4.4, 0.0, 3.3, 9.1, -0.5];
        let whole: Summary = values.into_iter().collect();
        let left: Summary = values[..3].iter().copied().collect();
        let right: Summary = values[3..].iter().copied().collect();
        let merged = left.merge(&right);
        assert_eq!(merged.count(), whole.count());
        assert!((merged.mean() - whole.mean()).abs() < EPS);
        assert!((merged.variance() - whole.variance()).abs() < 1e-10);
        assert_eq!(merged.min(), whole.min());
        assert_eq!(merged.max(), whole.max());
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        let a: Summary = [1.0, 2.0].into_iter().collect();
        let b: Summary = [10.0].into_iter().collect();
        let c: Summary = [-3.0, 0.5, 8.0].into_iter().collect();
        let ab_c = a.merge(&b).merge(&c);
        let a_bc = a.merge(&b.merge(&c));
        let c_ba = c.merge(&b.merge(&a));
        for other in [a_bc, c_ba] {
            assert_eq!(other.count(), ab_c.count());
            assert!((other.mean() - ab_c.mean()).abs() < EPS);
            assert!((other.variance() - ab_c.variance()).abs() < 1e-10);
        }
    }

    #[test]
    fn empty_is_identity() {
        let a: Summary = [1.0, 3.0].into_iter().collect();
        assert_eq!(a.merge(&Summary::empty()), a);
        assert_eq!(Summary::empty().merge(&a), a);
        assert_eq!(Summary::empty().variance(), 0.0);
    }

    #[test]
    fn infinite_values_keep_infinite_mean() {
        let s: Summary = [f64::INFINITY; 4].into_iter().collect();
        assert_eq!(s.mean(), f64::INFINITY);
        assert_eq!(s.variance(), 0.0);
        assert_eq!(s.min(), f64::INFINITY);

        let mixed: Summary = [1.0, f64::INFINITY, 3.0].into_iter().collect();
        assert_eq!(mixed.mean(), f64::INFINITY);
        assert!(!mixed.mean().is_nan());
    }

    #[test]
    fn quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile_sorted(&sorted, 0.0), 1.0);
        assert_eq!(quantile_sorted(&sorted, 0.5), 3.0);
        assert_eq!(quantile_sorted(&sorted, 1.0), 5.0);
        assert!((quantile_sorted(&sorted, 0.05) - 1.2).abs() < EPS);
        assert!((quantile_sorted(&sorted, 0.95) - 4.8).abs() < EPS);
        assert_eq!(quantile_sorted(&[7.0], 0.3), 7.0);
        assert!(quantile_sorted(&[], 0.5).is_nan());
        assert_eq!(quantile_sorted(&[1.0, f64::INFINITY, f64::INFINITY], 0.95), f64::INFINITY);
    }
}
