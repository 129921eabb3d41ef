//! Acceptance thresholds.

/// Max and mean delta a comparison accepts.
///
/// Both values are finite, non-negative, and the mean threshold is never
/// above the max threshold. [`Thresholds::exact()`] (the default) accepts
/// only identical images.
///
/// ```
/// use zencompare::Thresholds;
///
/// let thresholds = Thresholds::new(40.0, 20.0);
/// assert_eq!(thresholds.max(), 40.0);
/// assert_eq!(Thresholds::default(), Thresholds::exact());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    max: f32,
    mean: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::exact()
    }
}

impl Thresholds {
    /// Zero max and mean threshold.
    pub const fn exact() -> Self {
        Self {
            max: 0.0,
            mean: 0.0,
        }
    }

    /// Create thresholds for the max and the mean delta.
    ///
    /// # Panics
    ///
    /// Panics if either value is NaN, infinite or negative, or if `mean`
    /// is larger than `max`.
    pub fn new(max: f32, mean: f32) -> Self {
        assert!(
            max.is_finite() && mean.is_finite(),
            "thresholds can't be NaN or infinity"
        );
        assert!(max >= 0.0 && mean >= 0.0, "thresholds can't be negative");
        assert!(
            mean <= max,
            "max threshold can't be smaller than mean threshold"
        );
        Self { max, mean }
    }

    /// Largest accepted per-pixel delta.
    #[inline]
    pub const fn max(self) -> f32 {
        self.max
    }

    /// Largest accepted mean delta.
    #[inline]
    pub const fn mean(self) -> f32 {
        self.mean
    }

    /// Pixels with a delta above this are listed as outliers.
    #[inline]
    pub(crate) fn outlier_cutoff(self) -> f32 {
        self.max.min(self.mean)
    }
}
