//! `%g`-style number formatting.
//!
//! Deltas, thresholds and float components print with a fixed number of
//! significant digits, trailing zeros removed, switching to scientific
//! notation for very large or very small magnitudes.

use core::fmt;

/// Significant digits used for single-precision values.
pub const FLOAT_PRECISION: usize = 6;

/// Significant digits used for half-precision values.
pub const HALF_PRECISION: usize = 4;

/// Display wrapper printing a float like C's `%.<precision>g`.
///
/// NaN prints as `nan` or `-nan` depending on the sign bit, infinities as
/// `inf` and `-inf`.
#[derive(Clone, Copy, Debug)]
pub struct General {
    value: f64,
    precision: usize,
}

impl General {
    /// Format `value` with `precision` significant digits (at least one).
    pub fn new(value: f64, precision: usize) -> Self {
        Self {
            value,
            precision: precision.max(1),
        }
    }

    /// Format a single-precision value with 6 significant digits.
    pub fn f32(value: f32) -> Self {
        Self::new(f64::from(value), FLOAT_PRECISION)
    }
}

impl fmt::Display for General {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.value;
        if v.is_nan() {
            return f.write_str(if v.is_sign_negative() { "-nan" } else { "nan" });
        }
        if v.is_infinite() {
            return f.write_str(if v < 0.0 { "-inf" } else { "inf" });
        }
        if v == 0.0 {
            return f.write_str(if v.is_sign_negative() { "-0" } else { "0" });
        }

        let precision = self.precision;
        // The exponent after rounding to `precision` digits decides the style
        let scientific = format!("{:.*e}", precision - 1, v);
        let (mantissa, exponent) = scientific
            .split_once('e')
            .unwrap_or((scientific.as_str(), "0"));
        let exponent: i32 = exponent.parse().unwrap_or(0);

        if exponent < -4 || exponent >= precision as i32 {
            let sign = if exponent < 0 { '-' } else { '+' };
            write!(
                f,
                "{}e{}{:02}",
                trim_fraction(mantissa),
                sign,
                exponent.unsigned_abs()
            )
        } else {
            let decimals = (precision as i32 - 1 - exponent) as usize;
            let fixed = format!("{v:.decimals$}");
            f.write_str(trim_fraction(&fixed))
        }
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
