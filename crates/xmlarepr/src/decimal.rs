//! A 128-bit scaled decimal.
//!
//! Stands in for arbitrary-precision decimals coming out of the metadata
//! layer: a signed 128-bit mantissa with a base-10 scale. 38 significant
//! digits is well past anything the wire format needs to carry exactly.

use std::fmt;
use std::str::FromStr;

use crate::error::{ReprError, Result};

/// Maximum number of fractional digits a decimal can carry.
pub const MAX_SCALE: u8 = 38;

/// Scaled decimal value: `mantissa * 10^(-scale)`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    mantissa: i128,
    scale: u8,
}

impl Decimal {
    pub fn new(mantissa: i128, scale: u8) -> Result<Decimal> {
        if scale > MAX_SCALE {
            return Err(ReprError::UnsupportedScale(scale as i64));
        }
        Ok(Decimal { mantissa, scale })
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Strip trailing zeros from the fractional part. `5.00` and `5` are
    /// the same number; comparisons and integral checks go through this.
    pub fn normalized(&self) -> Decimal {
        let mut mantissa = self.mantissa;
        let mut scale = self.scale;
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Decimal { mantissa, scale }
    }

    /// The exact integral value, if the fractional part is zero.
    pub fn to_integral_exact(&self) -> Option<i128> {
        let norm = self.normalized();
        if norm.scale == 0 {
            Some(norm.mantissa)
        } else {
            None
        }
    }

    /// Nearest double. Lossy for values with more significant digits than
    /// a double can hold; see [`Decimal::roundtrips_through_f64`].
    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 / 10f64.powi(self.scale as i32)
    }

    /// Whether converting to a double and back yields the same number.
    ///
    /// "Back" uses the shortest round-trip rendering of the double, so a
    /// decimal equals its double exactly when the double's canonical
    /// decimal form is numerically equal to it. Trailing zeros do not
    /// count as a difference.
    pub fn roundtrips_through_f64(&self) -> bool {
        let d = self.to_f64();
        if !d.is_finite() {
            return false;
        }
        match Decimal::from_str(&d.to_string()) {
            Ok(back) => back == *self,
            Err(_) => false,
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Decimal) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        a.mantissa == b.mantissa && a.scale == b.scale
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mantissa < 0 {
            write!(f, "-")?;
        }
        let abs = self.mantissa.unsigned_abs();
        if self.scale == 0 {
            return write!(f, "{}", abs);
        }
        let digits = abs.to_string();
        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            write!(f, "{}.{}", int_part, frac_part)
        } else {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    }
}

impl FromStr for Decimal {
    type Err = ReprError;

    fn from_str(s: &str) -> Result<Decimal> {
        let trimmed = s.trim();
        let (neg, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ReprError::InvalidDecimal(s.to_string()));
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ReprError::InvalidDecimal(s.to_string()));
        }
        if frac_part.len() > MAX_SCALE as usize {
            return Err(ReprError::UnsupportedScale(frac_part.len() as i64));
        }

        let mut mantissa: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((b - b'0') as i128))
                .ok_or_else(|| ReprError::DecimalOutOfRange(s.to_string()))?;
        }
        if neg {
            mantissa = -mantissa;
        }

        Decimal::new(mantissa, frac_part.len() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(dec("123.45").to_string(), "123.45");
        assert_eq!(dec("-0.5").to_string(), "-0.5");
        assert_eq!(dec("0.0005").to_string(), "0.0005");
        assert_eq!(dec("42").to_string(), "42");
        assert_eq!(dec("+7.10").to_string(), "7.10");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Decimal::from_str("").is_err());
        assert!(Decimal::from_str(".").is_err());
        assert!(Decimal::from_str("12a.3").is_err());
        assert!(Decimal::from_str("1e5").is_err());
    }

    #[test]
    fn numeric_equality_ignores_trailing_zeros() {
        assert_eq!(dec("5.00"), dec("5"));
        assert_eq!(dec("0.50"), dec("0.5"));
        assert_ne!(dec("0.50"), dec("0.55"));
    }

    #[test]
    fn integral_exact() {
        assert_eq!(dec("5.00").to_integral_exact(), Some(5));
        assert_eq!(dec("-17").to_integral_exact(), Some(-17));
        assert_eq!(dec("5.01").to_integral_exact(), None);
    }

    #[test]
    fn f64_roundtrip() {
        // 0.5 is exactly representable.
        assert!(dec("0.5").roundtrips_through_f64());
        assert!(dec("123456.75").roundtrips_through_f64());
        // 0.1 renders back as "0.1", so it round-trips in the
        // shortest-rendering sense.
        assert!(dec("0.1").roundtrips_through_f64());
        // More significant digits than a double can hold.
        assert!(!dec("0.10000000000000000001").roundtrips_through_f64());
        assert!(!dec("12345678901234567890123456789").roundtrips_through_f64());
    }
}
