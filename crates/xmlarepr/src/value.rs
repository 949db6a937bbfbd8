//! Canonicalization of cell values onto XML Schema types.
//!
//! The query layer hands back scalars of whatever width it happened to
//! compute with; the wire format wants a stable `xsi:type` per cell. The
//! mapping must never lose precision: a value that cannot be represented
//! exactly as any integral type goes out as the best lossless
//! decimal/double form instead.

use num_traits::ToPrimitive;

use crate::datum::Datum;
use crate::xsd::XsdType;

/// Closed 32-bit range test for `xsd:int`.
pub fn is_valid_xsd_int(v: i128) -> bool {
    (i32::MIN as i128..=i32::MAX as i128).contains(&v)
}

fn fits_i64(v: i128) -> bool {
    (i64::MIN as i128..=i64::MAX as i128).contains(&v)
}

/// Declared type of a measure, as hinted by the metadata layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    Integer,
    Numeric,
}

impl TypeHint {
    /// Maps the internal type name of a measure onto a hint. Unknown
    /// names mean no hint: classify by the value itself.
    pub fn from_internal_type(name: &str) -> Option<TypeHint> {
        match name {
            "Integer" => Some(TypeHint::Integer),
            "Numeric" => Some(TypeHint::Numeric),
            _ => None,
        }
    }
}

/// Canonical (XSD type, value) pair for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInfo {
    pub xsd_type: XsdType,
    pub value: Datum,
    pub is_decimal: bool,
}

impl ValueInfo {
    pub fn new(hint: Option<TypeHint>, value: Datum) -> ValueInfo {
        // Booleans go out verbatim no matter what the measure claims.
        if matches!(value, Datum::Bool(_)) {
            return ValueInfo {
                xsd_type: XsdType::Boolean,
                value,
                is_decimal: false,
            };
        }
        match hint {
            Some(TypeHint::Integer) => Self::integer_hinted(value),
            Some(TypeHint::Numeric) => Self::numeric_hinted(value),
            None => Self::untyped(value),
        }
    }

    fn exact(xsd_type: XsdType, value: Datum) -> ValueInfo {
        ValueInfo {
            xsd_type,
            value,
            is_decimal: false,
        }
    }

    fn decimal(xsd_type: XsdType, value: Datum) -> ValueInfo {
        ValueInfo {
            xsd_type,
            value,
            is_decimal: true,
        }
    }

    /// Narrowest exact integral representation, falling through to
    /// decimal/double when the value is not integral.
    fn integer_hinted(value: Datum) -> ValueInfo {
        match value {
            Datum::Int32(_) => Self::exact(XsdType::Int, value),
            Datum::Int8(_) => Self::exact(XsdType::Byte, value),
            Datum::Int16(_) => Self::exact(XsdType::Short, value),
            Datum::Int64(v) => {
                if is_valid_xsd_int(v as i128) {
                    Self::exact(XsdType::Int, value)
                } else {
                    Self::exact(XsdType::Long, value)
                }
            }
            Datum::Int128(v) => Self::integral(v),
            Datum::Float32(v) => {
                let d = v as f64;
                match exact_integral_f64(d) {
                    Some(i) => Self::integral(i),
                    None => Self::decimal(XsdType::Float, value),
                }
            }
            Datum::Float64(v) => match exact_integral_f64(v) {
                Some(i) => Self::integral(i),
                None => Self::decimal(XsdType::Double, value),
            },
            Datum::Decimal(d) => match d.to_integral_exact() {
                Some(i) => Self::integral(i),
                None => Self::untyped_decimal(d),
            },
            Datum::Text(_) => Self::exact(XsdType::String, value),
            Datum::DateTime(_) => Self::exact(XsdType::DateTime, value),
            Datum::Null | Datum::Bool(_) => Self::exact(XsdType::String, value),
        }
    }

    /// Prefer double. Integrals upcast; a decimal upcasts only when the
    /// round trip through double is exact.
    fn numeric_hinted(value: Datum) -> ValueInfo {
        match value {
            Datum::Int8(v) => Self::decimal(XsdType::Double, Datum::Float64(v as f64)),
            Datum::Int16(v) => Self::decimal(XsdType::Double, Datum::Float64(v as f64)),
            Datum::Int32(v) => Self::decimal(XsdType::Double, Datum::Float64(v as f64)),
            Datum::Int64(v) => Self::decimal(XsdType::Double, Datum::Float64(v as f64)),
            Datum::Int128(v) => Self::decimal(XsdType::Double, Datum::Float64(v as f64)),
            Datum::Float32(_) => Self::decimal(XsdType::Float, value),
            Datum::Float64(_) => Self::decimal(XsdType::Double, value),
            Datum::Decimal(d) => Self::untyped_decimal(d),
            Datum::Text(_) => Self::exact(XsdType::String, value),
            Datum::DateTime(_) => Self::exact(XsdType::DateTime, value),
            Datum::Null | Datum::Bool(_) => Self::exact(XsdType::String, value),
        }
    }

    /// No hint: classify by the value's own representation.
    fn untyped(value: Datum) -> ValueInfo {
        match value {
            Datum::Text(_) => Self::exact(XsdType::String, value),
            Datum::Int8(_) => Self::exact(XsdType::Byte, value),
            Datum::Int16(_) => Self::exact(XsdType::Short, value),
            Datum::Int32(_) => Self::exact(XsdType::Int, value),
            Datum::Int64(_) => Self::exact(XsdType::Long, value),
            Datum::Int128(v) => {
                if fits_i64(v) {
                    // Collapse to the 64-bit form.
                    Self::exact(XsdType::Long, Datum::Int64(v as i64))
                } else {
                    Self::exact(XsdType::Integer, value)
                }
            }
            Datum::Float32(_) => Self::decimal(XsdType::Float, value),
            Datum::Float64(_) => Self::decimal(XsdType::Double, value),
            Datum::Decimal(d) => Self::untyped_decimal(d),
            Datum::DateTime(_) => Self::exact(XsdType::DateTime, value),
            Datum::Null | Datum::Bool(_) => Self::exact(XsdType::String, value),
        }
    }

    /// Narrowest tag for an exact integral value.
    fn integral(v: i128) -> ValueInfo {
        if is_valid_xsd_int(v) {
            Self::exact(XsdType::Int, Datum::Int32(v as i32))
        } else if fits_i64(v) {
            Self::exact(XsdType::Long, Datum::Int64(v as i64))
        } else {
            Self::exact(XsdType::Integer, Datum::Int128(v))
        }
    }

    /// Lossless-round-trip test: a decimal exactly representable as a
    /// double goes out as that double, otherwise it stays a decimal.
    fn untyped_decimal(d: crate::decimal::Decimal) -> ValueInfo {
        if d.roundtrips_through_f64() {
            Self::decimal(XsdType::Double, Datum::Float64(d.to_f64()))
        } else {
            Self::decimal(XsdType::Decimal, Datum::Decimal(d))
        }
    }
}

/// The exact integral value of a double, when it has one. Values at or
/// past 2^63 in magnitude are not "integral" for our purposes since they
/// cannot be held exactly by any integer the wire knows about.
fn exact_integral_f64(v: f64) -> Option<i128> {
    if !v.is_finite() || v.fract() != 0.0 {
        return None;
    }
    if v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return None;
    }
    v.to_i128()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::decimal::Decimal;

    fn canon(hint: Option<TypeHint>, value: Datum) -> ValueInfo {
        ValueInfo::new(hint, value)
    }

    #[test]
    fn xsd_int_boundaries() {
        assert!(is_valid_xsd_int(2147483647));
        assert!(!is_valid_xsd_int(2147483648));
        assert!(is_valid_xsd_int(-2147483648));
        assert!(!is_valid_xsd_int(-2147483649));
    }

    #[test]
    fn untyped_classification() {
        assert_eq!(
            canon(None, Datum::Text("a".into())).xsd_type,
            XsdType::String
        );
        assert_eq!(canon(None, Datum::Int32(7)).xsd_type, XsdType::Int);
        assert_eq!(canon(None, Datum::Int8(7)).xsd_type, XsdType::Byte);
        assert_eq!(canon(None, Datum::Int16(7)).xsd_type, XsdType::Short);
        assert_eq!(canon(None, Datum::Int64(7)).xsd_type, XsdType::Long);
        assert_eq!(canon(None, Datum::Float32(0.5)).xsd_type, XsdType::Float);
        assert_eq!(canon(None, Datum::Float64(0.5)).xsd_type, XsdType::Double);
    }

    #[test]
    fn untyped_bigint_collapses_when_it_fits() {
        let info = canon(None, Datum::Int128(42));
        assert_eq!(info.xsd_type, XsdType::Long);
        assert_eq!(info.value, Datum::Int64(42));

        let wide = i64::MAX as i128 + 1;
        let info = canon(None, Datum::Int128(wide));
        assert_eq!(info.xsd_type, XsdType::Integer);
        assert_eq!(info.value, Datum::Int128(wide));
    }

    #[test]
    fn decimal_roundtrip_through_double() {
        let d = Decimal::from_str("0.5").unwrap();
        let info = canon(None, Datum::Decimal(d));
        assert_eq!(info.xsd_type, XsdType::Double);
        assert_eq!(info.value, Datum::Float64(0.5));
        assert!(info.is_decimal);

        let d = Decimal::from_str("0.10000000000000000001").unwrap();
        let info = canon(None, Datum::Decimal(d));
        assert_eq!(info.xsd_type, XsdType::Decimal);
        assert_eq!(info.value, Datum::Decimal(d));
        assert!(info.is_decimal);
    }

    #[test]
    fn integer_hint_prefers_narrowest() {
        assert_eq!(
            canon(Some(TypeHint::Integer), Datum::Int64(12)).xsd_type,
            XsdType::Int
        );
        assert_eq!(
            canon(Some(TypeHint::Integer), Datum::Int64(1 << 40)).xsd_type,
            XsdType::Long
        );
        assert_eq!(
            canon(Some(TypeHint::Integer), Datum::Float64(3.0)),
            ValueInfo {
                xsd_type: XsdType::Int,
                value: Datum::Int32(3),
                is_decimal: false,
            }
        );
        // Not integral: falls through to double.
        let info = canon(Some(TypeHint::Integer), Datum::Float64(3.5));
        assert_eq!(info.xsd_type, XsdType::Double);
        assert!(info.is_decimal);

        let d = Decimal::from_str("100.00").unwrap();
        let info = canon(Some(TypeHint::Integer), Datum::Decimal(d));
        assert_eq!(info.xsd_type, XsdType::Int);
        assert_eq!(info.value, Datum::Int32(100));
    }

    #[test]
    fn numeric_hint_upcasts() {
        let info = canon(Some(TypeHint::Numeric), Datum::Int32(5));
        assert_eq!(info.xsd_type, XsdType::Double);
        assert_eq!(info.value, Datum::Float64(5.0));

        let d = Decimal::from_str("0.10000000000000000001").unwrap();
        let info = canon(Some(TypeHint::Numeric), Datum::Decimal(d));
        assert_eq!(info.xsd_type, XsdType::Decimal);
        assert_eq!(info.value, Datum::Decimal(d));
    }

    #[test]
    fn booleans_verbatim_regardless_of_hint() {
        for hint in [None, Some(TypeHint::Integer), Some(TypeHint::Numeric)] {
            let info = canon(hint, Datum::Bool(true));
            assert_eq!(info.xsd_type, XsdType::Boolean);
            assert_eq!(info.value, Datum::Bool(true));
        }
    }

    #[test]
    fn canonicalization_is_idempotent() {
        let inputs = vec![
            (None, Datum::Int128(42)),
            (None, Datum::Decimal(Decimal::from_str("0.5").unwrap())),
            (
                None,
                Datum::Decimal(Decimal::from_str("0.10000000000000000001").unwrap()),
            ),
            (Some(TypeHint::Integer), Datum::Float64(3.0)),
            (Some(TypeHint::Integer), Datum::Float64(3.5)),
            (Some(TypeHint::Numeric), Datum::Int64(9)),
            (None, Datum::Text("x".into())),
        ];
        for (hint, value) in inputs {
            let once = ValueInfo::new(hint, value);
            let twice = ValueInfo::new(hint, once.value.clone());
            assert_eq!(once.xsd_type, twice.xsd_type);
            assert_eq!(once.value, twice.value);
        }
    }
}
