//! Arbitrary-precision decimal amounts.
//!
//! Cosmos chains ship monetary values either as plain integer strings
//! (`Int`, e.g. token amounts), as 18-decimal fixed-point atomics (`Dec`,
//! e.g. delegator shares and rates) or, on zenrock networks, as display
//! strings with an optional fractional part. All three collapse into
//! [`Decimal`] before any collector sees them.

use std::{cmp::Ordering, ops::Add, str::FromStr};

use num::{
    bigint::{BigInt, Sign},
    pow,
    ToPrimitive,
};

use crate::error::{Error, Result};

/// Number of fractional digits in the SDK `Dec` wire representation.
pub const DEC_SCALE: u32 = 18;

/// An exact decimal number: `mantissa / 10^scale`.
#[derive(Debug, Clone, Default)]
pub struct Decimal {
    mantissa: BigInt,
    scale: u32,
}

impl Decimal {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Parse a decimal string with an optional sign and fractional part,
    /// e.g. `"1500000"` or `"123.456"`.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Build a decimal from an integer mantissa string and a fixed scale.
    ///
    /// This is the wire form of the SDK `Dec` type: the protobuf carries
    /// only the atomics, the decimal point is implied.
    pub fn from_atomics(mantissa: &str, scale: u32) -> Result<Self> {
        let mantissa = BigInt::from_str(mantissa.trim())
            .map_err(|err| Error::MalformedResponse(format!("bad decimal {mantissa:?}: {err}")))?;
        Ok(Self { mantissa, scale })
    }

    /// Convert to an `f64` with round-trip semantics; values too large for
    /// the type saturate to infinity.
    pub fn to_f64(&self) -> f64 {
        let mantissa = self.mantissa.to_f64().unwrap_or_else(|| {
            if self.mantissa.sign() == Sign::Minus {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            }
        });
        mantissa / 10f64.powi(self.scale as i32)
    }

    fn rescaled_mantissas(&self, other: &Self) -> (BigInt, BigInt) {
        match self.scale.cmp(&other.scale) {
            Ordering::Equal => (self.mantissa.clone(), other.mantissa.clone()),
            Ordering::Less => {
                let shift = pow(BigInt::from(10), (other.scale - self.scale) as usize);
                (&self.mantissa * shift, other.mantissa.clone())
            }
            Ordering::Greater => {
                let shift = pow(BigInt::from(10), (self.scale - other.scale) as usize);
                (self.mantissa.clone(), &other.mantissa * shift)
            }
        }
    }
}

impl FromStr for Decimal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let bad = || Error::MalformedResponse(format!("bad decimal {s:?}"));

        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", s),
        };

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(bad());
        }

        let mantissa = BigInt::from_str(&format!("{sign}{int_part}{frac_part}"))
            .map_err(|_| bad())?;

        Ok(Self {
            mantissa,
            scale: frac_part.len() as u32,
        })
    }
}

impl Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        let scale = self.scale.max(rhs.scale);
        let (a, b) = self.rescaled_mantissas(&rhs);
        Decimal {
            mantissa: a + b,
            scale,
        }
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = self.rescaled_mantissas(other);
        a.cmp(&b)
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_integer_strings() {
        let d = Decimal::parse("1500000000000").unwrap();
        assert_eq!(d.to_f64(), 1_500_000_000_000.0);
    }

    #[test]
    fn parses_fractional_strings_within_one_ulp() {
        let d = Decimal::parse("123.456").unwrap();
        assert!((d.to_f64() - 123.456).abs() <= f64::EPSILON * 123.456);
    }

    #[test]
    fn parses_negative_values() {
        let d = Decimal::parse("-12.5").unwrap();
        assert_eq!(d.to_f64(), -12.5);
    }

    #[test]
    fn atomics_carry_the_implied_scale() {
        // 1500.0 with 18 fractional digits on the wire.
        let d = Decimal::from_atomics("1500000000000000000000", DEC_SCALE).unwrap();
        assert_eq!(d.to_f64(), 1500.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(Decimal::parse("").is_err());
        assert!(Decimal::parse("12.34.56").is_err());
        assert!(Decimal::parse("12a").is_err());
        assert!(Decimal::parse(".").is_err());
    }

    #[test]
    fn overflow_saturates_to_infinity() {
        let huge = format!("1{}", "0".repeat(400));
        let d = Decimal::parse(&huge).unwrap();
        assert_eq!(d.to_f64(), f64::INFINITY);
    }

    #[test]
    fn ordering_is_scale_independent() {
        let a = Decimal::parse("1.0").unwrap();
        let b = Decimal::parse("1").unwrap();
        assert_eq!(a, b);

        let lo = Decimal::parse("500").unwrap();
        let hi = Decimal::from_atomics("700000000000000000000", DEC_SCALE).unwrap();
        assert!(lo < hi);
    }

    #[test]
    fn addition_aligns_scales() {
        let a = Decimal::parse("1.5").unwrap();
        let b = Decimal::parse("2").unwrap();
        assert_eq!((a + b).to_f64(), 3.5);
    }
}
