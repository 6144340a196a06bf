use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_traits::{Pow, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Number of fractional digits kept when a division is inexact.
pub const DIVISION_PRECISION: i32 = 16;

/// Largest exponent magnitude a literal or a product may carry.
pub const MAX_EXPONENT: i32 = 100_000;

/// Arbitrary precision number stored as `mantissa * 10^exponent`.
#[derive(Debug, Clone)]
pub struct Decimal {
    mantissa: BigInt,
    exponent: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalError {
    #[error("can't convert an empty string to decimal")]
    Empty,
    #[error("can't convert {0} to decimal: too many .s")]
    MultipleDecimalPoints(String),
    #[error("can't convert {0} to decimal: exponent is not numeric")]
    InvalidExponent(String),
    #[error("can't convert {0} to decimal")]
    InvalidDigits(String),
    #[error("can't convert {0} to decimal: exponent out of range")]
    ExponentOutOfRange(String),
}

fn ten_pow(power: u32) -> BigInt {
    BigInt::from(10u8).pow(power)
}

impl Decimal {
    pub fn new(mantissa: impl Into<BigInt>, exponent: i32) -> Self {
        Decimal {
            mantissa: mantissa.into(),
            exponent,
        }
    }

    pub fn zero() -> Self {
        Decimal::new(0, 0)
    }

    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mantissa.sign() == Sign::Minus
    }

    pub fn is_integer(&self) -> bool {
        self.exponent >= 0 || self.normalized().exponent >= 0
    }

    /// Changes the exponent, multiplying the mantissa up or truncating it
    /// towards zero as needed.
    fn rescale(&self, exponent: i32) -> Decimal {
        match exponent.cmp(&self.exponent) {
            Ordering::Equal => self.clone(),
            Ordering::Less => {
                let shift = (self.exponent as i64 - exponent as i64) as u32;
                Decimal::new(&self.mantissa * ten_pow(shift), exponent)
            }
            Ordering::Greater => {
                let shift = (exponent as i64 - self.exponent as i64) as u32;
                Decimal::new(&self.mantissa / ten_pow(shift), exponent)
            }
        }
    }

    fn rescale_pair(&self, other: &Decimal) -> (Decimal, Decimal) {
        let exponent = self.exponent.min(other.exponent);
        (self.rescale(exponent), other.rescale(exponent))
    }

    /// Strips trailing zeros from the mantissa. Numerically equal values
    /// always normalize to the same pair.
    pub fn normalized(&self) -> Decimal {
        if self.mantissa.is_zero() {
            return Decimal::zero();
        }
        let ten = BigInt::from(10u8);
        let mut mantissa = self.mantissa.clone();
        let mut exponent = self.exponent;
        while (&mantissa % &ten).is_zero() {
            mantissa /= &ten;
            exponent += 1;
        }
        Decimal { mantissa, exponent }
    }

    pub fn abs(&self) -> Decimal {
        Decimal::new(self.mantissa.abs(), self.exponent)
    }

    /// Truncated quotient with `precision` fractional digits, and the exact
    /// remainder that goes with it.
    fn quo_rem(&self, other: &Decimal, precision: i32) -> (Decimal, Decimal) {
        let scale = -precision;
        let shift = self.exponent as i64 - other.exponent as i64 - scale as i64;

        let (dividend, divisor, remainder_exponent) = if shift < 0 {
            (
                self.mantissa.clone(),
                &other.mantissa * ten_pow((-shift) as u32),
                self.exponent,
            )
        } else {
            (
                &self.mantissa * ten_pow(shift as u32),
                other.mantissa.clone(),
                scale + other.exponent,
            )
        };

        let quotient = &dividend / &divisor;
        let remainder = &dividend % &divisor;

        (
            Decimal::new(quotient, scale),
            Decimal::new(remainder, remainder_exponent),
        )
    }

    /// Division rounded half away from zero to `precision` fractional digits.
    /// Returns `None` when dividing by zero.
    pub fn div_round(&self, other: &Decimal, precision: i32) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        let (quotient, remainder) = self.quo_rem(other, precision);

        // twice the remainder, scaled back up by the precision
        let doubled = Decimal::new(
            remainder.mantissa.abs() * 2,
            remainder.exponent + precision,
        );
        if doubled.cmp(&other.abs()) == Ordering::Less {
            return Some(quotient);
        }

        let unit = Decimal::new(1, -precision);
        if self.mantissa.sign() * other.mantissa.sign() == Sign::Minus {
            Some(&quotient - &unit)
        } else {
            Some(&quotient + &unit)
        }
    }

    pub fn checked_div(&self, other: &Decimal) -> Option<Decimal> {
        self.div_round(other, DIVISION_PRECISION)
            .map(|quotient| quotient.normalized())
    }

    /// Remainder of the truncated division, carrying the sign of `self`.
    pub fn checked_rem(&self, other: &Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        let (_, remainder) = self.quo_rem(other, 0);
        Some(remainder)
    }

    /// Drops digits beyond `precision` fractional places without rounding.
    pub fn truncate(&self, precision: i32) -> Decimal {
        if precision >= 0 && -precision > self.exponent {
            self.rescale(-precision)
        } else {
            self.clone()
        }
    }

    pub fn floor(&self) -> Decimal {
        let truncated = self.truncate(0);
        if self.is_negative() && truncated != *self {
            &truncated - &Decimal::new(1, 0)
        } else {
            truncated
        }
    }

    pub fn ceil(&self) -> Decimal {
        let truncated = self.truncate(0);
        if !self.is_negative() && truncated != *self {
            &truncated + &Decimal::new(1, 0)
        } else {
            truncated
        }
    }

    /// Rounds half away from zero to `places` fractional digits. `places`
    /// is clamped to `MAX_EXPONENT` either way.
    pub fn round(&self, places: i32) -> Decimal {
        let places = places.clamp(-MAX_EXPONENT, MAX_EXPONENT);
        if self.exponent >= -places {
            return self.clone();
        }
        let truncated = self.rescale(-places);
        let remainder = self - &truncated;
        let unit = Decimal::new(1, -places);
        let doubled = Decimal::new(remainder.mantissa.abs() * 2, remainder.exponent);
        if doubled < unit {
            truncated
        } else if self.is_negative() {
            &truncated - &unit
        } else {
            &truncated + &unit
        }
    }

    /// The value as an `i64` when it is integral and in range.
    pub fn to_i64(&self) -> Option<i64> {
        let normalized = self.normalized();
        // 10^19 is already past i64::MAX
        if normalized.exponent < 0 || normalized.exponent > 18 {
            return None;
        }
        normalized.rescale(0).mantissa.to_i64()
    }

    /// Product of two decimals, or `None` when the exponent of the result
    /// falls outside `MAX_EXPONENT`.
    pub fn checked_mul(&self, other: &Decimal) -> Option<Decimal> {
        let mantissa = &self.mantissa * &other.mantissa;
        if mantissa.is_zero() {
            return Some(Decimal::zero());
        }
        let exponent = self.exponent.checked_add(other.exponent)?;
        if exponent.abs() > MAX_EXPONENT {
            return None;
        }
        Some(Decimal::new(mantissa, exponent))
    }

    fn format(&self, trim_trailing_zeros: bool) -> String {
        if self.exponent >= 0 {
            return self.rescale(0).mantissa.to_string();
        }

        let digits = self.mantissa.abs().to_string();
        let fraction_len = (-(self.exponent as i64)) as usize;

        let (integer_part, mut fractional_part) = if digits.len() > fraction_len {
            let split = digits.len() - fraction_len;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            let padding = "0".repeat(fraction_len - digits.len());
            ("0".to_string(), padding + &digits)
        };

        if trim_trailing_zeros {
            let trimmed = fractional_part.trim_end_matches('0').len();
            fractional_part.truncate(trimmed);
        }

        let mut number = integer_part;
        if !fractional_part.is_empty() {
            number.push('.');
            number.push_str(&fractional_part);
        }
        if self.is_negative() {
            number.insert(0, '-');
        }
        number
    }

    /// Text form keeping every stored digit, e.g. `1.500`.
    pub fn to_string_fixed(&self) -> String {
        self.format(false)
    }
}

fn is_digits(text: &str) -> bool {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    !unsigned.is_empty() && unsigned.bytes().all(|byte| byte.is_ascii_digit())
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err(DecimalError::Empty);
        }

        let mut exponent: i64 = 0;
        let mut number = value;

        if let Some(index) = value.find(['e', 'E']) {
            let exponent_text = &value[index + 1..];
            if !is_digits(exponent_text) {
                return Err(DecimalError::InvalidExponent(value.to_string()));
            }
            exponent = exponent_text
                .parse::<i32>()
                .map_err(|_| DecimalError::ExponentOutOfRange(value.to_string()))?
                as i64;
            number = &value[..index];
        }

        let parts: Vec<&str> = number.split('.').collect();
        let integer_text = match parts.as_slice() {
            [integer] => integer.to_string(),
            [integer, fraction] => {
                exponent -= fraction.len() as i64;
                format!("{integer}{fraction}")
            }
            _ => return Err(DecimalError::MultipleDecimalPoints(value.to_string())),
        };

        if !is_digits(&integer_text) {
            return Err(DecimalError::InvalidDigits(value.to_string()));
        }
        let mantissa = BigInt::from_str(&integer_text)
            .map_err(|_| DecimalError::InvalidDigits(value.to_string()))?;
        let exponent = i32::try_from(exponent)
            .ok()
            .filter(|exponent| exponent.abs() <= MAX_EXPONENT)
            .ok_or_else(|| DecimalError::ExponentOutOfRange(value.to_string()))?;

        Ok(Decimal { mantissa, exponent })
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format(true))
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Decimal::new(value, 0)
    }
}

impl From<usize> for Decimal {
    fn from(value: usize) -> Self {
        Decimal::new(value, 0)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let (left, right) = self.rescale_pair(other);
        left.mantissa.cmp(&right.mantissa)
    }
}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let normalized = self.normalized();
        normalized.mantissa.hash(state);
        normalized.exponent.hash(state);
    }
}

impl Add for &Decimal {
    type Output = Decimal;

    fn add(self, other: &Decimal) -> Decimal {
        let (left, right) = self.rescale_pair(other);
        Decimal::new(left.mantissa + right.mantissa, left.exponent)
    }
}

impl Sub for &Decimal {
    type Output = Decimal;

    fn sub(self, other: &Decimal) -> Decimal {
        let (left, right) = self.rescale_pair(other);
        Decimal::new(left.mantissa - right.mantissa, left.exponent)
    }
}

impl Neg for &Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal::new(-&self.mantissa, self.exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decimal(text: &str) -> Decimal {
        text.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let tests = vec![
            ("0", "0"),
            ("5", "5"),
            ("-5", "-5"),
            ("1.5", "1.5"),
            ("1.500", "1.5"),
            ("0.001", "0.001"),
            ("-0.25", "-0.25"),
            (".5", "0.5"),
            ("5.", "5"),
            ("1e3", "1000"),
            ("1.5e2", "150"),
            ("15e-1", "1.5"),
            ("2E-3", "0.002"),
            ("123456789012345678901234567890", "123456789012345678901234567890"),
        ];

        for (input, expected) in tests {
            assert_eq!(decimal(input).to_string(), expected, "parsing {input}");
        }
    }

    #[test]
    fn test_parse_errors() {
        let tests = vec![
            ("", DecimalError::Empty),
            ("1.2.3", DecimalError::MultipleDecimalPoints("1.2.3".into())),
            ("1e", DecimalError::InvalidExponent("1e".into())),
            ("1ex", DecimalError::InvalidExponent("1ex".into())),
            ("1e2.5", DecimalError::InvalidExponent("1e2.5".into())),
            ("abc", DecimalError::InvalidDigits("abc".into())),
            ("1_000", DecimalError::InvalidDigits("1_000".into())),
        ];

        for (input, expected) in tests {
            assert_eq!(input.parse::<Decimal>(), Err(expected), "parsing {input}");
        }
    }

    #[test]
    fn test_fixed_format_keeps_digits() {
        assert_eq!(decimal("1.500").to_string_fixed(), "1.500");
        assert_eq!(decimal("-0.010").to_string_fixed(), "-0.010");
    }

    #[test]
    fn test_arithmetic() {
        let tests: Vec<(&str, fn(&Decimal, &Decimal) -> Decimal, &str, &str)> = vec![
            ("1.1", |a, b| a + b, "2.2", "3.3"),
            ("0.1", |a, b| a + b, "0.2", "0.3"),
            ("10", |a, b| a - b, "0.001", "9.999"),
            ("-3", |a, b| a - b, "4", "-7"),
            ("1.5", |a, b| a.checked_mul(b).unwrap(), "1.5", "2.25"),
            ("-2", |a, b| a.checked_mul(b).unwrap(), "0.5", "-1"),
            ("0", |a, b| a.checked_mul(b).unwrap(), "1e100000", "0"),
        ];

        for (left, operation, right, expected) in tests {
            let result = operation(&decimal(left), &decimal(right));
            assert_eq!(result.to_string(), expected);
        }
    }

    #[test]
    fn test_division() {
        let tests = vec![
            ("1", "3", "0.3333333333333333"),
            ("2", "3", "0.6666666666666667"),
            ("-2", "3", "-0.6666666666666667"),
            ("2", "-3", "-0.6666666666666667"),
            ("10", "4", "2.5"),
            ("6", "3", "2"),
            ("1", "8", "0.125"),
        ];

        for (left, right, expected) in tests {
            let result = decimal(left).checked_div(&decimal(right)).unwrap();
            assert_eq!(result.to_string(), expected, "{left} / {right}");
        }

        assert_eq!(decimal("1").checked_div(&Decimal::zero()), None);
    }

    #[test]
    fn test_remainder() {
        let tests = vec![
            ("10", "3", "1"),
            ("-7", "3", "-1"),
            ("7", "-3", "1"),
            ("5.5", "2", "1.5"),
            ("9", "3", "0"),
            ("0.3", "0.1", "0"),
        ];

        for (left, right, expected) in tests {
            let result = decimal(left).checked_rem(&decimal(right)).unwrap();
            assert_eq!(result.to_string(), expected, "{left} % {right}");
        }

        assert_eq!(decimal("1").checked_rem(&Decimal::zero()), None);
    }

    #[test]
    fn test_division_closure() {
        let tolerance = Decimal::new(1, -15);
        let values = ["1", "3", "7", "0.3", "-12.5", "1000000", "0.0007"];

        for a in values {
            for b in values {
                let (a, b) = (decimal(a), decimal(b));
                let product = a.checked_div(&b).unwrap().checked_mul(&b).unwrap();
                let difference = (&product - &a).abs();
                assert!(difference <= tolerance, "{a} / {b} * {b} = {product}");
            }
        }
    }

    #[test]
    fn test_comparison_and_hash() {
        use std::collections::hash_map::DefaultHasher;

        fn hash_of(value: &Decimal) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        assert_eq!(decimal("1.50"), decimal("1.5"));
        assert_eq!(decimal("1e2"), decimal("100"));
        assert!(decimal("-1") < decimal("0.5"));
        assert!(decimal("2.001") > decimal("2"));
        assert_eq!(hash_of(&decimal("1.50")), hash_of(&decimal("1.5")));
        assert_eq!(hash_of(&decimal("100.0")), hash_of(&decimal("1e2")));
        assert_ne!(hash_of(&decimal("-1")), hash_of(&decimal("1")));
    }

    #[test]
    fn test_rounding() {
        assert_eq!(decimal("2.5").round(0).to_string(), "3");
        assert_eq!(decimal("-2.5").round(0).to_string(), "-3");
        assert_eq!(decimal("2.449").round(1).to_string(), "2.4");
        assert_eq!(decimal("2.45").round(1).to_string(), "2.5");
        assert_eq!(decimal("7").round(2).to_string(), "7");
        assert_eq!(decimal("2.7").floor().to_string(), "2");
        assert_eq!(decimal("-2.2").floor().to_string(), "-3");
        assert_eq!(decimal("2.2").ceil().to_string(), "3");
        assert_eq!(decimal("-2.7").ceil().to_string(), "-2");
        assert_eq!(decimal("12.99").truncate(1).to_string(), "12.9");
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(decimal("42").to_i64(), Some(42));
        assert_eq!(decimal("4.0").to_i64(), Some(4));
        assert_eq!(decimal("4.2").to_i64(), None);
        assert_eq!(decimal("1e2").to_i64(), Some(100));
        assert_eq!(decimal("1e19").to_i64(), None);
        assert_eq!(decimal("1e100000").to_i64(), None);
        assert_eq!(decimal("-9223372036854775808").to_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_exponent_limits() {
        let tests = vec![
            ("1e2000000000", DecimalError::ExponentOutOfRange("1e2000000000".into())),
            ("1e-2000000000", DecimalError::ExponentOutOfRange("1e-2000000000".into())),
            ("1e99999999999", DecimalError::ExponentOutOfRange("1e99999999999".into())),
            ("1e100001", DecimalError::ExponentOutOfRange("1e100001".into())),
        ];

        for (input, expected) in tests {
            assert_eq!(input.parse::<Decimal>(), Err(expected), "parsing {input}");
        }

        let big = decimal("1e100000");
        let small = decimal("1e-100000");
        assert_eq!(big.checked_mul(&big), None);
        assert_eq!(small.checked_mul(&small), None);
        assert_eq!(big.checked_mul(&small), Some(decimal("1")));
        assert_eq!(Decimal::new(1, i32::MAX).checked_mul(&Decimal::new(1, 1)), None);
        assert_eq!((&small + &decimal("1")).to_i64(), None);
    }

    #[test]
    fn test_rounding_extreme_places() {
        assert_eq!(decimal("2.5").round(i32::MIN).to_string(), "0");
        assert_eq!(decimal("2.5").round(i32::MAX).to_string(), "2.5");
        assert_eq!(decimal("-1234.5").round(-2).to_string(), "-1200");
    }
}
