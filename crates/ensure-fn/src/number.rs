use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// A double-precision script number.
///
/// Equality follows IEEE semantics, so `NaN` never equals itself.
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct Number(f64);

/// Represents a Not-a-Number (NaN) value.
pub const NAN: Number = Number(f64::NAN);

/// Represents positive infinity.
pub const INFINITE: Number = Number(f64::INFINITY);

impl Number {
    /// Creates a new `Number` from an `f64` value.
    pub fn new(value: f64) -> Self {
        Number(value)
    }

    /// Returns the underlying `f64` value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns the underlying `i64` value, truncating any fractional part.
    pub fn to_int(self) -> i64 {
        self.0 as i64
    }

    /// Returns `true` if the number has no fractional part.
    pub fn is_int(&self) -> bool {
        self.0.is_finite() && self.0.fract() == 0.0
    }

    /// Returns the absolute value of this number.
    pub fn abs(&self) -> Self {
        Number(self.0.abs())
    }

    /// Returns `true` if the number is positive or negative zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }

    /// Returns `true` if the number is NaN (Not-a-Number).
    pub fn is_nan(&self) -> bool {
        self.0.is_nan()
    }

    /// Returns the number as an array index when it is a non-negative integer.
    pub fn as_index(&self) -> Option<usize> {
        if self.is_int() && self.0 >= 0.0 && self.0 <= usize::MAX as f64 {
            Some(self.0 as usize)
        } else {
            None
        }
    }
}

impl Default for Number {
    fn default() -> Self {
        Number(0.0)
    }
}

impl Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Number(-self.0)
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number(value as f64)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number(value as f64)
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number(value as f64)
    }
}

impl From<usize> for Number {
    fn from(value: usize) -> Self {
        Number(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number(value)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_nan() {
            write!(f, "NaN")
        } else if self.0.is_infinite() {
            write!(f, "{}", if self.0 > 0.0 { "Infinity" } else { "-Infinity" })
        } else if self.is_int() && self.0.abs() < 1e21 {
            // -0 prints as 0
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl Add for Number {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Number(self.0 + other.0)
    }
}

impl Sub for Number {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Number(self.0 - other.0)
    }
}

impl Mul for Number {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Number(self.0 * other.0)
    }
}

impl Div for Number {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        Number(self.0 / other.0)
    }
}

impl Rem for Number {
    type Output = Self;

    fn rem(self, other: Self) -> Self {
        Number(self.0 % other.0)
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case(42.0, "42")]
    #[case(42.123, "42.123")]
    #[case(42.100, "42.1")]
    #[case(-42.0, "-42")]
    #[case(0.0, "0")]
    #[case(-0.0, "0")]
    #[case(0.1, "0.1")]
    #[case(f64::NAN, "NaN")]
    #[case(f64::INFINITY, "Infinity")]
    #[case(f64::NEG_INFINITY, "-Infinity")]
    fn test_display_formatting(#[case] input: f64, #[case] expected: &str) {
        let num = Number::new(input);
        assert_eq!(format!("{}", num), expected);
    }

    #[rstest]
    #[case(5.0, 2.0, "7", "3", "10", "2.5", "1")]
    #[case(-5.0, 2.0, "-3", "-7", "-10", "-2.5", "-1")]
    #[case(0.0, 1.0, "1", "-1", "0", "0", "0")]
    #[case(1.0, 0.0, "1", "1", "0", "Infinity", "NaN")]
    fn test_operations(
        #[case] a: f64,
        #[case] b: f64,
        #[case] add_result: &str,
        #[case] sub_result: &str,
        #[case] mul_result: &str,
        #[case] div_result: &str,
        #[case] rem_result: &str,
    ) {
        let num_a = Number::new(a);
        let num_b = Number::new(b);

        assert_eq!(format!("{}", num_a + num_b), add_result);
        assert_eq!(format!("{}", num_a - num_b), sub_result);
        assert_eq!(format!("{}", num_a * num_b), mul_result);
        assert_eq!(format!("{}", num_a / num_b), div_result);
        assert_eq!(format!("{}", num_a % num_b), rem_result);
    }

    #[rstest]
    #[case(5.0, 2.0, true, false)]
    #[case(2.0, 5.0, false, true)]
    #[case(f64::NAN, 5.0, false, false)]
    fn test_comparisons(#[case] a: f64, #[case] b: f64, #[case] greater: bool, #[case] less: bool) {
        let num_a = Number::new(a);
        let num_b = Number::new(b);

        assert_eq!(num_a > num_b, greater);
        assert_eq!(num_a < num_b, less);
    }

    #[test]
    fn test_nan_is_not_equal_to_itself() {
        assert_ne!(NAN, NAN);
    }

    #[rstest]
    #[case(3.0, Some(3))]
    #[case(3.5, None)]
    #[case(-1.0, None)]
    #[case(f64::NAN, None)]
    fn test_as_index(#[case] input: f64, #[case] expected: Option<usize>) {
        assert_eq!(Number::new(input).as_index(), expected);
    }
}
