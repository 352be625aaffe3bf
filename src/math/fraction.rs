use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use alloy_primitives::U256;
use num::{BigInt, Integer, One, Signed, Zero};
use serde::{Deserialize, Serialize};

use crate::math::common::{MathError, to_big_int};

/// Rounding applied when a fraction is rendered with a bounded number of digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rounding {
    /// Towards zero.
    RoundDown,
    /// To the nearest neighbour, ties away from zero.
    #[default]
    RoundHalfUp,
    /// Away from zero.
    RoundUp,
}

/// An exact rational number. The denominator is kept positive and never zero; values are not
/// reduced, so equality and ordering cross-multiply.
#[derive(Clone, Debug)]
pub struct Fraction {
    numerator: BigInt,
    denominator: BigInt,
}

impl Fraction {
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, MathError> {
        let numerator = numerator.into();
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        if denominator.is_negative() {
            return Ok(Self {
                numerator: -numerator,
                denominator: -denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Self {
            numerator: value.into(),
            denominator: BigInt::one(),
        }
    }

    pub fn from_u256(numerator: U256, denominator: U256) -> Result<Self, MathError> {
        Self::new(to_big_int(numerator), to_big_int(denominator))
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    /// Integer division of numerator by denominator, truncating towards zero.
    pub fn quotient(&self) -> BigInt {
        &self.numerator / &self.denominator
    }

    /// What is left over after [`Fraction::quotient`], over the same denominator.
    pub fn remainder(&self) -> Fraction {
        Fraction {
            numerator: &self.numerator % &self.denominator,
            denominator: self.denominator.clone(),
        }
    }

    pub fn invert(&self) -> Result<Fraction, MathError> {
        Fraction::new(self.denominator.clone(), self.numerator.clone())
    }

    pub fn checked_div(&self, other: &Fraction) -> Result<Fraction, MathError> {
        Fraction::new(
            &self.numerator * &other.denominator,
            &self.denominator * &other.numerator,
        )
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.numerator.is_negative()
    }

    /// Renders the value with exactly `places` decimals.
    pub fn to_fixed(&self, places: usize, rounding: Rounding) -> String {
        let scaled = self.numerator.abs() * pow10(places);
        let digits = round_div(&scaled, &self.denominator, rounding);
        let negative = self.numerator.is_negative() && !digits.is_zero();
        format_scaled(&digits, places, negative, false)
    }

    /// Renders the value with `significant_digits` significant digits and trailing fractional
    /// zeros stripped. When the integer part is longer than requested, every integer digit is kept.
    pub fn to_significant(
        &self,
        significant_digits: usize,
        rounding: Rounding,
    ) -> Result<String, MathError> {
        if significant_digits == 0 {
            return Err(MathError::Underflow);
        }
        if self.numerator.is_zero() {
            return Ok("0".to_string());
        }

        let (digits, scale) = self.round_significant(significant_digits, rounding);
        let integer_length = integer_length(&digits, scale);
        let (digits, scale) = if integer_length > significant_digits {
            self.round_significant(integer_length, rounding)
        } else {
            (digits, scale)
        };

        let negative = self.numerator.is_negative();
        if scale <= 0 {
            let integer = digits * pow10(scale.unsigned_abs());
            return Ok(format_scaled(&integer, 0, negative, true));
        }
        Ok(format_scaled(&digits, scale.unsigned_abs() as usize, negative, true))
    }

    /// Rounds `|self|` to `significant_digits` digits. Returns the digits and the power of ten
    /// they are scaled by, so the value is `digits / 10^scale`.
    fn round_significant(&self, significant_digits: usize, rounding: Rounding) -> (BigInt, i64) {
        let numerator = self.numerator.abs();
        let exponent = decimal_exponent(&numerator, &self.denominator);
        let scale = significant_digits as i64 - 1 - exponent;
        let digits = if scale >= 0 {
            round_div(
                &(numerator * pow10(scale.unsigned_abs())),
                &self.denominator,
                rounding,
            )
        } else {
            round_div(
                &numerator,
                &(&self.denominator * pow10(scale.unsigned_abs())),
                rounding,
            )
        };
        (digits, scale)
    }
}

impl From<U256> for Fraction {
    fn from(value: U256) -> Self {
        Fraction::from_integer(to_big_int(value))
    }
}

impl PartialEq for Fraction {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Fraction {}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl Add for &Fraction {
    type Output = Fraction;

    fn add(self, other: Self) -> Fraction {
        if self.denominator == other.denominator {
            return Fraction {
                numerator: &self.numerator + &other.numerator,
                denominator: self.denominator.clone(),
            };
        }
        Fraction {
            numerator: &self.numerator * &other.denominator + &other.numerator * &self.denominator,
            denominator: &self.denominator * &other.denominator,
        }
    }
}

impl Sub for &Fraction {
    type Output = Fraction;

    fn sub(self, other: Self) -> Fraction {
        if self.denominator == other.denominator {
            return Fraction {
                numerator: &self.numerator - &other.numerator,
                denominator: self.denominator.clone(),
            };
        }
        Fraction {
            numerator: &self.numerator * &other.denominator - &other.numerator * &self.denominator,
            denominator: &self.denominator * &other.denominator,
        }
    }
}

impl Mul for &Fraction {
    type Output = Fraction;

    fn mul(self, other: Self) -> Fraction {
        Fraction {
            numerator: &self.numerator * &other.numerator,
            denominator: &self.denominator * &other.denominator,
        }
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A fraction that renders as a percentage.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(Fraction);

impl Percent {
    pub fn new(
        numerator: impl Into<BigInt>,
        denominator: impl Into<BigInt>,
    ) -> Result<Self, MathError> {
        Ok(Percent(Fraction::new(numerator, denominator)?))
    }

    pub fn zero() -> Self {
        Percent(Fraction::from_integer(0))
    }

    /// `bips / 10000`.
    pub fn from_bips(bips: u64) -> Self {
        Percent(Fraction {
            numerator: BigInt::from(bips),
            denominator: BigInt::from(10_000u32),
        })
    }

    pub fn as_fraction(&self) -> &Fraction {
        &self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn to_fixed(&self, places: usize, rounding: Rounding) -> String {
        (&self.0 * &Fraction::from_integer(100)).to_fixed(places, rounding)
    }

    pub fn to_significant(
        &self,
        significant_digits: usize,
        rounding: Rounding,
    ) -> Result<String, MathError> {
        (&self.0 * &Fraction::from_integer(100)).to_significant(significant_digits, rounding)
    }
}

impl From<Fraction> for Percent {
    fn from(fraction: Fraction) -> Self {
        Percent(fraction)
    }
}

fn pow10(exponent: impl TryInto<u32>) -> BigInt {
    let exponent = exponent.try_into().unwrap_or(u32::MAX);
    BigInt::from(10u8).pow(exponent)
}

/// `numerator / denominator` for non-negative operands under the given rounding.
fn round_div(numerator: &BigInt, denominator: &BigInt, rounding: Rounding) -> BigInt {
    let (quotient, remainder) = numerator.div_rem(denominator);
    if remainder.is_zero() {
        return quotient;
    }
    match rounding {
        Rounding::RoundDown => quotient,
        Rounding::RoundUp => quotient + 1,
        Rounding::RoundHalfUp => {
            if remainder * 2 >= *denominator {
                quotient + 1
            } else {
                quotient
            }
        }
    }
}

/// `floor(log10(numerator / denominator))` for a positive ratio.
fn decimal_exponent(numerator: &BigInt, denominator: &BigInt) -> i64 {
    let integer = numerator / denominator;
    if !integer.is_zero() {
        return integer.to_string().len() as i64 - 1;
    }
    let mut exponent = 0i64;
    let mut scaled = numerator.clone();
    while scaled < *denominator {
        scaled *= 10;
        exponent -= 1;
    }
    exponent
}

fn integer_length(digits: &BigInt, scale: i64) -> usize {
    if scale <= 0 {
        return digits.to_string().len() + scale.unsigned_abs() as usize;
    }
    (digits / pow10(scale.unsigned_abs())).to_string().len()
}

/// Formats `digits / 10^places` in positional notation.
fn format_scaled(digits: &BigInt, places: usize, negative: bool, strip_zeros: bool) -> String {
    let mut text = digits.to_string();
    if places > 0 {
        if text.len() <= places {
            text = format!("{}{}", "0".repeat(places + 1 - text.len()), text);
        }
        text.insert(text.len() - places, '.');
        if strip_zeros {
            text = text.trim_end_matches('0').trim_end_matches('.').to_string();
        }
    }
    if negative && text.chars().any(|c| c != '0' && c != '.') {
        text.insert(0, '-');
    }
    text
}
