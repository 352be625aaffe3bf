use alloy_primitives::{U256, U512, uint};
use num::BigInt;
use num::bigint::Sign;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ONE_E18: U256 = uint!(1000000000000000000_U256);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("arithmetic overflow")]
    Overflow,
    #[error("arithmetic underflow")]
    Underflow,
    #[error("negative value has no unsigned representation")]
    NegativeValue,
}

pub fn try_add(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

pub fn try_sub(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

pub fn try_mul(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

pub fn try_div(a: U256, b: U256) -> Result<U256, MathError> {
    a.checked_div(b).ok_or(MathError::DivisionByZero)
}

/// Calculates (x * y / denominator) with full precision, rounding towards zero.
pub fn mul_div_floor(x: U256, y: U256, denominator: U256) -> Result<U256, MathError> {
    if denominator.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let prod = U512::from(x) * U512::from(y);
    let result = prod / U512::from(denominator);
    if result > U512::from(U256::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(result.to::<U256>())
}

/// Returns the square root of a number, rounding towards zero.
///
/// Integer-only Newton iteration seeded from the bit length, so six steps are always enough.
pub fn sqrt_floor(a: U256) -> U256 {
    if a <= U256::ONE {
        return a;
    }

    let mut xn = U256::ONE << (a.log2() / 2);
    xn = (U256::from(3) * xn) >> 1;

    for _ in 0..6 {
        xn = (xn + a / xn) >> 1;
    }

    if xn > a / xn { xn - U256::ONE } else { xn }
}

/// `10^exponent`, failing once the power leaves the 256-bit range.
pub fn pow10(exponent: u8) -> Result<U256, MathError> {
    U256::from(10u8)
        .checked_pow(U256::from(exponent))
        .ok_or(MathError::Overflow)
}

/// True when the two values are at most one unit apart.
pub fn within_one(a: U256, b: U256) -> bool {
    let diff = if a > b { a - b } else { b - a };
    diff <= U256::ONE
}

pub fn to_big_int(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

pub fn from_big_int(value: &BigInt) -> Result<U256, MathError> {
    let (sign, bytes) = value.to_bytes_be();
    if sign == Sign::Minus {
        return Err(MathError::NegativeValue);
    }
    U256::try_from_be_slice(&bytes).ok_or(MathError::Overflow)
}
