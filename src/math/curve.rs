use alloy_primitives::{U256, uint};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::common::{MathError, try_add, try_div, try_mul, try_sub, within_one};

/// Scale applied to the amplification coefficient.
pub const A_PRECISION: U256 = uint!(100_U256);
/// Denominator of StableSwap fees, so a fee of `5_000_000` is 0.05%.
pub const FEE_DENOMINATOR: U256 = uint!(10000000000_U256);
/// Every balance is normalized to this many decimals before solving the invariant.
pub const POOL_PRECISION_DECIMALS: u8 = 18;
/// Default cap on Newton iterations.
pub const MAX_LOOP_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum CurveError {
    #[error(transparent)]
    Math(#[from] MathError),
    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: usize },
}

/// Computes the StableSwap invariant D for the normalized balances `xp`.
///
/// Newton's method starting from the plain sum, stopping once two successive estimates are at
/// most one unit apart.
pub fn get_d(xp: &[U256], a_precise: U256, max_iterations: usize) -> Result<U256, CurveError> {
    let n = U256::from(xp.len());
    let sum = xp.iter().try_fold(U256::ZERO, |acc, x| try_add(acc, *x))?;
    if sum.is_zero() {
        return Ok(U256::ZERO);
    }

    let na = try_mul(a_precise, n)?;
    let mut d = sum;
    for _ in 0..max_iterations {
        // D_P = D^(n+1) / (n^n * prod(xp))
        let mut d_p = d;
        for x in xp {
            d_p = try_div(try_mul(d_p, d)?, try_mul(*x, n)?)?;
        }
        let previous = d;

        let numerator = try_mul(
            try_add(
                try_div(try_mul(na, sum)?, A_PRECISION)?,
                try_mul(d_p, n)?,
            )?,
            d,
        )?;
        let denominator = try_add(
            try_div(try_mul(try_sub(na, A_PRECISION)?, d)?, A_PRECISION)?,
            try_mul(try_add(n, U256::ONE)?, d_p)?,
        )?;
        d = try_div(numerator, denominator)?;

        if within_one(d, previous) {
            return Ok(d);
        }
    }

    Err(CurveError::NotConverged {
        iterations: max_iterations,
    })
}

/// Computes the balance of `token_index_to` that keeps D unchanged once the balance of
/// `token_index_from` becomes `x`. All balances are normalized.
pub fn get_y(
    a_precise: U256,
    token_index_from: usize,
    token_index_to: usize,
    x: U256,
    xp: &[U256],
    max_iterations: usize,
) -> Result<U256, CurveError> {
    let d = get_d(xp, a_precise, max_iterations)?;
    let n = U256::from(xp.len());
    let na = try_mul(a_precise, n)?;

    let mut c = d;
    let mut sum = U256::ZERO;
    for (index, balance) in xp.iter().enumerate() {
        if index == token_index_to {
            continue;
        }
        let balance = if index == token_index_from {
            x
        } else {
            *balance
        };
        sum = try_add(sum, balance)?;
        c = try_div(try_mul(c, d)?, try_mul(balance, n)?)?;
    }

    solve_y(c, sum, d, na, n, max_iterations)
}

/// Computes the balance of `token_index` that yields the invariant `d` with every other balance
/// held at its value in `xp`.
pub fn get_y_d(
    a_precise: U256,
    token_index: usize,
    xp: &[U256],
    d: U256,
    max_iterations: usize,
) -> Result<U256, CurveError> {
    let n = U256::from(xp.len());
    let na = try_mul(a_precise, n)?;

    let mut c = d;
    let mut sum = U256::ZERO;
    for (index, balance) in xp.iter().enumerate() {
        if index == token_index {
            continue;
        }
        sum = try_add(sum, *balance)?;
        c = try_div(try_mul(c, d)?, try_mul(*balance, n)?)?;
    }

    solve_y(c, sum, d, na, n, max_iterations)
}

/// Newton iteration of `y = (y^2 + c) / (2y + b - D)`, shared by [`get_y`] and [`get_y_d`].
fn solve_y(
    c: U256,
    sum: U256,
    d: U256,
    na: U256,
    n: U256,
    max_iterations: usize,
) -> Result<U256, CurveError> {
    let c = try_div(
        try_mul(try_mul(c, d)?, A_PRECISION)?,
        try_mul(na, n)?,
    )?;
    let b = try_add(sum, try_div(try_mul(d, A_PRECISION)?, na)?)?;

    let mut y = d;
    for _ in 0..max_iterations {
        let previous = y;
        y = try_div(
            try_add(try_mul(y, y)?, c)?,
            try_sub(try_add(try_mul(y, U256::from(2))?, b)?, d)?,
        )?;
        if within_one(y, previous) {
            return Ok(y);
        }
    }

    Err(CurveError::NotConverged {
        iterations: max_iterations,
    })
}

/// Fee charged per token on imbalanced withdrawals, `fee * n / (4 * (n - 1))`.
pub fn fee_per_token(fee: U256, n_coins: usize) -> Result<U256, MathError> {
    let n = U256::from(n_coins);
    try_div(
        try_mul(fee, n)?,
        try_mul(try_sub(n, U256::ONE)?, U256::from(4))?,
    )
}
