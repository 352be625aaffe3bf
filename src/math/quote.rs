use alloy_primitives::{U256, uint};

use crate::error::SwapError;
use crate::math::common::{mul_div_floor, sqrt_floor, try_add, try_mul, try_sub};

/// Share of the input that reaches the curve, out of [`FEE_DENOMINATOR`] (a 0.3% fee).
pub const FEE_NUMERATOR: U256 = uint!(997_U256);
pub const FEE_DENOMINATOR: U256 = uint!(1000_U256);
/// Liquidity locked forever by the first mint.
pub const MINIMUM_LIQUIDITY: U256 = uint!(1000_U256);

/// Calculates the output of a constant-product swap for an exact input, net of the fee.
pub fn get_amount_out(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
) -> Result<U256, SwapError> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(SwapError::InsufficientReserves);
    }
    let amount_in_with_fee = try_mul(amount_in, FEE_NUMERATOR)?;
    let denominator = try_add(try_mul(reserve_in, FEE_DENOMINATOR)?, amount_in_with_fee)?;
    let amount_out = mul_div_floor(amount_in_with_fee, reserve_out, denominator)?;
    if amount_out.is_zero() {
        return Err(SwapError::InsufficientInputAmount);
    }
    Ok(amount_out)
}

/// Calculates the input a constant-product swap needs to produce an exact output.
///
/// The result is rounded up by one unit so the input is never short of the requested output.
pub fn get_amount_in(
    amount_out: U256,
    reserve_in: U256,
    reserve_out: U256,
) -> Result<U256, SwapError> {
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
        return Err(SwapError::InsufficientReserves);
    }
    let numerator = try_mul(reserve_in, amount_out)?;
    let denominator = try_mul(try_sub(reserve_out, amount_out)?, FEE_NUMERATOR)?;
    Ok(try_add(
        mul_div_floor(numerator, FEE_DENOMINATOR, denominator)?,
        U256::ONE,
    )?)
}

/// Liquidity tokens minted for a deposit of `amount0`/`amount1` into a pool with the given
/// reserves and supply.
pub fn get_liquidity_minted(
    total_supply: U256,
    amount0: U256,
    amount1: U256,
    reserve0: U256,
    reserve1: U256,
) -> Result<U256, SwapError> {
    let liquidity = if total_supply.is_zero() {
        sqrt_floor(try_mul(amount0, amount1)?)
            .checked_sub(MINIMUM_LIQUIDITY)
            .ok_or(SwapError::InsufficientInputAmount)?
    } else {
        if reserve0.is_zero() || reserve1.is_zero() {
            return Err(SwapError::InsufficientReserves);
        }
        let liquidity0 = mul_div_floor(amount0, total_supply, reserve0)?;
        let liquidity1 = mul_div_floor(amount1, total_supply, reserve1)?;
        liquidity0.min(liquidity1)
    };
    if liquidity.is_zero() {
        return Err(SwapError::InsufficientInputAmount);
    }
    Ok(liquidity)
}

/// Share of `reserve` that `liquidity` tokens redeem for.
pub fn get_liquidity_value(
    reserve: U256,
    total_supply: U256,
    liquidity: U256,
) -> Result<U256, SwapError> {
    if total_supply.is_zero() {
        return Ok(U256::ZERO);
    }
    if liquidity > total_supply {
        return Err(SwapError::InsufficientReserves);
    }
    Ok(mul_div_floor(liquidity, reserve, total_supply)?)
}
