use std::fmt;

use alloy_primitives::U256;
use num::BigInt;
use serde::{Deserialize, Serialize};

use crate::error::SwapError;
use crate::math::common::{to_big_int, try_add, try_sub};
use crate::math::fraction::{Fraction, Rounding};
use crate::model::token::Token;

/// A raw integer amount of a token, in its smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmount {
    token: Token,
    raw: U256,
}

impl TokenAmount {
    pub fn new(token: Token, raw: U256) -> Self {
        Self { token, raw }
    }

    pub fn zero(token: Token) -> Self {
        Self::new(token, U256::ZERO)
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn checked_add(&self, other: &TokenAmount) -> Result<TokenAmount, SwapError> {
        self.ensure_token(other.token())?;
        Ok(TokenAmount::new(self.token.clone(), try_add(self.raw, other.raw)?))
    }

    pub fn checked_sub(&self, other: &TokenAmount) -> Result<TokenAmount, SwapError> {
        self.ensure_token(other.token())?;
        Ok(TokenAmount::new(self.token.clone(), try_sub(self.raw, other.raw)?))
    }

    /// The raw amount as a fraction over one.
    pub fn as_fraction(&self) -> Fraction {
        Fraction::from(self.raw)
    }

    /// The amount in whole tokens, `raw / 10^decimals`.
    pub fn as_decimal(&self) -> Fraction {
        let scale = BigInt::from(10u8).pow(u32::from(self.token.decimals()));
        // The scale is at least one, so the denominator is never zero.
        Fraction::new(to_big_int(self.raw), scale).unwrap_or_else(|_| self.as_fraction())
    }

    /// Whole-token rendering with `places` decimals, which may not exceed the token's decimals.
    pub fn to_fixed(&self, places: usize, rounding: Rounding) -> Result<String, SwapError> {
        let decimals = self.token.decimals();
        if places > usize::from(decimals) {
            return Err(SwapError::Decimals { places, decimals });
        }
        Ok(self.as_decimal().to_fixed(places, rounding))
    }

    pub fn to_significant(
        &self,
        significant_digits: usize,
        rounding: Rounding,
    ) -> Result<String, SwapError> {
        Ok(self.as_decimal().to_significant(significant_digits, rounding)?)
    }

    pub(crate) fn ensure_token(&self, token: &Token) -> Result<(), SwapError> {
        if &self.token != token {
            return Err(SwapError::currency_mismatch(token, &self.token));
        }
        Ok(())
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.as_decimal()
                .to_fixed(usize::from(self.token.decimals()), Rounding::RoundDown),
            self.token.symbol()
        )
    }
}
