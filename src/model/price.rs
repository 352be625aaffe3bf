use num::BigInt;

use crate::error::SwapError;
use crate::math::common::{from_big_int, to_big_int};
use crate::math::fraction::{Fraction, Rounding};
use crate::model::amount::TokenAmount;
use crate::model::token::Token;

/// Price of `base` denominated in `quote`. The raw ratio is quote units per base unit; the
/// adjusted ratio accounts for the two tokens' decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Price {
    base: Token,
    quote: Token,
    raw: Fraction,
    scalar: Fraction,
}

impl Price {
    /// `denominator` base units buy `numerator` quote units.
    pub fn new(
        base: Token,
        quote: Token,
        denominator: impl Into<BigInt>,
        numerator: impl Into<BigInt>,
    ) -> Result<Self, SwapError> {
        let raw = Fraction::new(numerator, denominator)?;
        let scalar = Fraction::new(
            BigInt::from(10u8).pow(u32::from(base.decimals())),
            BigInt::from(10u8).pow(u32::from(quote.decimals())),
        )?;
        Ok(Self {
            base,
            quote,
            raw,
            scalar,
        })
    }

    pub fn from_amounts(base: &TokenAmount, quote: &TokenAmount) -> Result<Self, SwapError> {
        Self::new(
            base.token().clone(),
            quote.token().clone(),
            to_big_int(base.raw()),
            to_big_int(quote.raw()),
        )
    }

    pub fn base(&self) -> &Token {
        &self.base
    }

    pub fn quote_token(&self) -> &Token {
        &self.quote
    }

    pub fn raw(&self) -> &Fraction {
        &self.raw
    }

    pub fn scalar(&self) -> &Fraction {
        &self.scalar
    }

    pub fn adjusted(&self) -> Fraction {
        &self.raw * &self.scalar
    }

    pub fn invert(&self) -> Result<Price, SwapError> {
        Price::new(
            self.quote.clone(),
            self.base.clone(),
            self.raw.numerator().clone(),
            self.raw.denominator().clone(),
        )
    }

    /// Chains two prices. The quote token of `self` must be the base token of `other`.
    pub fn multiply(&self, other: &Price) -> Result<Price, SwapError> {
        if self.quote != other.base {
            return Err(SwapError::currency_mismatch(&self.quote, &other.base));
        }
        let raw = &self.raw * &other.raw;
        Price::new(
            self.base.clone(),
            other.quote.clone(),
            raw.denominator().clone(),
            raw.numerator().clone(),
        )
    }

    /// Converts an amount of the base token into the quote token, rounding down.
    pub fn quote(&self, amount: &TokenAmount) -> Result<TokenAmount, SwapError> {
        amount.ensure_token(&self.base)?;
        let quoted = (&self.raw * &amount.as_fraction()).quotient();
        Ok(TokenAmount::new(self.quote.clone(), from_big_int(&quoted)?))
    }

    pub fn to_significant(
        &self,
        significant_digits: usize,
        rounding: Rounding,
    ) -> Result<String, SwapError> {
        Ok(self.adjusted().to_significant(significant_digits, rounding)?)
    }

    pub fn to_fixed(&self, places: usize, rounding: Rounding) -> String {
        self.adjusted().to_fixed(places, rounding)
    }
}
