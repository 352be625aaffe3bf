use alloy_primitives::U256;

use crate::error::SwapError;
use crate::math::common::{
    ONE_E18, mul_div_floor, pow10, try_add, try_div, try_mul, try_sub,
};
use crate::math::curve::{
    A_PRECISION, FEE_DENOMINATOR, MAX_LOOP_LIMIT, POOL_PRECISION_DECIMALS, fee_per_token, get_d,
    get_y, get_y_d,
};
use crate::math::fraction::Fraction;
use crate::model::amount::TokenAmount;
use crate::model::token::Token;

/// Fee and amplification settings of a StableSwap pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableSwapParams {
    /// Swap fee over [`FEE_DENOMINATOR`].
    pub fee: U256,
    /// Share of the swap fee kept by the protocol, over [`FEE_DENOMINATOR`].
    pub admin_fee: U256,
    /// Amplification coefficient, unscaled.
    pub a: U256,
    /// Value of one liquidity token in the pool's common precision.
    pub virtual_price: U256,
}

/// An N-asset StableSwap pool snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableSwap {
    chain_id: u32,
    address: String,
    pooled_tokens: Vec<Token>,
    lp_token: Token,
    total_supply: TokenAmount,
    balances: Vec<TokenAmount>,
    params: StableSwapParams,
    multipliers: Vec<U256>,
    max_iterations: usize,
}

impl StableSwap {
    pub fn new(
        chain_id: u32,
        address: impl Into<String>,
        pooled_tokens: Vec<Token>,
        lp_token: Token,
        total_supply: TokenAmount,
        balances: Vec<TokenAmount>,
        params: StableSwapParams,
    ) -> Result<Self, SwapError> {
        if pooled_tokens.len() < 2 {
            return Err(SwapError::InvalidPool("at least two pooled tokens are required"));
        }
        if balances.len() != pooled_tokens.len() {
            return Err(SwapError::InvalidPool("expected one balance per pooled token"));
        }
        for (balance, token) in balances.iter().zip(&pooled_tokens) {
            balance.ensure_token(token)?;
        }
        total_supply.ensure_token(&lp_token)?;

        let multipliers = pooled_tokens
            .iter()
            .map(|token| {
                let decimals = token.decimals();
                if decimals > POOL_PRECISION_DECIMALS {
                    return Err(SwapError::InvalidPool(
                        "pooled token has more decimals than the pool precision",
                    ));
                }
                Ok(pow10(POOL_PRECISION_DECIMALS - decimals)?)
            })
            .collect::<Result<Vec<_>, SwapError>>()?;

        Ok(Self {
            chain_id,
            address: address.into(),
            pooled_tokens,
            lp_token,
            total_supply,
            balances,
            params,
            multipliers,
            max_iterations: MAX_LOOP_LIMIT,
        })
    }

    /// Overrides the Newton iteration cap used by every invariant solve on this pool.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn pooled_tokens(&self) -> &[Token] {
        &self.pooled_tokens
    }

    pub fn lp_token(&self) -> &Token {
        &self.lp_token
    }

    pub fn total_supply(&self) -> &TokenAmount {
        &self.total_supply
    }

    pub fn balances(&self) -> &[TokenAmount] {
        &self.balances
    }

    pub fn params(&self) -> &StableSwapParams {
        &self.params
    }

    pub fn a_precise(&self) -> Result<U256, SwapError> {
        Ok(try_mul(self.params.a, A_PRECISION)?)
    }

    pub fn virtual_price(&self) -> Result<Fraction, SwapError> {
        Ok(Fraction::from_u256(self.params.virtual_price, ONE_E18)?)
    }

    pub fn involves_token(&self, token: &Token) -> bool {
        self.pooled_tokens.contains(token)
    }

    pub fn token_index(&self, token: &Token) -> Result<usize, SwapError> {
        self.pooled_tokens
            .iter()
            .position(|pooled| pooled == token)
            .ok_or_else(|| SwapError::UnknownToken(token.asset_id()))
    }

    /// Output of swapping `amount` of token `token_index_from` into token `token_index_to`,
    /// net of the swap fee.
    pub fn calculate_swap(
        &self,
        token_index_from: usize,
        token_index_to: usize,
        amount: &TokenAmount,
    ) -> Result<TokenAmount, SwapError> {
        let token_from = self.token_at(token_index_from)?;
        let token_to = self.token_at(token_index_to)?;
        if token_index_from == token_index_to {
            return Err(SwapError::IdenticalTokens(token_from.asset_id()));
        }
        amount.ensure_token(token_from)?;
        self.ensure_liquid()?;

        let xp = self.xp(&self.raw_balances())?;
        let x = try_add(
            try_mul(amount.raw(), self.multipliers[token_index_from])?,
            xp[token_index_from],
        )?;
        let y = get_y(
            self.a_precise()?,
            token_index_from,
            token_index_to,
            x,
            &xp,
            self.max_iterations,
        )?;
        // One unit is held back against rounding in the solver.
        let dy = xp[token_index_to]
            .checked_sub(try_add(y, U256::ONE)?)
            .ok_or(SwapError::InsufficientReserves)?;
        let dy = try_div(dy, self.multipliers[token_index_to])?;
        let dy_fee = mul_div_floor(dy, self.params.fee, FEE_DENOMINATOR)?;

        Ok(TokenAmount::new(token_to.clone(), try_sub(dy, dy_fee)?))
    }

    /// Liquidity tokens minted for a deposit, or burned for a withdrawal, of `amounts`. Fees are
    /// not applied.
    pub fn calculate_token_amount(
        &self,
        amounts: &[TokenAmount],
        deposit: bool,
    ) -> Result<TokenAmount, SwapError> {
        if amounts.len() != self.pooled_tokens.len() {
            return Err(SwapError::InvalidPool("expected one amount per pooled token"));
        }
        for (amount, token) in amounts.iter().zip(&self.pooled_tokens) {
            amount.ensure_token(token)?;
        }
        self.ensure_liquid()?;

        let a = self.a_precise()?;
        let balances = self.raw_balances();
        let d0 = get_d(&self.xp(&balances)?, a, self.max_iterations)?;

        let adjusted = balances
            .iter()
            .zip(amounts)
            .map(|(balance, amount)| {
                if deposit {
                    Ok(try_add(*balance, amount.raw())?)
                } else {
                    balance
                        .checked_sub(amount.raw())
                        .ok_or(SwapError::InsufficientReserves)
                }
            })
            .collect::<Result<Vec<_>, SwapError>>()?;
        let d1 = get_d(&self.xp(&adjusted)?, a, self.max_iterations)?;

        let diff = if deposit {
            try_sub(d1, d0)?
        } else {
            try_sub(d0, d1)?
        };
        let raw = mul_div_floor(diff, self.total_supply.raw(), d0)?;
        Ok(TokenAmount::new(self.lp_token.clone(), raw))
    }

    /// Proportional withdrawal of every pooled token for `amount` liquidity tokens.
    pub fn calculate_remove_liquidity(
        &self,
        amount: &TokenAmount,
    ) -> Result<Vec<TokenAmount>, SwapError> {
        self.ensure_redeemable(amount)?;
        self.balances
            .iter()
            .map(|balance| {
                let raw = mul_div_floor(balance.raw(), amount.raw(), self.total_supply.raw())?;
                Ok(TokenAmount::new(balance.token().clone(), raw))
            })
            .collect()
    }

    /// Withdrawal of a single token for `amount` liquidity tokens. Returns the amount received
    /// and the imbalance fee charged on it.
    pub fn calculate_remove_liquidity_one_token(
        &self,
        amount: &TokenAmount,
        token_index: usize,
    ) -> Result<(TokenAmount, TokenAmount), SwapError> {
        let token = self.token_at(token_index)?.clone();
        self.ensure_redeemable(amount)?;
        self.ensure_liquid()?;

        let a = self.a_precise()?;
        let xp = self.xp(&self.raw_balances())?;
        let d0 = get_d(&xp, a, self.max_iterations)?;
        let d1 = try_sub(d0, mul_div_floor(amount.raw(), d0, self.total_supply.raw())?)?;
        // Burning the whole supply leaves nothing to price the other balances against.
        if d1.is_zero() {
            return Err(SwapError::InsufficientReserves);
        }
        let new_y = get_y_d(a, token_index, &xp, d1, self.max_iterations)?;

        // Charge the imbalance fee against each balance's distance from a proportional withdrawal.
        let fee_per_token = fee_per_token(self.params.fee, xp.len())?;
        let xp_reduced = xp
            .iter()
            .enumerate()
            .map(|(index, balance)| {
                let proportional = mul_div_floor(*balance, d1, d0)?;
                let expected_dx = if index == token_index {
                    try_sub(proportional, new_y)?
                } else {
                    try_sub(*balance, proportional)?
                };
                Ok(try_sub(
                    *balance,
                    mul_div_floor(expected_dx, fee_per_token, FEE_DENOMINATOR)?,
                )?)
            })
            .collect::<Result<Vec<_>, SwapError>>()?;

        let multiplier = self.multipliers[token_index];
        let dy = try_sub(
            xp_reduced[token_index],
            get_y_d(a, token_index, &xp_reduced, d1, self.max_iterations)?,
        )?;
        let dy = try_div(try_sub(dy, U256::ONE)?, multiplier)?;
        if dy > self.balances[token_index].raw() {
            return Err(SwapError::InsufficientReserves);
        }
        let without_fee = try_div(try_sub(xp[token_index], new_y)?, multiplier)?;
        let swap_fee = try_sub(without_fee, dy)?;

        Ok((
            TokenAmount::new(token.clone(), dy),
            TokenAmount::new(token, swap_fee),
        ))
    }

    fn token_at(&self, index: usize) -> Result<&Token, SwapError> {
        self.pooled_tokens
            .get(index)
            .ok_or(SwapError::InvalidPool("token index out of range"))
    }

    fn raw_balances(&self) -> Vec<U256> {
        self.balances.iter().map(TokenAmount::raw).collect()
    }

    /// Balances normalized to the pool precision.
    fn xp(&self, balances: &[U256]) -> Result<Vec<U256>, SwapError> {
        balances
            .iter()
            .zip(&self.multipliers)
            .map(|(balance, multiplier)| Ok(try_mul(*balance, *multiplier)?))
            .collect()
    }

    fn ensure_liquid(&self) -> Result<(), SwapError> {
        if self.balances.iter().any(TokenAmount::is_zero) {
            return Err(SwapError::InsufficientReserves);
        }
        Ok(())
    }

    fn ensure_redeemable(&self, amount: &TokenAmount) -> Result<(), SwapError> {
        amount.ensure_token(&self.lp_token)?;
        if self.total_supply.is_zero() || amount.raw() > self.total_supply.raw() {
            return Err(SwapError::InsufficientReserves);
        }
        Ok(())
    }
}

/// Swaps a constituent of `base_pool` into a token of the meta `pool`: the amount is deposited
/// into the base pool and the minted liquidity tokens are swapped in the meta pool, unless the
/// liquidity token itself is the target.
pub fn calculate_swap_from_base(
    pool: &StableSwap,
    base_pool: &StableSwap,
    token_index_from: usize,
    token_index_to: usize,
    amount: &TokenAmount,
) -> Result<TokenAmount, SwapError> {
    let base_token_index = pool.token_index(base_pool.lp_token())?;
    let mut base_amounts: Vec<TokenAmount> = base_pool
        .pooled_tokens()
        .iter()
        .map(|token| TokenAmount::zero(token.clone()))
        .collect();
    let slot = base_amounts
        .get_mut(token_index_from)
        .ok_or(SwapError::InvalidPool("token index out of range"))?;
    *slot = amount.clone();

    let base_lp_amount = base_pool.calculate_token_amount(&base_amounts, true)?;
    if base_token_index == token_index_to {
        return Ok(base_lp_amount);
    }
    pool.calculate_swap(base_token_index, token_index_to, &base_lp_amount)
}

/// Swaps a token of the meta `pool` into a constituent of `base_pool`: the amount is swapped for
/// the base liquidity token, which is then withdrawn as a single token.
pub fn calculate_swap_to_base(
    pool: &StableSwap,
    base_pool: &StableSwap,
    token_index_from: usize,
    token_index_to: usize,
    amount: &TokenAmount,
) -> Result<TokenAmount, SwapError> {
    let base_token_index = pool.token_index(base_pool.lp_token())?;
    let lp_amount = if base_token_index == token_index_from {
        amount.clone()
    } else {
        pool.calculate_swap(token_index_from, base_token_index, amount)?
    };
    let (output, _) = base_pool.calculate_remove_liquidity_one_token(&lp_amount, token_index_to)?;
    Ok(output)
}
