use num::BigInt;

use crate::error::SwapError;
use crate::model::amount::TokenAmount;
use crate::model::price::Price;
use crate::model::token::Token;
use crate::pool::stable::{StableSwap, calculate_swap_from_base, calculate_swap_to_base};
use crate::pool::standard::StandardPool;
use crate::solver::common::RoutePathEntry;

/// One swap through a single pool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hop {
    Standard {
        input: Token,
        output: Token,
        pair: StandardPool,
    },
    Stable {
        input: Token,
        output: Token,
        pool: StableSwap,
    },
    /// Between a constituent of `base_pool` and a token of the meta `pool`, which holds the base
    /// pool's liquidity token. `from_base` is set when the input is the base constituent.
    StableMeta {
        input: Token,
        output: Token,
        pool: StableSwap,
        base_pool: StableSwap,
        from_base: bool,
    },
}

impl Hop {
    /// A hop through `pair` that sells `input` for the pair's other token.
    pub fn standard(pair: StandardPool, input: &Token) -> Result<Hop, SwapError> {
        let output = pair.other_token(input)?.clone();
        Ok(Hop::Standard {
            input: input.clone(),
            output,
            pair,
        })
    }

    pub fn input(&self) -> &Token {
        match self {
            Hop::Standard { input, .. } | Hop::Stable { input, .. } | Hop::StableMeta { input, .. } => {
                input
            }
        }
    }

    pub fn output(&self) -> &Token {
        match self {
            Hop::Standard { output, .. }
            | Hop::Stable { output, .. }
            | Hop::StableMeta { output, .. } => output,
        }
    }

    pub fn is_stable(&self) -> bool {
        !matches!(self, Hop::Standard { .. })
    }

    /// Output for `amount` of the hop's input. Constant-product hops also return the pool as it
    /// would be after the swap.
    pub fn get_output_amount(
        &self,
        amount: &TokenAmount,
    ) -> Result<(TokenAmount, Option<StandardPool>), SwapError> {
        amount.ensure_token(self.input())?;
        let output = match self {
            Hop::Standard { pair, .. } => {
                let (output, next) = pair.get_output_amount(amount)?;
                return Ok((output, Some(next)));
            }
            Hop::Stable {
                input,
                output,
                pool,
            } => pool.calculate_swap(pool.token_index(input)?, pool.token_index(output)?, amount)?,
            Hop::StableMeta {
                input,
                output,
                pool,
                base_pool,
                from_base: true,
            } => calculate_swap_from_base(
                pool,
                base_pool,
                base_pool.token_index(input)?,
                pool.token_index(output)?,
                amount,
            )?,
            Hop::StableMeta {
                input,
                output,
                pool,
                base_pool,
                from_base: false,
            } => calculate_swap_to_base(
                pool,
                base_pool,
                pool.token_index(input)?,
                base_pool.token_index(output)?,
                amount,
            )?,
        };
        if output.is_zero() {
            return Err(SwapError::InsufficientInputAmount);
        }
        Ok((output, None))
    }

    /// Input needed for `amount` of the hop's output. Only constant-product hops can be inverted.
    pub fn get_input_amount(
        &self,
        amount: &TokenAmount,
    ) -> Result<(TokenAmount, StandardPool), SwapError> {
        match self {
            Hop::Standard { pair, output, .. } => {
                amount.ensure_token(output)?;
                pair.get_input_amount(amount)
            }
            Hop::Stable { .. } | Hop::StableMeta { .. } => Err(SwapError::UnsupportedTradeDirection),
        }
    }

    /// Spot price of the output in terms of the input. Stable legs are quoted at par.
    pub fn mid_price(&self) -> Result<Price, SwapError> {
        match self {
            Hop::Standard { input, pair, .. } => pair.price_of(input),
            Hop::Stable { input, output, .. } | Hop::StableMeta { input, output, .. } => Price::new(
                input.clone(),
                output.clone(),
                BigInt::from(10u8).pow(u32::from(input.decimals())),
                BigInt::from(10u8).pow(u32::from(output.decimals())),
            ),
        }
    }

    pub fn path_entry(&self) -> RoutePathEntry {
        let (pool, base_pool, from_base) = match self {
            Hop::Standard { pair, .. } => (pair.liquidity_token().asset_id(), None, None),
            Hop::Stable { pool, .. } => (pool.address().to_string(), None, None),
            Hop::StableMeta {
                pool,
                base_pool,
                from_base,
                ..
            } => (
                pool.address().to_string(),
                Some(base_pool.address().to_string()),
                Some(*from_base),
            ),
        };
        RoutePathEntry {
            stable: self.is_stable(),
            input: self.input().clone(),
            output: self.output().clone(),
            pool,
            base_pool,
            from_base,
        }
    }
}

/// An ordered list of hops where each hop starts at the token the previous one ends at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    chain_id: u32,
    hops: Vec<Hop>,
    token_path: Vec<Token>,
}

impl Route {
    pub fn new(
        chain_id: u32,
        hops: Vec<Hop>,
        input: &Token,
        output: Option<&Token>,
    ) -> Result<Self, SwapError> {
        let Some(first) = hops.first() else {
            return Err(SwapError::InvalidRoute("route has no hops"));
        };
        if first.input() != input {
            return Err(SwapError::InvalidRoute("first hop does not start at the input token"));
        }

        let mut token_path = Vec::with_capacity(hops.len() + 1);
        token_path.push(input.clone());
        for hop in &hops {
            if Some(hop.input()) != token_path.last() {
                return Err(SwapError::InvalidRoute("consecutive hops do not chain"));
            }
            token_path.push(hop.output().clone());
        }

        if let Some(output) = output {
            if token_path.last() != Some(output) {
                return Err(SwapError::InvalidRoute("last hop does not end at the output token"));
            }
        }

        Ok(Self {
            chain_id,
            hops,
            token_path,
        })
    }

    /// Route through constant-product pools only, walking from `input`.
    pub fn from_standard_pools(
        chain_id: u32,
        pairs: Vec<StandardPool>,
        input: &Token,
        output: Option<&Token>,
    ) -> Result<Self, SwapError> {
        let mut hops = Vec::with_capacity(pairs.len());
        let mut current = input.clone();
        for pair in pairs {
            if !pair.involves_token(&current) {
                return Err(SwapError::InvalidRoute("pool does not trade the current token"));
            }
            let hop = Hop::standard(pair, &current)?;
            current = hop.output().clone();
            hops.push(hop);
        }
        Route::new(chain_id, hops, input, output)
    }

    pub fn chain_id(&self) -> u32 {
        self.chain_id
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn token_path(&self) -> &[Token] {
        &self.token_path
    }

    pub fn input(&self) -> &Token {
        &self.token_path[0]
    }

    pub fn output(&self) -> &Token {
        &self.token_path[self.token_path.len() - 1]
    }

    pub fn is_standard_only(&self) -> bool {
        self.hops.iter().all(|hop| !hop.is_stable())
    }

    pub fn path_entries(&self) -> Vec<RoutePathEntry> {
        self.hops.iter().map(Hop::path_entry).collect()
    }

    /// Product of every hop's spot price, quoting the output token in the input token.
    pub fn mid_price(&self) -> Result<Price, SwapError> {
        let mut hops = self.hops.iter();
        let Some(first) = hops.next() else {
            return Err(SwapError::InvalidRoute("route has no hops"));
        };
        hops.try_fold(first.mid_price()?, |price, hop| price.multiply(&hop.mid_price()?))
    }
}
