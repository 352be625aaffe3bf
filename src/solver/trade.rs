use std::cmp::Ordering;

use crate::error::SwapError;
use crate::math::common::{from_big_int, to_big_int};
use crate::math::fraction::{Fraction, Percent};
use crate::model::amount::TokenAmount;
use crate::model::price::Price;
use crate::pool::standard::StandardPool;
use crate::solver::common::TradeType;
use crate::solver::route::Route;

/// A route evaluated for one amount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trade {
    route: Route,
    trade_type: TradeType,
    input_amount: TokenAmount,
    output_amount: TokenAmount,
    execution_price: Price,
    price_impact: Percent,
    /// Constant-product pools after the trade, `None` for stable legs.
    next_pools: Vec<Option<StandardPool>>,
}

impl Trade {
    /// Walks the route forwards from an exact input, or backwards from an exact output.
    pub fn new(route: Route, amount: TokenAmount, trade_type: TradeType) -> Result<Self, SwapError> {
        let hop_count = route.hops().len();
        let mut next_pools = vec![None; hop_count];

        let (input_amount, output_amount) = match trade_type {
            TradeType::ExactInput => {
                amount.ensure_token(route.input())?;
                let mut current = amount.clone();
                for (hop, next_pool) in route.hops().iter().zip(next_pools.iter_mut()) {
                    let (output, next) = hop.get_output_amount(&current)?;
                    *next_pool = next;
                    current = output;
                }
                (amount, current)
            }
            TradeType::ExactOutput => {
                amount.ensure_token(route.output())?;
                let mut current = amount.clone();
                for (hop, next_pool) in route.hops().iter().zip(next_pools.iter_mut()).rev() {
                    let (input, next) = hop.get_input_amount(&current)?;
                    *next_pool = Some(next);
                    current = input;
                }
                (current, amount)
            }
        };

        let execution_price = Price::from_amounts(&input_amount, &output_amount)?;
        let price_impact = compute_price_impact(&route.mid_price()?, &input_amount, &output_amount)?;

        Ok(Self {
            route,
            trade_type,
            input_amount,
            output_amount,
            execution_price,
            price_impact,
            next_pools,
        })
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn trade_type(&self) -> TradeType {
        self.trade_type
    }

    pub fn input_amount(&self) -> &TokenAmount {
        &self.input_amount
    }

    pub fn output_amount(&self) -> &TokenAmount {
        &self.output_amount
    }

    pub fn execution_price(&self) -> &Price {
        &self.execution_price
    }

    pub fn price_impact(&self) -> &Percent {
        &self.price_impact
    }

    pub fn next_pools(&self) -> &[Option<StandardPool>] {
        &self.next_pools
    }

    /// Mid price of the route over the post-trade pools. `None` when the route has a stable leg.
    pub fn next_mid_price(&self) -> Result<Option<Price>, SwapError> {
        let Some(pools) = self.next_pools.iter().cloned().collect::<Option<Vec<_>>>() else {
            return Ok(None);
        };
        let route = Route::from_standard_pools(
            self.route.chain_id(),
            pools,
            self.route.input(),
            None,
        )?;
        route.mid_price().map(Some)
    }

    /// Least output accepted under `slippage_tolerance`. Exact-output trades return the output.
    pub fn minimum_amount_out(&self, slippage_tolerance: &Percent) -> Result<TokenAmount, SwapError> {
        let factor = slippage_factor(slippage_tolerance)?;
        if self.trade_type == TradeType::ExactOutput {
            return Ok(self.output_amount.clone());
        }
        let adjusted = &factor.invert()? * &self.output_amount.as_fraction();
        Ok(TokenAmount::new(
            self.output_amount.token().clone(),
            from_big_int(&adjusted.quotient())?,
        ))
    }

    /// Most input spent under `slippage_tolerance`. Exact-input trades return the input.
    pub fn maximum_amount_in(&self, slippage_tolerance: &Percent) -> Result<TokenAmount, SwapError> {
        let factor = slippage_factor(slippage_tolerance)?;
        if self.trade_type == TradeType::ExactInput {
            return Ok(self.input_amount.clone());
        }
        let adjusted = &factor * &self.input_amount.as_fraction();
        Ok(TokenAmount::new(
            self.input_amount.token().clone(),
            from_big_int(&adjusted.quotient())?,
        ))
    }

    /// Execution price at the slippage bounds.
    pub fn worst_execution_price(&self, slippage_tolerance: &Percent) -> Result<Price, SwapError> {
        Price::new(
            self.input_amount.token().clone(),
            self.output_amount.token().clone(),
            to_big_int(self.maximum_amount_in(slippage_tolerance)?.raw()),
            to_big_int(self.minimum_amount_out(slippage_tolerance)?.raw()),
        )
    }
}

fn slippage_factor(slippage_tolerance: &Percent) -> Result<Fraction, SwapError> {
    if slippage_tolerance.is_negative() {
        return Err(SwapError::SlippageToleranceInvalid);
    }
    Ok(&Fraction::from_integer(1) + slippage_tolerance.as_fraction())
}

/// `(mid * input - output) / (mid * input)`: how far the output falls short of the spot quote.
pub fn compute_price_impact(
    mid_price: &Price,
    input_amount: &TokenAmount,
    output_amount: &TokenAmount,
) -> Result<Percent, SwapError> {
    let exact_quote = mid_price.raw() * &input_amount.as_fraction();
    let slippage = (&exact_quote - &output_amount.as_fraction()).checked_div(&exact_quote)?;
    Ok(Percent::from(slippage))
}

/// Most output first, then least input.
pub fn input_output_comparator(a: &Trade, b: &Trade) -> Ordering {
    b.output_amount
        .raw()
        .cmp(&a.output_amount.raw())
        .then_with(|| a.input_amount.raw().cmp(&b.input_amount.raw()))
}

/// Ranks trades between the same tokens: better amounts, then fewer hops, then lower price impact.
pub fn trade_comparator(a: &Trade, b: &Trade) -> Ordering {
    input_output_comparator(a, b)
        .then_with(|| a.route.hops().len().cmp(&b.route.hops().len()))
        .then_with(|| a.price_impact.cmp(&b.price_impact))
}
