use alloy_primitives::U256;
use tracing::trace;

use crate::error::SwapError;
use crate::math::common::MathError;
use crate::model::amount::TokenAmount;
use crate::model::token::Token;
use crate::pool::standard::StandardPool;
use crate::solver::common::BestTradeOptions;
use crate::solver::search::best_trade_exact_in;
use crate::solver::trade::Trade;

/// An exact-input amount divided between the best route and the direct pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinglePoolSplit {
    /// Part of the input sent through `route_trade`.
    pub route_input: TokenAmount,
    pub route_trade: Trade,
    pub route_output: TokenAmount,
    /// Remainder sent through the direct pair.
    pub pool_input: TokenAmount,
    /// `pool_input` quoted at the spot price of `next_pair`.
    pub pool_estimated_output: TokenAmount,
    pub next_pair: StandardPool,
}

impl SinglePoolSplit {
    fn output_gap(&self) -> U256 {
        let route = self.route_output.raw();
        let pool = self.pool_estimated_output.raw();
        if route > pool { route - pool } else { pool - route }
    }
}

/// Bisects the share of `amount_in` routed through the best trade until the route output and
/// the direct-pair estimate for the remainder are within one unit of each other.
pub fn best_single_token_pool(
    pairs: &[StandardPool],
    amount_in: &TokenAmount,
    token_out: &Token,
    options: &BestTradeOptions,
) -> Result<SinglePoolSplit, SwapError> {
    let total = TokenAmount::new(amount_in.token().wrapped(), amount_in.raw());
    let token_out = token_out.wrapped();
    let base_pair = pairs
        .iter()
        .find(|pair| pair.involves_token(total.token()) && pair.involves_token(&token_out))
        .ok_or(SwapError::NoDirectPool)?;

    let two = U256::from(2);
    let mut delta = total.raw() / two;
    let mut split = evaluate_split(
        pairs,
        base_pair,
        &total,
        TokenAmount::new(total.token().clone(), delta),
        &token_out,
        options,
    )?;
    delta /= two;

    while split.output_gap() >= two && delta >= two {
        let current = split.route_input.raw();
        let route_input = if split.route_output.raw() > split.pool_estimated_output.raw() {
            current.checked_sub(delta).ok_or(MathError::Underflow)?
        } else {
            current.checked_add(delta).ok_or(MathError::Overflow)?
        };
        trace!(%route_input, %delta, "moving split");
        split = evaluate_split(
            pairs,
            base_pair,
            &total,
            TokenAmount::new(total.token().clone(), route_input),
            &token_out,
            options,
        )?;
        delta /= two;
    }

    Ok(split)
}

fn evaluate_split(
    pairs: &[StandardPool],
    base_pair: &StandardPool,
    total: &TokenAmount,
    route_input: TokenAmount,
    token_out: &Token,
    options: &BestTradeOptions,
) -> Result<SinglePoolSplit, SwapError> {
    let route_trade = best_trade_exact_in(pairs, &route_input, token_out, options)?
        .into_iter()
        .next()
        .ok_or(SwapError::InsufficientInputAmount)?;
    let pool_input = total.checked_sub(&route_input)?;

    // A direct route has already moved the pair, so the remainder is quoted on its new state.
    let next_pair = match route_trade.next_pools() {
        [Some(pair)] => pair.clone(),
        _ => base_pair.clone(),
    };
    let pool_estimated_output = next_pair.price_of(total.token())?.quote(&pool_input)?;

    Ok(SinglePoolSplit {
        route_output: route_trade.output_amount().clone(),
        route_input,
        route_trade,
        pool_input,
        pool_estimated_output,
        next_pair,
    })
}
