use tracing::{debug, trace};

use crate::error::SwapError;
use crate::model::amount::TokenAmount;
use crate::model::token::Token;
use crate::pool::stable::StableSwap;
use crate::pool::standard::StandardPool;
use crate::solver::common::{BestTradeOptions, TradeType, sorted_insert};
use crate::solver::pair::{
    AbstractPair, PoolKey, convert_stable_swaps_to_abstract_pairs,
    convert_standard_pools_to_abstract_pairs,
};
use crate::solver::route::{Hop, Route};
use crate::solver::trade::{Trade, trade_comparator};

/// Search state at one depth: the amount reached so far and the next pair to try from it.
struct Frame {
    amount: TokenAmount,
    hops: Vec<Hop>,
    used: Vec<PoolKey>,
    hops_left: usize,
    next_pair: usize,
}

/// Top trades from an exact input through constant-product pools.
pub fn best_trade_exact_in(
    pairs: &[StandardPool],
    amount_in: &TokenAmount,
    token_out: &Token,
    options: &BestTradeOptions,
) -> Result<Vec<Trade>, SwapError> {
    if pairs.is_empty() {
        return Err(SwapError::NoPools);
    }
    let pairs = convert_standard_pools_to_abstract_pairs(pairs);
    search(&pairs, amount_in, token_out, TradeType::ExactInput, options)
}

/// Top trades for an exact output through constant-product pools.
pub fn best_trade_exact_out(
    pairs: &[StandardPool],
    token_in: &Token,
    amount_out: &TokenAmount,
    options: &BestTradeOptions,
) -> Result<Vec<Trade>, SwapError> {
    if pairs.is_empty() {
        return Err(SwapError::NoPools);
    }
    let pairs = convert_standard_pools_to_abstract_pairs(pairs);
    search(&pairs, amount_out, token_in, TradeType::ExactOutput, options)
}

/// Top trades from an exact input through constant-product and stable pools together.
pub fn best_trade_exact_in_mixed(
    pairs: &[StandardPool],
    stable_swaps: &[StableSwap],
    amount_in: &TokenAmount,
    token_out: &Token,
    options: &BestTradeOptions,
) -> Result<Vec<Trade>, SwapError> {
    if pairs.is_empty() && stable_swaps.is_empty() {
        return Err(SwapError::NoPools);
    }
    let mut all_pairs = convert_standard_pools_to_abstract_pairs(pairs);
    all_pairs.extend(convert_stable_swaps_to_abstract_pairs(stable_swaps)?);
    search(&all_pairs, amount_in, token_out, TradeType::ExactInput, options)
}

/// Depth-first walk over `pairs` from `amount` towards `target`, visiting candidates in the same
/// order a recursive walk would. Exact input walks forwards from the input token; exact output
/// walks backwards from the output token through constant-product pairs only.
fn search(
    pairs: &[AbstractPair],
    amount: &TokenAmount,
    target: &Token,
    trade_type: TradeType,
    options: &BestTradeOptions,
) -> Result<Vec<Trade>, SwapError> {
    options.validate()?;
    debug!(
        pairs = pairs.len(),
        ?trade_type,
        max_hops = options.max_hops,
        "searching for best trades"
    );

    let chain_id = amount.token().chain_id();
    let mut best_trades: Vec<Trade> = Vec::new();
    let mut stack = vec![Frame {
        amount: amount.clone(),
        hops: Vec::new(),
        used: Vec::new(),
        hops_left: options.max_hops,
        next_pair: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some((index, pair)) = pairs
            .iter()
            .enumerate()
            .skip(frame.next_pair)
            .find(|(_, pair)| is_candidate(pair, frame.amount.token(), &frame.used))
        else {
            stack.pop();
            continue;
        };
        frame.next_pair = index + 1;

        let step = match trade_type {
            TradeType::ExactInput => step_forward(pair, &frame.amount),
            TradeType::ExactOutput => step_backward(pair, &frame.amount),
        };
        let (hop, next_amount) = match step {
            Ok(step) => step,
            Err(error) if error.is_recoverable() => {
                trace!(%error, pair = index, "skipping pair");
                continue;
            }
            Err(error) => return Err(error),
        };

        let mut hops = frame.hops.clone();
        match trade_type {
            TradeType::ExactInput => hops.push(hop),
            TradeType::ExactOutput => hops.insert(0, hop),
        }

        if next_amount.token() == target {
            let trade = match trade_type {
                TradeType::ExactInput => Trade::new(
                    Route::new(chain_id, hops, amount.token(), Some(target))?,
                    amount.clone(),
                    TradeType::ExactInput,
                )?,
                TradeType::ExactOutput => Trade::new(
                    Route::new(chain_id, hops, target, Some(amount.token()))?,
                    amount.clone(),
                    TradeType::ExactOutput,
                )?,
            };
            sorted_insert(
                &mut best_trades,
                trade,
                options.max_num_results,
                trade_comparator,
            )?;
        } else if frame.hops_left > 1 {
            let mut used = frame.used.clone();
            used.extend_from_slice(pair.keys());
            let hops_left = frame.hops_left - 1;
            stack.push(Frame {
                amount: next_amount,
                hops,
                used,
                hops_left,
                next_pair: 0,
            });
        }
    }

    debug!(results = best_trades.len(), "search finished");
    Ok(best_trades)
}

fn is_candidate(pair: &AbstractPair, token: &Token, used: &[PoolKey]) -> bool {
    pair.involves_token(token)
        && !pair.has_empty_reserve()
        && !pair.keys().iter().any(|key| used.contains(key))
}

fn step_forward(pair: &AbstractPair, amount_in: &TokenAmount) -> Result<(Hop, TokenAmount), SwapError> {
    let hop = pair.hop_for(amount_in.token())?;
    let (amount_out, _) = hop.get_output_amount(amount_in)?;
    Ok((hop, amount_out))
}

fn step_backward(
    pair: &AbstractPair,
    amount_out: &TokenAmount,
) -> Result<(Hop, TokenAmount), SwapError> {
    if pair.is_stable() {
        return Err(SwapError::UnsupportedTradeDirection);
    }
    let input = pair.other_token(amount_out.token())?;
    let hop = pair.hop_for(input)?;
    let (amount_in, _) = hop.get_input_amount(amount_out)?;
    Ok((hop, amount_in))
}
