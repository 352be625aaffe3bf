use std::cmp::Ordering;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::SwapError;
use crate::math::fraction::Percent;
use crate::model::amount::TokenAmount;
use crate::model::token::Token;
use crate::pool::stable::{StableSwap, StableSwapParams};
use crate::pool::standard::StandardPool;

pub const DEFAULT_MAX_HOPS: usize = 3;
pub const DEFAULT_MAX_NUM_RESULTS: usize = 3;
pub const DEFAULT_SLIPPAGE_BIPS: u64 = 50;

/// A longer trade only replaces a shorter one when it improves the execution price by more than
/// this many basis points.
pub const BETTER_TRADE_LESS_HOPS_THRESHOLD_BIPS: u64 = 50;

pub fn better_trade_less_hops_threshold() -> Percent {
    Percent::from_bips(BETTER_TRADE_LESS_HOPS_THRESHOLD_BIPS)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeType {
    /// The input amount is fixed and the output is derived.
    ExactInput,
    /// The output amount is fixed and the input is derived.
    ExactOutput,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BestTradeOptions {
    /// Maximum number of pools a returned route may go through.
    #[serde(default = "default_max_hops")]
    pub max_hops: usize,
    /// Maximum number of trades kept by a search.
    #[serde(default = "default_max_num_results")]
    pub max_num_results: usize,
}

fn default_max_hops() -> usize {
    DEFAULT_MAX_HOPS
}

fn default_max_num_results() -> usize {
    DEFAULT_MAX_NUM_RESULTS
}

fn default_slippage_bips() -> u64 {
    DEFAULT_SLIPPAGE_BIPS
}

impl Default for BestTradeOptions {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            max_num_results: DEFAULT_MAX_NUM_RESULTS,
        }
    }
}

impl BestTradeOptions {
    pub fn new(max_hops: usize, max_num_results: usize) -> Self {
        Self {
            max_hops,
            max_num_results,
        }
    }

    pub fn validate(&self) -> Result<(), SwapError> {
        if self.max_hops == 0 {
            return Err(SwapError::InvalidHops);
        }
        if self.max_num_results == 0 {
            return Err(SwapError::InvalidResultLimit);
        }
        Ok(())
    }
}

/// Inserts `add` into the sorted, bounded `items`. Equal items keep their insertion order.
/// Returns whichever item fell off the end, which may be `add` itself.
pub fn sorted_insert<T>(
    items: &mut Vec<T>,
    add: T,
    max_size: usize,
    comparator: impl Fn(&T, &T) -> Ordering,
) -> Result<Option<T>, SwapError> {
    if max_size == 0 || items.len() > max_size {
        return Err(SwapError::InvalidResultLimit);
    }

    let is_full = items.len() == max_size;
    if let Some(last) = items.last() {
        if is_full && comparator(last, &add) != Ordering::Greater {
            return Ok(Some(add));
        }
    }

    let index = items.partition_point(|item| comparator(item, &add) != Ordering::Greater);
    items.insert(index, add);
    Ok(if is_full { items.pop() } else { None })
}

/// Constant-product pool as supplied by a chain adapter. The reserves may be in either order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardPoolSnapshot {
    pub liquidity_token: Token,
    pub total_supply: U256,
    pub token_a: Token,
    pub reserve_a: U256,
    pub token_b: Token,
    pub reserve_b: U256,
}

impl StandardPoolSnapshot {
    pub fn to_pool(&self) -> Result<StandardPool, SwapError> {
        StandardPool::new(
            TokenAmount::new(self.liquidity_token.clone(), self.total_supply),
            TokenAmount::new(self.token_a.clone(), self.reserve_a),
            TokenAmount::new(self.token_b.clone(), self.reserve_b),
        )
    }
}

/// StableSwap pool as supplied by a chain adapter. Balances follow `pooled_tokens`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StableSwapSnapshot {
    pub chain_id: u32,
    pub address: String,
    pub pooled_tokens: Vec<Token>,
    pub lp_token: Token,
    pub total_supply: U256,
    pub balances: Vec<U256>,
    pub fee: U256,
    pub admin_fee: U256,
    pub a: U256,
    pub virtual_price: U256,
}

impl StableSwapSnapshot {
    pub fn to_pool(&self) -> Result<StableSwap, SwapError> {
        if self.balances.len() != self.pooled_tokens.len() {
            return Err(SwapError::InvalidPool("expected one balance per pooled token"));
        }
        let balances = self
            .pooled_tokens
            .iter()
            .zip(&self.balances)
            .map(|(token, balance)| TokenAmount::new(token.clone(), *balance))
            .collect();
        StableSwap::new(
            self.chain_id,
            self.address.clone(),
            self.pooled_tokens.clone(),
            self.lp_token.clone(),
            TokenAmount::new(self.lp_token.clone(), self.total_supply),
            balances,
            StableSwapParams {
                fee: self.fee,
                admin_fee: self.admin_fee,
                a: self.a,
                virtual_price: self.virtual_price,
            },
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRequest {
    pub trade_type: TradeType,
    /// Raw amount of `token`: the input for exact input, the output for exact output.
    pub amount: U256,
    pub token: Token,
    pub other_token: Token,
    #[serde(default)]
    pub pools: Vec<StandardPoolSnapshot>,
    #[serde(default)]
    pub stable_swaps: Vec<StableSwapSnapshot>,
    #[serde(default)]
    pub options: BestTradeOptions,
    #[serde(default = "default_slippage_bips")]
    pub slippage_bips: u64,
}

/// One hop of a routed trade, with enough pool identity to encode a swap call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePathEntry {
    pub stable: bool,
    pub input: Token,
    pub output: Token,
    /// Liquidity token id for constant-product pools, contract address for stable pools.
    pub pool: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from_base: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingResponse {
    pub trade_type: TradeType,
    pub input_amount: U256,
    pub output_amount: U256,
    pub minimum_amount_out: U256,
    pub maximum_amount_in: U256,
    pub token_path: Vec<Token>,
    pub route_path: Vec<RoutePathEntry>,
    /// Percent with two decimals.
    pub price_impact: String,
    /// Output per input in whole tokens, six significant digits.
    pub execution_price: String,
    pub is_native: bool,
}
