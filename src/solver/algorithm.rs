use tracing::debug;
#[cfg(target_arch = "wasm32")]
use tracing::warn;

use crate::error::SwapError;
use crate::math::fraction::{Fraction, Percent, Rounding};
use crate::model::amount::TokenAmount;
use crate::model::token::Token;
use crate::pool::stable::StableSwap;
use crate::pool::standard::StandardPool;
use crate::solver::common::{
    BestTradeOptions, RoutingRequest, RoutingResponse, TradeType,
    better_trade_less_hops_threshold,
};
use crate::solver::search::{best_trade_exact_in, best_trade_exact_in_mixed, best_trade_exact_out};
use crate::solver::trade::Trade;
#[cfg(target_arch = "wasm32")]
use serde_wasm_bindgen::{Error, from_value, to_value};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// The best trade for a swap, and whether the input is the chain's native token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapTrade {
    pub is_native: bool,
    pub trade: Option<Trade>,
}

/// Whether `trade_b` beats `trade_a` by more than `minimum_delta` in execution price.
pub fn is_trade_better(
    trade_a: Option<&Trade>,
    trade_b: Option<&Trade>,
    minimum_delta: &Percent,
) -> Result<bool, SwapError> {
    let (trade_a, trade_b) = match (trade_a, trade_b) {
        (Some(a), Some(b)) => (a, b),
        (None, Some(_)) => return Ok(true),
        _ => return Ok(false),
    };

    if trade_a.trade_type() != trade_b.trade_type()
        || trade_a.input_amount().token() != trade_b.input_amount().token()
        || trade_a.output_amount().token() != trade_b.output_amount().token()
    {
        return Err(SwapError::IncomparableTrades);
    }

    let price_a = trade_a.execution_price().raw();
    let price_b = trade_b.execution_price().raw();
    if minimum_delta.as_fraction().is_zero() {
        return Ok(price_a < price_b);
    }
    let raised = price_a * &(&Fraction::from_integer(1) + minimum_delta.as_fraction());
    Ok(&raised < price_b)
}

/// Runs the search once per hop count and keeps the single best trade. A longer route only wins
/// when it beats the best shorter one by more than the default threshold.
pub fn all_best_trade(
    trade_type: TradeType,
    amount: &TokenAmount,
    other_token: &Token,
    pairs: &[StandardPool],
    stable_swaps: &[StableSwap],
    options: &BestTradeOptions,
) -> Result<Vec<Trade>, SwapError> {
    all_best_trade_with_threshold(
        trade_type,
        amount,
        other_token,
        pairs,
        stable_swaps,
        options,
        &better_trade_less_hops_threshold(),
    )
}

pub fn all_best_trade_with_threshold(
    trade_type: TradeType,
    amount: &TokenAmount,
    other_token: &Token,
    pairs: &[StandardPool],
    stable_swaps: &[StableSwap],
    options: &BestTradeOptions,
    minimum_delta: &Percent,
) -> Result<Vec<Trade>, SwapError> {
    options.validate()?;

    let amount = TokenAmount::new(amount.token().wrapped(), amount.raw());
    let other_token = other_token.wrapped();
    // Stable legs cannot be walked backwards.
    let stable_swaps: &[StableSwap] = match trade_type {
        TradeType::ExactInput => stable_swaps,
        TradeType::ExactOutput => &[],
    };
    if pairs.is_empty() && stable_swaps.is_empty() {
        return Ok(Vec::new());
    }

    let mut best_so_far: Option<Trade> = None;
    for max_hops in 1..=options.max_hops {
        let hop_options = BestTradeOptions::new(max_hops, 1);
        let trades = match trade_type {
            TradeType::ExactInput if stable_swaps.is_empty() => {
                best_trade_exact_in(pairs, &amount, &other_token, &hop_options)?
            }
            TradeType::ExactInput => {
                best_trade_exact_in_mixed(pairs, stable_swaps, &amount, &other_token, &hop_options)?
            }
            TradeType::ExactOutput => {
                best_trade_exact_out(pairs, &other_token, &amount, &hop_options)?
            }
        };
        let current = trades.into_iter().next();
        if is_trade_better(best_so_far.as_ref(), current.as_ref(), minimum_delta)? {
            best_so_far = current;
        }
    }

    debug!(found = best_so_far.is_some(), ?trade_type, "all best trade finished");
    Ok(best_so_far.into_iter().collect())
}

pub fn swap_exact_tokens_for_tokens(
    amount_in: &TokenAmount,
    token_out: &Token,
    pairs: &[StandardPool],
    options: &BestTradeOptions,
) -> Result<SwapTrade, SwapError> {
    swap_exact_tokens_for_tokens_mixed(amount_in, token_out, pairs, &[], options)
}

pub fn swap_exact_tokens_for_tokens_mixed(
    amount_in: &TokenAmount,
    token_out: &Token,
    pairs: &[StandardPool],
    stable_swaps: &[StableSwap],
    options: &BestTradeOptions,
) -> Result<SwapTrade, SwapError> {
    let trades = all_best_trade(
        TradeType::ExactInput,
        amount_in,
        token_out,
        pairs,
        stable_swaps,
        options,
    )?;
    Ok(SwapTrade {
        is_native: amount_in.token().is_native(),
        trade: trades.into_iter().next(),
    })
}

/// Exact-output swaps route through constant-product pools only.
pub fn swap_tokens_for_exact_tokens(
    token_in: &Token,
    amount_out: &TokenAmount,
    pairs: &[StandardPool],
    options: &BestTradeOptions,
) -> Result<SwapTrade, SwapError> {
    let trades = all_best_trade(
        TradeType::ExactOutput,
        amount_out,
        token_in,
        pairs,
        &[],
        options,
    )?;
    Ok(SwapTrade {
        is_native: token_in.is_native(),
        trade: trades.into_iter().next(),
    })
}

/// Builds the pools of a request and routes it. `None` when no route connects the tokens.
pub fn route_request(request: &RoutingRequest) -> Result<Option<RoutingResponse>, SwapError> {
    let pairs = request
        .pools
        .iter()
        .map(|snapshot| snapshot.to_pool())
        .collect::<Result<Vec<_>, _>>()?;
    let stable_swaps = request
        .stable_swaps
        .iter()
        .map(|snapshot| snapshot.to_pool())
        .collect::<Result<Vec<_>, _>>()?;
    let amount = TokenAmount::new(request.token.clone(), request.amount);
    debug!(
        pools = pairs.len(),
        stable_swaps = stable_swaps.len(),
        trade_type = ?request.trade_type,
        "routing request"
    );

    let swap = match request.trade_type {
        TradeType::ExactInput => swap_exact_tokens_for_tokens_mixed(
            &amount,
            &request.other_token,
            &pairs,
            &stable_swaps,
            &request.options,
        )?,
        TradeType::ExactOutput => swap_tokens_for_exact_tokens(
            &request.other_token,
            &amount,
            &pairs,
            &request.options,
        )?,
    };
    let Some(trade) = swap.trade else {
        return Ok(None);
    };

    let slippage = Percent::from_bips(request.slippage_bips);
    Ok(Some(RoutingResponse {
        trade_type: trade.trade_type(),
        input_amount: trade.input_amount().raw(),
        output_amount: trade.output_amount().raw(),
        minimum_amount_out: trade.minimum_amount_out(&slippage)?.raw(),
        maximum_amount_in: trade.maximum_amount_in(&slippage)?.raw(),
        token_path: trade.route().token_path().to_vec(),
        route_path: trade.route().path_entries(),
        price_impact: trade.price_impact().to_fixed(2, Rounding::RoundHalfUp),
        execution_price: trade
            .execution_price()
            .to_significant(6, Rounding::RoundHalfUp)?,
        is_native: swap.is_native,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::token::tests::token;
    use crate::model::token::{AssetMeta, AssetType};
    use crate::pool::stable::tests::{dai, frax, meta_pool, three_pool, usdc, usdt};
    use crate::pool::standard::tests::pool;
    use crate::solver::common::RoutePathEntry;
    use crate::solver::route::tests::{any_eth, pair};
    use alloy_primitives::{U256, uint};

    fn tokens() -> [Token; 3] {
        [
            token(200, 0, "T0", 12),
            token(200, 1, "T1", 12),
            token(200, 2, "T2", 12),
        ]
    }

    fn standard_pools() -> Vec<StandardPool> {
        let [t0, t1, t2] = tokens();
        vec![
            pool("p01", &t0, 1000, &t1, 1000),
            pool("p02", &t0, 1000, &t2, 1100),
            pool("p12", &t1, 1200, &t2, 1000),
        ]
    }

    fn amount(token: &Token, raw: u64) -> TokenAmount {
        TokenAmount::new(token.clone(), U256::from(raw))
    }

    fn e18(value: u64) -> U256 {
        U256::from(value) * uint!(1000000000000000000_U256)
    }

    fn mixed_pools() -> Vec<StandardPool> {
        vec![
            pair(
                "usdc-dai",
                &usdc(),
                uint!(10000000_U256),
                &dai(),
                uint!(10500000000000000000_U256),
            ),
            pair("dai-eth", &dai(), e18(100), &any_eth(), e18(110)),
            pair("dai-frax", &dai(), e18(100), &frax(), e18(80)),
            pair("eth-frax", &any_eth(), e18(100), &frax(), e18(100)),
        ]
    }

    #[test]
    fn test_is_trade_better() {
        let [t0, _, t2] = tokens();
        let trades = best_trade_exact_in(
            &standard_pools(),
            &amount(&t0, 100),
            &t2,
            &BestTradeOptions::default(),
        )
        .unwrap();
        let (direct, indirect) = (&trades[0], &trades[1]);

        assert!(!is_trade_better(None, None, &Percent::zero()).unwrap());
        assert!(!is_trade_better(Some(direct), None, &Percent::zero()).unwrap());
        assert!(is_trade_better(None, Some(direct), &Percent::zero()).unwrap());

        assert!(is_trade_better(Some(indirect), Some(direct), &Percent::zero()).unwrap());
        assert!(!is_trade_better(Some(direct), Some(indirect), &Percent::zero()).unwrap());
        assert!(!is_trade_better(Some(direct), Some(direct), &Percent::zero()).unwrap());

        // 69 -> 99 is a 43% improvement.
        assert!(
            is_trade_better(Some(indirect), Some(direct), &Percent::new(40, 100).unwrap()).unwrap()
        );
        assert!(
            !is_trade_better(Some(indirect), Some(direct), &Percent::new(45, 100).unwrap())
                .unwrap()
        );
    }

    #[test]
    fn test_is_trade_better_rejects_incomparable_trades() {
        let [t0, t1, t2] = tokens();
        let pools = standard_pools();
        let to_t2 = best_trade_exact_in(&pools, &amount(&t0, 100), &t2, &BestTradeOptions::default())
            .unwrap();
        let to_t1 = best_trade_exact_in(&pools, &amount(&t0, 100), &t1, &BestTradeOptions::default())
            .unwrap();
        assert_eq!(
            is_trade_better(Some(&to_t2[0]), Some(&to_t1[0]), &Percent::zero()).unwrap_err(),
            SwapError::IncomparableTrades
        );

        let exact_out =
            best_trade_exact_out(&pools, &t0, &amount(&t2, 10), &BestTradeOptions::default())
                .unwrap();
        assert_eq!(
            is_trade_better(Some(&to_t2[0]), Some(&exact_out[0]), &Percent::zero()).unwrap_err(),
            SwapError::IncomparableTrades
        );
    }

    #[test]
    fn test_all_best_trade() {
        let [t0, _, t2] = tokens();
        let trades = all_best_trade(
            TradeType::ExactInput,
            &amount(&t0, 100),
            &t2,
            &standard_pools(),
            &[],
            &BestTradeOptions::default(),
        )
        .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].output_amount(), &amount(&t2, 99));

        let trades = all_best_trade(
            TradeType::ExactOutput,
            &amount(&t2, 100),
            &t0,
            &standard_pools(),
            &[],
            &BestTradeOptions::default(),
        )
        .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].input_amount(), &amount(&t0, 101));
    }

    #[test]
    fn test_all_best_trade_boundaries() {
        let [t0, _, t2] = tokens();
        assert!(
            all_best_trade(
                TradeType::ExactInput,
                &amount(&t0, 100),
                &t2,
                &[],
                &[],
                &BestTradeOptions::default(),
            )
            .unwrap()
            .is_empty()
        );
        assert_eq!(
            all_best_trade(
                TradeType::ExactInput,
                &amount(&t0, 100),
                &t2,
                &standard_pools(),
                &[],
                &BestTradeOptions::new(0, 3),
            )
            .unwrap_err(),
            SwapError::InvalidHops
        );
        assert_eq!(
            all_best_trade(
                TradeType::ExactInput,
                &amount(&t0, 100),
                &t2,
                &[],
                &[],
                &BestTradeOptions::new(0, 3),
            )
            .unwrap_err(),
            SwapError::InvalidHops
        );
    }

    #[test]
    fn test_all_best_trade_prefers_fewer_hops_within_threshold() {
        let [t0, t1, t2] = tokens();
        // The two-hop route gives 108 against the direct 99.
        let pools = vec![
            pool("p01", &t0, 100000, &t1, 100000),
            pool("p12", &t1, 100000, &t2, 110000),
            pool("p02", &t0, 100000, &t2, 100000),
        ];
        let trades = all_best_trade_with_threshold(
            TradeType::ExactInput,
            &amount(&t0, 100),
            &t2,
            &pools,
            &[],
            &BestTradeOptions::default(),
            &Percent::new(50, 100).unwrap(),
        )
        .unwrap();
        assert_eq!(trades[0].route().hops().len(), 1);
        assert_eq!(trades[0].output_amount(), &amount(&t2, 99));

        let trades = all_best_trade(
            TradeType::ExactInput,
            &amount(&t0, 100),
            &t2,
            &pools,
            &[],
            &BestTradeOptions::default(),
        )
        .unwrap();
        assert_eq!(trades[0].route().hops().len(), 2);
        assert_eq!(trades[0].output_amount(), &amount(&t2, 108));
    }

    #[test]
    fn test_swap_exact_tokens_for_tokens_mixed() {
        let swap = swap_exact_tokens_for_tokens_mixed(
            &TokenAmount::new(frax(), e18(1)),
            &usdt(),
            &mixed_pools(),
            &[three_pool(), meta_pool()],
            &BestTradeOptions::default(),
        )
        .unwrap();
        assert!(!swap.is_native);
        let trade = swap.trade.unwrap();
        assert_eq!(trade.route().token_path(), &[frax(), dai(), usdt()]);
        assert_eq!(trade.output_amount().raw(), uint!(1230291_U256));
        assert_eq!(
            trade.minimum_amount_out(&Percent::zero()).unwrap().raw(),
            uint!(1230291_U256)
        );
        assert_eq!(
            trade
                .minimum_amount_out(&Percent::new(5, 100).unwrap())
                .unwrap()
                .raw(),
            uint!(1171705_U256)
        );
        assert_eq!(
            trade
                .minimum_amount_out(&Percent::new(200, 100).unwrap())
                .unwrap()
                .raw(),
            uint!(410097_U256)
        );

        let swap = swap_exact_tokens_for_tokens_mixed(
            &TokenAmount::new(frax(), e18(1)),
            &usdt(),
            &mixed_pools(),
            &[three_pool(), meta_pool()],
            &BestTradeOptions::new(1, 3),
        )
        .unwrap();
        assert_eq!(swap.trade.unwrap().output_amount().raw(), uint!(999220_U256));
    }

    #[test]
    fn test_swap_reports_native_tokens() {
        let [t0, t1, _] = tokens();
        let native = Token::new(AssetMeta {
            asset_type: AssetType::NATIVE_TOKEN,
            ..t0.meta().clone()
        });
        let pools = vec![pool("p", &native, 1000, &t1, 1000)];
        let swap =
            swap_exact_tokens_for_tokens(&amount(&native, 100), &t1, &pools, &BestTradeOptions::default())
                .unwrap();
        assert!(swap.is_native);
        assert_eq!(swap.trade.unwrap().output_amount(), &amount(&t1, 90));

        // Only a native input is flagged.
        let swap =
            swap_tokens_for_exact_tokens(&t1, &amount(&native, 90), &pools, &BestTradeOptions::default())
                .unwrap();
        assert!(!swap.is_native);
        assert!(swap.trade.is_some());

        let swap =
            swap_exact_tokens_for_tokens(&amount(&t1, 100), &native, &pools, &BestTradeOptions::default())
                .unwrap();
        assert!(!swap.is_native);
        assert_eq!(swap.trade.unwrap().output_amount(), &amount(&native, 90));

        let swap =
            swap_tokens_for_exact_tokens(&native, &amount(&t1, 90), &pools, &BestTradeOptions::default())
                .unwrap();
        assert!(swap.is_native);

        let swap =
            swap_exact_tokens_for_tokens(&amount(&t0, 100), &t1, &[], &BestTradeOptions::default())
                .unwrap();
        assert_eq!(swap.trade, None);
    }

    #[test]
    fn test_route_request() {
        let [t0, _, t2] = tokens();
        let lp = crate::pool::standard::tests::lp_token("p02");
        let request: RoutingRequest = serde_json::from_value(serde_json::json!({
            "tradeType": "EXACT_INPUT",
            "amount": "100",
            "token": t0,
            "otherToken": t2,
            "pools": [{
                "liquidityToken": lp,
                "totalSupply": "1000",
                "tokenA": t2,
                "reserveA": "1100",
                "tokenB": t0,
                "reserveB": "1000",
            }],
            "options": { "maxHops": 2 },
            "slippageBips": 500,
        }))
        .unwrap();
        assert_eq!(request.options, BestTradeOptions::new(2, 3));

        let response = route_request(&request).unwrap().unwrap();
        assert_eq!(response.trade_type, TradeType::ExactInput);
        assert_eq!(response.input_amount, U256::from(100));
        assert_eq!(response.output_amount, U256::from(99));
        assert_eq!(response.minimum_amount_out, U256::from(94));
        assert_eq!(response.maximum_amount_in, U256::from(100));
        assert_eq!(response.token_path, vec![t0.clone(), t2.clone()]);
        assert_eq!(
            response.route_path,
            vec![RoutePathEntry {
                stable: false,
                input: t0,
                output: t2,
                pool: lp.asset_id(),
                base_pool: None,
                from_base: None,
            }]
        );
        assert_eq!(response.execution_price, "0.99");
        assert!(!response.is_native);
    }

    #[test]
    fn test_route_request_without_route() {
        let [t0, t1, t2] = tokens();
        let request: RoutingRequest = serde_json::from_value(serde_json::json!({
            "tradeType": "EXACT_OUTPUT",
            "amount": "10",
            "token": t2,
            "otherToken": t0,
            "pools": [{
                "liquidityToken": crate::pool::standard::tests::lp_token("p01"),
                "totalSupply": "1000",
                "tokenA": t0,
                "reserveA": "1000",
                "tokenB": t1,
                "reserveB": "1000",
            }],
        }))
        .unwrap();
        assert_eq!(request.slippage_bips, 50);
        assert_eq!(route_request(&request).unwrap(), None);
    }
}

// WASM wrapper functions
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn wasm_route_request(request: JsValue) -> Result<JsValue, Error> {
    let request: RoutingRequest = from_value(request)?;

    let response = route_request(&request).map_err(|error| {
        warn!(%error, "routing request rejected");
        Error::new(error)
    })?;
    to_value(&response)
}
