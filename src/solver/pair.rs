use alloy_primitives::U256;

use crate::error::SwapError;
use crate::model::amount::TokenAmount;
use crate::model::token::Token;
use crate::pool::stable::StableSwap;
use crate::pool::standard::StandardPool;
use crate::solver::route::Hop;

/// Position of a pool in the caller's pool lists. A route never uses the same key twice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PoolKey {
    Standard(usize),
    Stable(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum PairSource {
    Standard(StandardPool),
    Stable(StableSwap),
    /// `token0` lives in `base_pool`, `token1` in `pool`.
    StableMeta {
        pool: StableSwap,
        base_pool: StableSwap,
    },
}

/// Two tradeable tokens of any pool family, seen as a pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbstractPair {
    token0: Token,
    token1: Token,
    reserve0: U256,
    reserve1: U256,
    source: PairSource,
    keys: Vec<PoolKey>,
}

impl AbstractPair {
    pub fn from_standard(index: usize, pair: &StandardPool) -> Self {
        Self {
            token0: pair.token0().clone(),
            token1: pair.token1().clone(),
            reserve0: pair.reserve0().raw(),
            reserve1: pair.reserve1().raw(),
            source: PairSource::Standard(pair.clone()),
            keys: vec![PoolKey::Standard(index)],
        }
    }

    fn from_stable(
        index: usize,
        swap: &StableSwap,
        token0: &Token,
        token1: &Token,
    ) -> Result<Self, SwapError> {
        let reserve0 = swap.balances()[swap.token_index(token0)?].raw();
        let reserve1 = swap.balances()[swap.token_index(token1)?].raw();
        Ok(Self {
            token0: token0.clone(),
            token1: token1.clone(),
            reserve0,
            reserve1,
            source: PairSource::Stable(swap.clone()),
            keys: vec![PoolKey::Stable(index)],
        })
    }

    fn from_stable_meta(
        (base_index, base_pool): (usize, &StableSwap),
        (index, pool): (usize, &StableSwap),
        token0: &Token,
        token1: &Token,
    ) -> Result<Self, SwapError> {
        let reserve0 = base_pool.balances()[base_pool.token_index(token0)?].raw();
        let reserve1 = pool.balances()[pool.token_index(token1)?].raw();
        Ok(Self {
            token0: token0.clone(),
            token1: token1.clone(),
            reserve0,
            reserve1,
            source: PairSource::StableMeta {
                pool: pool.clone(),
                base_pool: base_pool.clone(),
            },
            keys: vec![PoolKey::Stable(base_index), PoolKey::Stable(index)],
        })
    }

    pub fn token0(&self) -> &Token {
        &self.token0
    }

    pub fn token1(&self) -> &Token {
        &self.token1
    }

    pub fn keys(&self) -> &[PoolKey] {
        &self.keys
    }

    pub fn is_stable(&self) -> bool {
        !matches!(self.source, PairSource::Standard(_))
    }

    pub fn involves_token(&self, token: &Token) -> bool {
        token == &self.token0 || token == &self.token1
    }

    pub fn has_empty_reserve(&self) -> bool {
        self.reserve0.is_zero() || self.reserve1.is_zero()
    }

    pub fn other_token(&self, token: &Token) -> Result<&Token, SwapError> {
        if token == &self.token0 {
            Ok(&self.token1)
        } else if token == &self.token1 {
            Ok(&self.token0)
        } else {
            Err(SwapError::UnknownToken(token.asset_id()))
        }
    }

    /// The hop that sells `input` through this pair.
    pub fn hop_for(&self, input: &Token) -> Result<Hop, SwapError> {
        let output = self.other_token(input)?.clone();
        Ok(match &self.source {
            PairSource::Standard(pair) => Hop::Standard {
                input: input.clone(),
                output,
                pair: pair.clone(),
            },
            PairSource::Stable(pool) => Hop::Stable {
                input: input.clone(),
                output,
                pool: pool.clone(),
            },
            PairSource::StableMeta { pool, base_pool } => Hop::StableMeta {
                from_base: input == &self.token0,
                input: input.clone(),
                output,
                pool: pool.clone(),
                base_pool: base_pool.clone(),
            },
        })
    }

    pub fn get_output_amount(&self, input: &TokenAmount) -> Result<TokenAmount, SwapError> {
        let (output, _) = self.hop_for(input.token())?.get_output_amount(input)?;
        Ok(output)
    }
}

pub fn convert_standard_pools_to_abstract_pairs(pairs: &[StandardPool]) -> Vec<AbstractPair> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, pair)| AbstractPair::from_standard(index, pair))
        .collect()
}

/// One pair per two pooled tokens of every swap, plus a cross pair from each pooled token to each
/// token of any meta swap holding this swap's liquidity token.
pub fn convert_stable_swaps_to_abstract_pairs(
    swaps: &[StableSwap],
) -> Result<Vec<AbstractPair>, SwapError> {
    let mut pairs = Vec::new();

    for (index, swap) in swaps.iter().enumerate() {
        let related: Vec<(usize, &StableSwap)> = swaps
            .iter()
            .enumerate()
            .filter(|(_, other)| other.involves_token(swap.lp_token()))
            .collect();
        let tokens = swap.pooled_tokens();

        for (j, token0) in tokens.iter().enumerate() {
            for token1 in &tokens[j + 1..] {
                pairs.push(AbstractPair::from_stable(index, swap, token0, token1)?);
            }

            for &(meta_index, meta) in &related {
                for token1 in meta.pooled_tokens() {
                    if token1 == swap.lp_token() {
                        continue;
                    }
                    pairs.push(AbstractPair::from_stable_meta(
                        (index, swap),
                        (meta_index, meta),
                        token0,
                        token1,
                    )?);
                }
            }
        }
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::stable::tests::{dai, frax, meta_pool, three_pool, three_pool_lp, usdc, usdt};
    use alloy_primitives::uint;

    #[test]
    fn test_stable_pairs() {
        let pairs = convert_stable_swaps_to_abstract_pairs(&[three_pool()]).unwrap();
        let tokens: Vec<(Token, Token)> = pairs
            .iter()
            .map(|pair| (pair.token0().clone(), pair.token1().clone()))
            .collect();
        assert_eq!(
            tokens,
            vec![(usdc(), usdt()), (usdc(), dai()), (usdt(), dai())]
        );
        assert!(pairs.iter().all(|pair| pair.keys() == [PoolKey::Stable(0)]));
        assert!(pairs.iter().all(AbstractPair::is_stable));
    }

    #[test]
    fn test_meta_cross_pairs() {
        let pairs = convert_stable_swaps_to_abstract_pairs(&[three_pool(), meta_pool()]).unwrap();
        let tokens: Vec<(Token, Token)> = pairs
            .iter()
            .map(|pair| (pair.token0().clone(), pair.token1().clone()))
            .collect();
        assert_eq!(
            tokens,
            vec![
                (usdc(), usdt()),
                (usdc(), dai()),
                (usdc(), frax()),
                (usdt(), dai()),
                (usdt(), frax()),
                (dai(), frax()),
                (three_pool_lp(), frax()),
            ]
        );
        assert_eq!(pairs[2].keys(), [PoolKey::Stable(0), PoolKey::Stable(1)]);
        assert_eq!(pairs[6].keys(), [PoolKey::Stable(1)]);

        let cross = &pairs[4];
        match cross.hop_for(&frax()).unwrap() {
            Hop::StableMeta {
                from_base, output, ..
            } => {
                assert!(!from_base);
                assert_eq!(output, usdt());
            }
            hop => panic!("unexpected hop {hop:?}"),
        }
        assert_eq!(
            cross
                .get_output_amount(&TokenAmount::new(frax(), uint!(1000000000000000000_U256)))
                .unwrap()
                .raw(),
            uint!(999220_U256)
        );
        match cross.hop_for(&usdt()).unwrap() {
            Hop::StableMeta { from_base, .. } => assert!(from_base),
            hop => panic!("unexpected hop {hop:?}"),
        }
    }

    #[test]
    fn test_other_token() {
        let pairs = convert_stable_swaps_to_abstract_pairs(&[three_pool()]).unwrap();
        assert_eq!(pairs[0].other_token(&usdc()).unwrap(), &usdt());
        assert!(matches!(
            pairs[0].other_token(&dai()).unwrap_err(),
            SwapError::UnknownToken(_)
        ));
        assert!(!pairs[0].has_empty_reserve());
    }
}
