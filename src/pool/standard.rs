use std::str::FromStr;

use alloy_primitives::{Address, B256, keccak256};

use crate::error::SwapError;
use crate::math::quote::{
    get_amount_in, get_amount_out, get_liquidity_minted, get_liquidity_value,
};
use crate::model::amount::TokenAmount;
use crate::model::price::Price;
use crate::model::token::Token;

/// A two-asset constant-product pool. Reserves are kept in canonical token order regardless of
/// the order they were supplied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardPool {
    liquidity: TokenAmount,
    reserves: [TokenAmount; 2],
}

impl StandardPool {
    /// `liquidity` is the pool's liquidity token with its total supply.
    pub fn new(
        liquidity: TokenAmount,
        amount_a: TokenAmount,
        amount_b: TokenAmount,
    ) -> Result<Self, SwapError> {
        let reserves = if amount_a.token().sorts_before(amount_b.token())? {
            [amount_a, amount_b]
        } else {
            [amount_b, amount_a]
        };
        Ok(Self {
            liquidity,
            reserves,
        })
    }

    pub fn liquidity(&self) -> &TokenAmount {
        &self.liquidity
    }

    pub fn liquidity_token(&self) -> &Token {
        self.liquidity.token()
    }

    pub fn chain_id(&self) -> u32 {
        self.liquidity.token().chain_id()
    }

    pub fn token0(&self) -> &Token {
        self.reserves[0].token()
    }

    pub fn token1(&self) -> &Token {
        self.reserves[1].token()
    }

    pub fn reserve0(&self) -> &TokenAmount {
        &self.reserves[0]
    }

    pub fn reserve1(&self) -> &TokenAmount {
        &self.reserves[1]
    }

    pub fn involves_token(&self, token: &Token) -> bool {
        token == self.token0() || token == self.token1()
    }

    pub fn other_token(&self, token: &Token) -> Result<&Token, SwapError> {
        let (_, other) = self.sides(token)?;
        Ok(other.token())
    }

    pub fn reserve_of(&self, token: &Token) -> Result<&TokenAmount, SwapError> {
        let (reserve, _) = self.sides(token)?;
        Ok(reserve)
    }

    /// Price of token0 in terms of token1.
    pub fn token0_price(&self) -> Result<Price, SwapError> {
        Price::from_amounts(&self.reserves[0], &self.reserves[1])
    }

    /// Price of token1 in terms of token0.
    pub fn token1_price(&self) -> Result<Price, SwapError> {
        Price::from_amounts(&self.reserves[1], &self.reserves[0])
    }

    pub fn price_of(&self, token: &Token) -> Result<Price, SwapError> {
        let (reserve, other) = self.sides(token)?;
        Price::from_amounts(reserve, other)
    }

    /// Output for an exact input, together with the pool as it would be after the swap.
    pub fn get_output_amount(
        &self,
        input: &TokenAmount,
    ) -> Result<(TokenAmount, StandardPool), SwapError> {
        let (reserve_in, reserve_out) = self.sides(input.token())?;
        let raw = get_amount_out(input.raw(), reserve_in.raw(), reserve_out.raw())?;
        let output = TokenAmount::new(reserve_out.token().clone(), raw);
        let next = StandardPool::new(
            self.liquidity.clone(),
            reserve_in.checked_add(input)?,
            reserve_out.checked_sub(&output)?,
        )?;
        Ok((output, next))
    }

    /// Input needed for an exact output, together with the pool as it would be after the swap.
    pub fn get_input_amount(
        &self,
        output: &TokenAmount,
    ) -> Result<(TokenAmount, StandardPool), SwapError> {
        let (reserve_out, reserve_in) = self.sides(output.token())?;
        let raw = get_amount_in(output.raw(), reserve_in.raw(), reserve_out.raw())?;
        let input = TokenAmount::new(reserve_in.token().clone(), raw);
        let next = StandardPool::new(
            self.liquidity.clone(),
            reserve_in.checked_add(&input)?,
            reserve_out.checked_sub(output)?,
        )?;
        Ok((input, next))
    }

    /// Liquidity tokens minted for depositing both amounts, in either order.
    pub fn get_liquidity_minted(
        &self,
        total_supply: &TokenAmount,
        amount_a: &TokenAmount,
        amount_b: &TokenAmount,
    ) -> Result<TokenAmount, SwapError> {
        total_supply.ensure_token(self.liquidity_token())?;
        let (amount0, amount1) = if amount_a.token().sorts_before(amount_b.token())? {
            (amount_a, amount_b)
        } else {
            (amount_b, amount_a)
        };
        amount0.ensure_token(self.token0())?;
        amount1.ensure_token(self.token1())?;

        let raw = get_liquidity_minted(
            total_supply.raw(),
            amount0.raw(),
            amount1.raw(),
            self.reserves[0].raw(),
            self.reserves[1].raw(),
        )?;
        Ok(TokenAmount::new(self.liquidity_token().clone(), raw))
    }

    /// Amount of `token` redeemed by burning `liquidity`.
    pub fn get_liquidity_value(
        &self,
        token: &Token,
        total_supply: &TokenAmount,
        liquidity: &TokenAmount,
    ) -> Result<TokenAmount, SwapError> {
        total_supply.ensure_token(self.liquidity_token())?;
        liquidity.ensure_token(self.liquidity_token())?;
        let reserve = self.reserve_of(token)?;
        let raw = get_liquidity_value(reserve.raw(), total_supply.raw(), liquidity.raw())?;
        Ok(TokenAmount::new(token.clone(), raw))
    }

    /// The reserve of `token` and the reserve on the other side.
    fn sides(&self, token: &Token) -> Result<(&TokenAmount, &TokenAmount), SwapError> {
        if token == self.token0() {
            Ok((&self.reserves[0], &self.reserves[1]))
        } else if token == self.token1() {
            Ok((&self.reserves[1], &self.reserves[0]))
        } else {
            Err(SwapError::UnknownToken(token.asset_id()))
        }
    }
}

/// CREATE2 address of the pair contract for two EVM tokens.
pub fn compute_pair_address(
    factory: &str,
    init_code_hash: &str,
    token_a: &Token,
    token_b: &Token,
) -> Result<Address, SwapError> {
    let (token0, token1) = if token_a.sorts_before(token_b)? {
        (token_a, token_b)
    } else {
        (token_b, token_a)
    };

    let factory = parse_address(factory)?;
    let init_code_hash = B256::from_str(init_code_hash)
        .map_err(|_| SwapError::InvalidAddress(init_code_hash.to_string()))?;

    let mut packed = Vec::with_capacity(40);
    packed.extend_from_slice(parse_address(token0.address())?.as_slice());
    packed.extend_from_slice(parse_address(token1.address())?.as_slice());
    let salt = keccak256(&packed);

    Ok(factory.create2(salt.0, init_code_hash.0))
}

fn parse_address(value: &str) -> Result<Address, SwapError> {
    Address::from_str(value).map_err(|_| SwapError::InvalidAddress(value.to_string()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::math::fraction::Rounding;
    use crate::model::token::tests::{evm_token, token};
    use crate::model::token::{AssetMeta, AssetType};
    use alloy_primitives::{U256, address};

    pub(crate) fn lp_token(id: &str) -> Token {
        Token::new(AssetMeta {
            network_id: 100,
            chain_id: 200,
            asset_type: AssetType::LP_TOKEN,
            asset_index: 0,
            address: id.to_string(),
            decimals: 18,
            symbol: "LP".to_string(),
            name: format!("LP {id}"),
        })
    }

    pub(crate) fn pool(id: &str, a: &Token, reserve_a: u64, b: &Token, reserve_b: u64) -> StandardPool {
        StandardPool::new(
            TokenAmount::new(lp_token(id), U256::from(1000)),
            TokenAmount::new(a.clone(), U256::from(reserve_a)),
            TokenAmount::new(b.clone(), U256::from(reserve_b)),
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_order() {
        let zlk = token(200, 1, "ZLK", 12);
        let pcx = token(200, 2, "PCX", 12);
        let forward = pool("p", &zlk, 100, &pcx, 200);
        let backward = pool("p", &pcx, 200, &zlk, 100);
        assert_eq!(forward.token0(), &zlk);
        assert_eq!(backward.token0(), &zlk);
        assert_eq!(forward.token1(), &pcx);
        assert_eq!(backward.token1(), &pcx);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_prices_and_reserves() {
        let zlk = token(200, 1, "ZLK", 12);
        let pcx = token(200, 2, "PCX", 12);
        let bsc = token(200, 3, "BSC", 12);
        let pair = pool("p", &pcx, 101, &zlk, 100);

        assert_eq!(
            pair.token0_price().unwrap().raw(),
            Price::new(zlk.clone(), pcx.clone(), 100, 101).unwrap().raw()
        );
        assert_eq!(
            pair.token1_price().unwrap().raw(),
            Price::new(pcx.clone(), zlk.clone(), 101, 100).unwrap().raw()
        );
        assert_eq!(pair.price_of(&zlk).unwrap(), pair.token0_price().unwrap());
        assert_eq!(pair.price_of(&pcx).unwrap(), pair.token1_price().unwrap());
        assert_eq!(
            pair.token0_price().unwrap().to_significant(6, Rounding::RoundHalfUp).unwrap(),
            "1.01"
        );

        assert_eq!(pair.reserve_of(&zlk).unwrap().raw(), U256::from(100));
        assert_eq!(pair.reserve_of(&pcx).unwrap().raw(), U256::from(101));
        assert_eq!(pair.other_token(&zlk).unwrap(), &pcx);
        assert!(pair.involves_token(&zlk));
        assert!(!pair.involves_token(&bsc));
        assert_eq!(
            pair.reserve_of(&bsc).unwrap_err(),
            SwapError::UnknownToken("100-200-2-3".to_string())
        );
        assert_eq!(pair.chain_id(), 200);
    }

    #[test]
    fn test_get_output_amount_returns_next_pool() {
        let zlk = token(200, 1, "ZLK", 12);
        let pcx = token(200, 2, "PCX", 12);
        let pair = pool("p", &zlk, 1000, &pcx, 1000);
        let (output, next) = pair
            .get_output_amount(&TokenAmount::new(zlk.clone(), U256::from(100)))
            .unwrap();
        assert_eq!(output, TokenAmount::new(pcx.clone(), U256::from(90)));
        assert_eq!(next.reserve_of(&zlk).unwrap().raw(), U256::from(1100));
        assert_eq!(next.reserve_of(&pcx).unwrap().raw(), U256::from(910));
        // The source pool is untouched.
        assert_eq!(pair.reserve0().raw(), U256::from(1000));

        let (input, next) = pair
            .get_input_amount(&TokenAmount::new(pcx.clone(), U256::from(90)))
            .unwrap();
        assert_eq!(input, TokenAmount::new(zlk.clone(), U256::from(100)));
        assert_eq!(next.reserve_of(&pcx).unwrap().raw(), U256::from(910));
    }

    #[test]
    fn test_get_output_amount_errors() {
        let zlk = token(200, 1, "ZLK", 12);
        let pcx = token(200, 2, "PCX", 12);
        let empty = pool("p", &zlk, 0, &pcx, 0);
        assert_eq!(
            empty
                .get_output_amount(&TokenAmount::new(zlk.clone(), U256::from(100)))
                .unwrap_err(),
            SwapError::InsufficientReserves
        );

        let pair = pool("p", &zlk, 1000, &pcx, 1000);
        assert_eq!(
            pair.get_output_amount(&TokenAmount::new(zlk.clone(), U256::from(1)))
                .unwrap_err(),
            SwapError::InsufficientInputAmount
        );
        assert_eq!(
            pair.get_input_amount(&TokenAmount::new(pcx.clone(), U256::from(1000)))
                .unwrap_err(),
            SwapError::InsufficientReserves
        );
        assert!(matches!(
            pair.get_output_amount(&TokenAmount::new(token(200, 3, "BSC", 12), U256::from(1)))
                .unwrap_err(),
            SwapError::UnknownToken(_)
        ));
    }

    #[test]
    fn test_liquidity() {
        let zlk = token(200, 1, "ZLK", 12);
        let pcx = token(200, 2, "PCX", 12);
        let pair = pool("p", &zlk, 10000, &pcx, 10000);
        let supply = TokenAmount::new(pair.liquidity_token().clone(), U256::from(10000));

        let minted = pair
            .get_liquidity_minted(
                &supply,
                &TokenAmount::new(pcx.clone(), U256::from(2000)),
                &TokenAmount::new(zlk.clone(), U256::from(2000)),
            )
            .unwrap();
        assert_eq!(minted.raw(), U256::from(2000));
        assert_eq!(minted.token(), pair.liquidity_token());

        let value = pair
            .get_liquidity_value(
                &zlk,
                &supply,
                &TokenAmount::new(pair.liquidity_token().clone(), U256::from(2500)),
            )
            .unwrap();
        assert_eq!(value, TokenAmount::new(zlk.clone(), U256::from(2500)));

        assert!(matches!(
            pair.get_liquidity_minted(
                &TokenAmount::new(zlk.clone(), U256::from(1)),
                &TokenAmount::new(pcx.clone(), U256::from(2000)),
                &TokenAmount::new(zlk, U256::from(2000)),
            )
            .unwrap_err(),
            SwapError::CurrencyMismatch { .. }
        ));
    }

    #[test]
    fn test_compute_pair_address() {
        let eth = evm_token("0x639a647fbe20b6c8ac19e48e2de44ea792c62c5c", "ETH", 18);
        let usdc = evm_token("0xe3f5a90f9cb311505cd691a46596599aa1a0ad7d", "USDC", 6);
        let factory = "0xf36AE63d89983E3aeA8AaaD1086C3280eb01438D";
        let init_code_hash = "0x6278f87a17986c7b82be214d6e4cf48101d7a40fe979fa914ed6337de05c76b8";

        let expected = address!("0x23fa9fa6ea199efec986cf90d3740c01a6033ac9");
        assert_eq!(
            compute_pair_address(factory, init_code_hash, &eth, &usdc).unwrap(),
            expected
        );
        assert_eq!(
            compute_pair_address(factory, init_code_hash, &usdc, &eth).unwrap(),
            expected
        );
        assert!(matches!(
            compute_pair_address("0x12", init_code_hash, &usdc, &eth).unwrap_err(),
            SwapError::InvalidAddress(_)
        ));
    }
}
