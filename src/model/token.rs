use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::SwapError;

/// Asset class code. Well-known classes have associated constants; any other code is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetType(pub u8);

impl AssetType {
    pub const NATIVE_TOKEN: AssetType = AssetType(0);
    pub const NORMAL_TOKEN: AssetType = AssetType(2);
    pub const LP_TOKEN: AssetType = AssetType(254);
    pub const EVM_TOKEN: AssetType = AssetType(255);

    /// Address-keyed assets are identified by their address instead of their index.
    pub fn is_address_keyed(self) -> bool {
        self == AssetType::EVM_TOKEN || self == AssetType::LP_TOKEN
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub network_id: u32,
    pub chain_id: u32,
    pub asset_type: AssetType,
    pub asset_index: u32,
    #[serde(default)]
    pub address: String,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

/// A currency on a specific chain. Two tokens are equal when their asset ids match, ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token {
    meta: AssetMeta,
}

impl Token {
    pub fn new(meta: AssetMeta) -> Self {
        Self { meta }
    }

    pub fn meta(&self) -> &AssetMeta {
        &self.meta
    }

    pub fn decimals(&self) -> u8 {
        self.meta.decimals
    }

    pub fn symbol(&self) -> &str {
        &self.meta.symbol
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn chain_id(&self) -> u32 {
        self.meta.chain_id
    }

    pub fn network_id(&self) -> u32 {
        self.meta.network_id
    }

    pub fn asset_type(&self) -> AssetType {
        self.meta.asset_type
    }

    pub fn asset_index(&self) -> u32 {
        self.meta.asset_index
    }

    pub fn address(&self) -> &str {
        &self.meta.address
    }

    /// `network-chain-type-discriminator`, where the discriminator is the address for
    /// address-keyed assets and the asset index otherwise.
    pub fn asset_id(&self) -> String {
        let AssetMeta {
            network_id,
            chain_id,
            asset_type,
            asset_index,
            address,
            ..
        } = &self.meta;
        if asset_type.is_address_keyed() {
            format!("{network_id}-{chain_id}-{asset_type}-{address}")
        } else {
            format!("{network_id}-{chain_id}-{asset_type}-{asset_index}")
        }
    }

    pub fn network_chain_id(&self) -> String {
        format!("{}-{}", self.meta.network_id, self.meta.chain_id)
    }

    pub fn is_native(&self) -> bool {
        self.meta.asset_type == AssetType::NATIVE_TOKEN
    }

    /// The EVM form of a native token that has a contract address; any other token is returned
    /// unchanged.
    pub fn wrapped(&self) -> Token {
        if self.is_native() && !self.meta.address.is_empty() {
            return Token::new(AssetMeta {
                asset_type: AssetType::EVM_TOKEN,
                ..self.meta.clone()
            });
        }
        self.clone()
    }

    /// Canonical pool ordering. EVM tokens order by their lowercase wrapped asset id; other tokens
    /// order by chain, asset class and index.
    pub fn sorts_before(&self, other: &Token) -> Result<bool, SwapError> {
        if self == other {
            return Err(SwapError::IdenticalTokens(self.asset_id()));
        }

        if self.asset_type() == AssetType::EVM_TOKEN || other.asset_type() == AssetType::EVM_TOKEN
        {
            let left = self.wrapped().asset_id().to_lowercase();
            let right = other.wrapped().asset_id().to_lowercase();
            return Ok(left < right);
        }

        Ok(self.sort_key().cmp(&other.sort_key()) == Ordering::Less)
    }

    fn sort_key(&self) -> (u32, AssetType, u32, u32, String) {
        (
            self.meta.chain_id,
            self.meta.asset_type,
            self.meta.asset_index,
            self.meta.network_id,
            self.meta.address.to_lowercase(),
        )
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.asset_id().eq_ignore_ascii_case(&other.asset_id())
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.asset_id().to_ascii_lowercase().hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.meta.symbol, self.asset_id())
    }
}
