//! 网络元数据与余额模型

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    domain::ChainType,
    error::{EverpayError, Result},
    utils::units::from_base_units,
};

/// 链 ID 可能是 JSON 字符串或数字
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    })
}

fn opt_string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Num(u64),
    }
    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Str(s) => s,
        Raw::Num(n) => n.to_string(),
    }))
}

/// `GET /info` 返回的网络信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    #[serde(default)]
    pub eth_locker: String,
    #[serde(default)]
    pub ar_locker: String,
    #[serde(default)]
    pub owner: String,
    #[serde(rename = "ethChainID", default, deserialize_with = "string_or_number")]
    pub eth_chain_id: String,
    #[serde(
        rename = "arChainID",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ar_chain_id: Option<String>,
    pub fee_recipient: String,
    pub token_list: Vec<Token>,
}

impl NetworkInfo {
    /// 按符号查找代币（不区分大小写）
    pub fn token_by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.token_list
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// 目标链的链 ID
    pub fn chain_id(&self, chain_type: ChainType) -> Result<String> {
        match chain_type {
            ChainType::Ethereum => {
                if self.eth_chain_id.is_empty() {
                    return Err(EverpayError::chain_not_supported(
                        "ethereum chain id not configured",
                    ));
                }
                Ok(self.eth_chain_id.clone())
            }
            ChainType::Arweave => Ok(self
                .ar_chain_id
                .clone()
                .unwrap_or_else(|| "0".to_string())),
        }
    }

    /// 充值锁仓地址
    pub fn locker(&self, chain_type: ChainType) -> Result<&str> {
        let locker = match chain_type {
            ChainType::Ethereum => self.eth_locker.as_str(),
            ChainType::Arweave => self.ar_locker.as_str(),
        };
        if locker.is_empty() {
            return Err(EverpayError::chain_not_supported(format!(
                "no locker configured for {}",
                chain_type
            )));
        }
        Ok(locker)
    }
}

/// 代币元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// 多链代币为逗号分隔，与 chain_type 一一对应
    pub id: String,
    pub symbol: String,
    pub chain_type: String,
    #[serde(rename = "chainID", default, deserialize_with = "string_or_number")]
    pub chain_id: String,
    #[serde(default)]
    pub ever_decimals: u32,
    pub decimals: u32,
    #[serde(default)]
    pub total_supply: String,
    #[serde(default = "zero")]
    pub burn_fee: String,
    #[serde(default = "zero")]
    pub transfer_fee: String,
}

fn zero() -> String {
    "0".to_string()
}

impl Token {
    pub fn chain_types(&self) -> impl Iterator<Item = &str> {
        self.chain_type.split(',').map(str::trim)
    }

    pub fn supports(&self, chain_type: ChainType) -> bool {
        self.chain_types().any(|c| c == chain_type.as_str())
    }

    /// 代币在指定链上的合约/资产地址
    pub fn address_on(&self, chain_type: ChainType) -> Option<&str> {
        let index = self.chain_types().position(|c| c == chain_type.as_str())?;
        let ids: Vec<&str> = self.id.split(',').map(str::trim).collect();
        match ids.len() {
            1 => ids.first().copied(),
            _ => ids.get(index).copied(),
        }
    }
}

/// 接口返回的原始余额条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBalance {
    pub tag: String,
    pub amount: String,
    pub decimals: u32,
}

/// `GET /token/...` 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    #[serde(default)]
    pub accid: String,
    pub balance: RawBalance,
}

/// `GET /balance/{account}` 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalancesResponse {
    #[serde(default)]
    pub accid: String,
    pub balances: Vec<RawBalance>,
}

/// 解析后的余额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceItem {
    pub chain_type: String,
    pub symbol: String,
    pub address: String,
    pub balance: String,
}

impl TryFrom<&RawBalance> for BalanceItem {
    type Error = EverpayError;

    fn try_from(raw: &RawBalance) -> Result<Self> {
        // Arweave 地址可能含 '-'，最多切三段
        let mut parts = raw.tag.splitn(3, '-');
        let (chain_type, symbol, address) = match (parts.next(), parts.next(), parts.next()) {
            (Some(c), Some(s), Some(a)) => (c, s, a),
            _ => {
                return Err(EverpayError::upstream(
                    None,
                    format!("malformed balance tag: {}", raw.tag),
                ))
            }
        };
        Ok(Self {
            chain_type: chain_type.to_string(),
            symbol: symbol.to_uppercase(),
            address: address.to_string(),
            balance: from_base_units(&raw.amount, raw.decimals)?,
        })
    }
}
