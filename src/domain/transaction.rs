//! everpay 交易记录
//!
//! 字段顺序固定：签名消息与上链 JSON 都按此顺序生成，服务端独立计算同一哈希

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::domain::ChainType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EverpayAction {
    Transfer,
    Withdraw,
}

impl EverpayAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EverpayAction::Transfer => "transfer",
            EverpayAction::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for EverpayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未签名交易记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EverpayTxWithoutSig {
    pub token_symbol: String,
    pub action: EverpayAction,
    pub from: String,
    pub to: String,
    /// 最小单位整数字符串
    pub amount: String,
    pub fee: String,
    pub fee_recipient: String,
    pub nonce: String,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub chain_type: ChainType,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub data: String,
    pub version: String,
}

impl EverpayTxWithoutSig {
    /// 规范化签名消息：`key:value` 按固定字段顺序以换行连接
    pub fn message(&self) -> String {
        let fields: [(&str, &str); 13] = [
            ("tokenSymbol", self.token_symbol.as_str()),
            ("action", self.action.as_str()),
            ("from", self.from.as_str()),
            ("to", self.to.as_str()),
            ("amount", self.amount.as_str()),
            ("fee", self.fee.as_str()),
            ("feeRecipient", self.fee_recipient.as_str()),
            ("nonce", self.nonce.as_str()),
            ("tokenID", self.token_id.as_str()),
            ("chainType", self.chain_type.as_str()),
            ("chainID", self.chain_id.as_str()),
            ("data", self.data.as_str()),
            ("version", self.version.as_str()),
        ];
        fields
            .iter()
            .map(|(key, value)| format!("{}:{}", key, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// everHash：规范消息的以太坊 personal message 哈希
    pub fn ever_hash(&self) -> String {
        ever_hash_of(&self.message())
    }

    pub fn with_sig(self, sig: impl Into<String>) -> EverpayTx {
        EverpayTx {
            tx: self,
            sig: sig.into(),
        }
    }
}

/// `0x` 前缀的 personal message 哈希
pub fn ever_hash_of(message: &str) -> String {
    let hash = ethers::utils::hash_message(message);
    format!("0x{}", hex::encode(hash.as_bytes()))
}

/// 已签名交易记录（`POST /tx` 请求体）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EverpayTx {
    #[serde(flatten)]
    pub tx: EverpayTxWithoutSig,
    pub sig: String,
}

/// 服务端返回的交易
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EverpayTransaction {
    pub id: String,
    pub token_symbol: String,
    pub action: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub fee: String,
    pub fee_recipient: String,
    pub nonce: String,
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub chain_type: String,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub data: String,
    pub version: String,
    pub sig: String,
    pub ever_hash: String,
    pub status: String,
    pub internal_status: String,
    pub timestamp: u64,
    pub target_chain_tx_hash: String,
}

/// 分页交易列表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TxsResult {
    pub accid: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
    pub txs: Vec<EverpayTransaction>,
}

/// `POST /tx` 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostTxResult {
    pub status: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// 转账/提现结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOrWithdrawResult {
    pub status: String,
    pub ever_hash: String,
    pub everpay_tx: EverpayTx,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl TransferOrWithdrawResult {
    /// 合并提交响应；响应中与固定字段同名的键被丢弃，避免序列化出重复键
    pub fn new(post: PostTxResult, ever_hash: String, everpay_tx: EverpayTx) -> Self {
        let mut extra = post.extra;
        for key in ["status", "everHash", "everpayTx"] {
            extra.remove(key);
        }
        Self {
            status: post.status,
            ever_hash,
            everpay_tx,
            extra,
        }
    }
}

/// 充值（链上原生转账）回执
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTxReceipt {
    pub chain_type: ChainType,
    pub tx_hash: String,
}
