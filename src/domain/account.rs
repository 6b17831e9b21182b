//! 账户类型识别
//!
//! 根据地址结构判断账户所属链族（EVM / Arweave），用于选择签名路径

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EverpayError;

static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("valid regex"));
static ARWEAVE_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{43}$").expect("valid regex"));

/// everpay 支持的链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    Ethereum,
    Arweave,
}

impl ChainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainType::Ethereum => "ethereum",
            ChainType::Arweave => "arweave",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainType {
    type Err = EverpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" => Ok(ChainType::Ethereum),
            "arweave" | "ar" => Ok(ChainType::Arweave),
            other => Err(EverpayError::chain_not_supported(format!(
                "unsupported chain type: {}",
                other
            ))),
        }
    }
}

/// 账户所属链族
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Evm,
    Arweave,
    Unknown,
}

impl AccountKind {
    /// 账户原生所在的链
    pub fn native_chain(&self) -> Option<ChainType> {
        match self {
            AccountKind::Evm => Some(ChainType::Ethereum),
            AccountKind::Arweave => Some(ChainType::Arweave),
            AccountKind::Unknown => None,
        }
    }
}

/// 识别地址的账户类型（纯函数，无 I/O）
pub fn classify_account(address: &str) -> AccountKind {
    if EVM_ADDRESS.is_match(address) {
        // 含大写字母时必须满足 EIP-55 校验
        let hex_part = &address[2..];
        if hex_part.chars().any(|c| c.is_ascii_uppercase())
            && hex_part.chars().any(|c| c.is_ascii_lowercase())
            && !verify_eip55_checksum(address)
        {
            return AccountKind::Unknown;
        }
        return AccountKind::Evm;
    }
    if ARWEAVE_ADDRESS.is_match(address) {
        return AccountKind::Arweave;
    }
    AccountKind::Unknown
}

/// 验证EIP-55 Checksum
/// https://eips.ethereum.org/EIPS/eip-55
fn verify_eip55_checksum(address: &str) -> bool {
    use sha3::{Digest, Keccak256};

    let addr_lower = address[2..].to_lowercase();
    let hash = Keccak256::digest(addr_lower.as_bytes());

    for (i, ch) in address[2..].chars().enumerate() {
        if ch.is_alphabetic() {
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            if ch.is_uppercase() != (hash_nibble >= 8) {
                return false;
            }
        }
    }
    true
}
