//! 配置管理模块
//! 客户端身份配置 + 从环境变量加载的 API / 日志配置

use std::{fmt, sync::Arc, time::Duration};

use ethers::signers::LocalWallet;
use serde::{Deserialize, Serialize};

use crate::{
    domain::ChainType,
    error::{EverpayError, Result},
    service::signer::{ArweaveJwk, ArweaveWalletExtension},
};

/// 生产环境 API
pub const EVERPAY_HOST: &str = "https://api.everpay.io";
/// 调试/预发环境 API
pub const EVERPAY_DEV_HOST: &str = "https://api-dev.everpay.io";
/// 交易记录版本号，参与哈希计算
pub const EVERPAY_TX_VERSION: &str = "v1";

const DEFAULT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_INFO_TTL_SECS: u64 = 180;

/// Arweave 签名来源：本地 JWK 或浏览器扩展（`use_wallet`）
#[derive(Clone)]
pub enum ArJwk {
    Key(Arc<ArweaveJwk>),
    UseWallet(Arc<dyn ArweaveWalletExtension>),
}

impl fmt::Debug for ArJwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArJwk::Key(_) => f.write_str("ArJwk::Key(<redacted>)"),
            ArJwk::UseWallet(_) => f.write_str("ArJwk::UseWallet"),
        }
    }
}

/// 客户端配置，实例生命周期内不可变
#[derive(Clone, Default)]
pub struct Config {
    pub account: String,
    pub chain_type: Option<ChainType>,
    pub eth_wallet: Option<LocalWallet>,
    pub ar_jwk: Option<ArJwk>,
    /// true 时使用调试环境 API
    pub debug: bool,
    pub api: ApiSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("account", &self.account)
            .field("chain_type", &self.chain_type)
            .field("eth_wallet", &self.eth_wallet.as_ref().map(|_| "<redacted>"))
            .field("ar_jwk", &self.ar_jwk)
            .field("debug", &self.debug)
            .field("api", &self.api)
            .finish()
    }
}

impl Config {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Self::default()
        }
    }

    pub fn with_chain_type(mut self, chain_type: ChainType) -> Self {
        self.chain_type = Some(chain_type);
        self
    }

    /// 从十六进制私钥创建 EVM 签名者
    pub fn with_eth_private_key(mut self, private_key: &str) -> Result<Self> {
        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| EverpayError::invalid_config_params(format!("invalid private key: {}", e)))?;
        self.eth_wallet = Some(wallet);
        Ok(self)
    }

    pub fn with_eth_wallet(mut self, wallet: LocalWallet) -> Self {
        self.eth_wallet = Some(wallet);
        self
    }

    pub fn with_ar_jwk(mut self, jwk: ArweaveJwk) -> Self {
        self.ar_jwk = Some(ArJwk::Key(Arc::new(jwk)));
        self
    }

    /// 使用浏览器扩展签名（对应 `arJWK = "use_wallet"`）
    pub fn with_arweave_wallet(mut self, extension: Arc<dyn ArweaveWalletExtension>) -> Self {
        self.ar_jwk = Some(ArJwk::UseWallet(extension));
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_api_settings(mut self, api: ApiSettings) -> Self {
        self.api = api;
        self
    }

    /// 当前环境的 API 地址
    pub fn api_host(&self) -> String {
        self.api.host(self.debug)
    }
}

/// API 与链上依赖配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// 覆盖默认 API 地址
    #[serde(default)]
    pub api_host: Option<String>,
    pub timeout_ms: u64,
    pub info_ttl_secs: u64,
    /// 充值（EVM）使用的 JSON-RPC 节点
    pub eth_rpc_url: String,
    /// 充值（Arweave）使用的网关
    pub arweave_gateway_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            api_host: std::env::var("EVERPAY_API_HOST").ok(),
            timeout_ms: std::env::var("EVERPAY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            info_ttl_secs: std::env::var("EVERPAY_INFO_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INFO_TTL_SECS),
            eth_rpc_url: std::env::var("ETH_RPC_URL")
                .unwrap_or_else(|_| "https://eth.llamarpc.com".to_string()),
            arweave_gateway_url: std::env::var("ARWEAVE_GATEWAY_URL")
                .unwrap_or_else(|_| "https://arweave.net".to_string()),
        }
    }
}

impl ApiSettings {
    pub fn host(&self, debug: bool) -> String {
        if let Some(host) = &self.api_host {
            return host.trim_end_matches('/').to_string();
        }
        if debug {
            EVERPAY_DEV_HOST.to_string()
        } else {
            EVERPAY_HOST.to_string()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn info_ttl(&self) -> Duration {
        Duration::from_secs(self.info_ttl_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ApiSettings {
        ApiSettings {
            api_host: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            info_ttl_secs: DEFAULT_INFO_TTL_SECS,
            eth_rpc_url: "http://localhost:8545".into(),
            arweave_gateway_url: "http://localhost:1984".into(),
        }
    }

    #[test]
    fn test_host_selection() {
        let s = settings();
        assert_eq!(s.host(false), EVERPAY_HOST);
        assert_eq!(s.host(true), EVERPAY_DEV_HOST);

        let s = ApiSettings {
            api_host: Some("http://127.0.0.1:8080/".into()),
            ..settings()
        };
        assert_eq!(s.host(true), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_timeouts() {
        let s = settings();
        assert_eq!(s.timeout(), Duration::from_secs(5));
        assert_eq!(s.info_ttl(), Duration::from_secs(180));
    }

    #[test]
    fn test_invalid_private_key_rejected() {
        let err = Config::new("0x0000000000000000000000000000000000000000")
            .with_eth_private_key("not-a-key")
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidConfigParams);
    }

    #[test]
    fn test_debug_redacts_wallet() {
        let cfg = Config::new("0xabc")
            .with_eth_private_key(
                "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
            )
            .unwrap();
        let printed = format!("{:?}", cfg);
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("4c0883a6"));
    }
}
