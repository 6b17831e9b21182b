//! 充值：链上原生转账到 everpay 锁仓地址
//!
//! 不经过 everpay 签名流水线，直接由账户所在链的后端发送

pub mod arweave;
pub mod ethereum;

use async_trait::async_trait;
use ethers::types::U256;

pub use arweave::{ArweaveTag, ArweaveTransaction, ArweaveTransfer};
pub use ethereum::EthereumTransfer;

use crate::{
    config::Config,
    domain::{classify_account, AccountKind, ChainTxReceipt, ChainType, Token},
    error::{EverpayError, Result},
    service::signer::resolve_arweave_signer,
};

/// 单次链上转账请求
#[derive(Debug, Clone)]
pub struct DepositTransfer {
    pub symbol: String,
    pub token: Token,
    pub from: String,
    /// 锁仓地址
    pub to: String,
    /// 链上最小单位
    pub value: U256,
    pub chain_id: String,
}

#[async_trait]
pub trait ChainTransfer: Send + Sync {
    fn chain_type(&self) -> ChainType;

    async fn transfer(&self, request: &DepositTransfer) -> Result<ChainTxReceipt>;
}

/// 按账户类型选择充值后端
pub fn resolve_transfer(config: &Config) -> Result<Box<dyn ChainTransfer>> {
    match classify_account(&config.account) {
        AccountKind::Evm => {
            let wallet = config
                .eth_wallet
                .clone()
                .ok_or_else(|| EverpayError::signer_not_found("ethereum wallet is not configured"))?;
            Ok(Box::new(EthereumTransfer::new(wallet, config.api.eth_rpc_url.clone())))
        }
        AccountKind::Arweave => {
            let signer = resolve_arweave_signer(config)?;
            Ok(Box::new(ArweaveTransfer::new(
                signer,
                config.api.arweave_gateway_url.clone(),
            )?))
        }
        AccountKind::Unknown => Err(EverpayError::invalid_account_type(format!(
            "unrecognized account: {}",
            config.account
        ))),
    }
}
