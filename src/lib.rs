//! everpay - 跨链结算网络客户端
//!
//! 构建、签名并提交 transfer / withdraw 指令，查询网络信息、余额与交易记录。
//! 支持 EVM（secp256k1）与 Arweave（RSA-PSS）两类账户

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use config::{ApiSettings, ArJwk, Config, LoggingConfig};
pub use error::{ErrorCode, EverpayError, Result};
pub use service::Everpay;

pub mod prelude {
    pub use crate::{
        config::{ApiSettings, Config},
        domain::{
            BalanceItem, ChainTxReceipt, ChainType, EverpayAction, EverpayTransaction, EverpayTx,
            EverpayTxWithoutSig, NetworkInfo, Token, TransferOrWithdrawResult, TxsResult,
        },
        error::{ErrorCode, EverpayError},
        infrastructure::{EverpayApi, HttpEverpayApi},
        service::{
            ArweaveJwk, ArweaveWalletExtension, BalanceParams, DepositParams, Everpay, TransferParams,
            WithdrawParams,
        },
    };
}
