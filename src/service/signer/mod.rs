//! 签名适配层
//!
//! 按账户类型一次性选出签名者，后续流程只面对 `ChainSigner`

pub mod arweave;
pub mod evm;
pub mod extension;

use async_trait::async_trait;

pub use arweave::{owner_to_address, ArweaveJwk, ArweaveSigner};
pub use evm::EvmSigner;
pub use extension::ArweaveWalletExtension;

use crate::{
    config::{ArJwk, Config},
    domain::{classify_account, AccountKind},
    error::{EverpayError, Result},
};

/// 签名结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    pub ever_hash: String,
    pub sig: String,
}

#[async_trait]
pub trait ChainSigner: Send + Sync {
    fn account_kind(&self) -> AccountKind;

    /// 交易记录的 `data` 字段，参与哈希，必须在签名前取得
    async fn tx_data_field(&self) -> Result<String>;

    /// 计算 everHash 并签名规范消息
    async fn sign_message(&self, message: &str) -> Result<SignedMessage>;
}

/// 根据配置账户类型选择签名者
pub fn resolve_signer(config: &Config) -> Result<Box<dyn ChainSigner>> {
    match classify_account(&config.account) {
        AccountKind::Evm => {
            let wallet = config
                .eth_wallet
                .clone()
                .ok_or_else(|| EverpayError::signer_not_found("ethereum wallet is not configured"))?;
            Ok(Box::new(EvmSigner::new(wallet)))
        }
        AccountKind::Arweave => Ok(Box::new(resolve_arweave_signer(config)?)),
        AccountKind::Unknown => Err(EverpayError::invalid_account_type(format!(
            "unrecognized account: {}",
            config.account
        ))),
    }
}

pub fn resolve_arweave_signer(config: &Config) -> Result<ArweaveSigner> {
    match &config.ar_jwk {
        Some(ArJwk::Key(jwk)) => ArweaveSigner::from_jwk(jwk),
        Some(ArJwk::UseWallet(extension)) => Ok(ArweaveSigner::with_extension(extension.clone())),
        None => Err(EverpayError::jwk_not_found("arweave JWK is not configured")),
    }
}

/// 校验签名，任何不匹配或格式错误都返回 false
pub fn verify_signature(address: &str, message: &str, sig: &str) -> bool {
    match classify_account(address) {
        AccountKind::Evm => evm::verify(address, message, sig),
        AccountKind::Arweave => arweave::verify(address, message, sig),
        AccountKind::Unknown => false,
    }
}
