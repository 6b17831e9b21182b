//! EVM 账户签名：secp256k1 personal message

use std::str::FromStr;

use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{Address, Signature},
};

use super::{ChainSigner, SignedMessage};
use crate::{
    domain::{ever_hash_of, AccountKind},
    error::{EverpayError, Result},
};

pub struct EvmSigner {
    wallet: LocalWallet,
}

impl EvmSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl ChainSigner for EvmSigner {
    fn account_kind(&self) -> AccountKind {
        AccountKind::Evm
    }

    async fn tx_data_field(&self) -> Result<String> {
        Ok(String::new())
    }

    async fn sign_message(&self, message: &str) -> Result<SignedMessage> {
        let ever_hash = ever_hash_of(message);
        let signature = self
            .wallet
            .sign_message(message)
            .await
            .map_err(|e| EverpayError::signature_failed(e.to_string()))?;
        Ok(SignedMessage {
            ever_hash,
            sig: format!("0x{}", hex::encode(signature.to_vec())),
        })
    }
}

/// 从签名恢复地址并与声明地址比较（忽略大小写）
pub fn verify(address: &str, message: &str, sig: &str) -> bool {
    let Ok(expected) = Address::from_str(address) else {
        return false;
    };
    let Ok(signature) = Signature::from_str(sig) else {
        return false;
    };
    match signature.recover(message) {
        Ok(recovered) => recovered == expected,
        Err(e) => {
            tracing::debug!(error = %e, "evm signature recovery failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn signer() -> EvmSigner {
        EvmSigner::new(KEY.parse::<LocalWallet>().unwrap())
    }

    #[tokio::test]
    async fn test_sign_and_recover() {
        let signer = signer();
        let address = format!("{:?}", signer.address());
        let signed = signer.sign_message("tokenSymbol:ETH\naction:transfer").await.unwrap();

        assert!(signed.sig.starts_with("0x"));
        assert_eq!(signed.sig.len(), 2 + 130);
        assert_eq!(signed.ever_hash, ever_hash_of("tokenSymbol:ETH\naction:transfer"));

        assert!(verify(&address, "tokenSymbol:ETH\naction:transfer", &signed.sig));
        assert!(verify(&address.to_uppercase().replace("0X", "0x"), "tokenSymbol:ETH\naction:transfer", &signed.sig));
        assert!(!verify(&address, "tokenSymbol:ETH\naction:withdraw", &signed.sig));
    }

    #[test]
    fn test_malformed_inputs_are_false() {
        let addr = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(!verify(addr, "msg", "0x1234"));
        assert!(!verify(addr, "msg", "not-hex"));
        assert!(!verify("0xzz", "msg", &format!("0x{}", "00".repeat(65))));
    }

    #[tokio::test]
    async fn test_data_field_is_empty() {
        assert_eq!(signer().tx_data_field().await.unwrap(), "");
        assert_eq!(signer().account_kind(), AccountKind::Evm);
    }
}
