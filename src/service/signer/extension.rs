//! Arweave 浏览器钱包扩展（ArConnect 一类）能力接口
//!
//! 扩展由调用方注入；本模块只负责"先检查权限、缺失再申请"的流程与错误码映射

use async_trait::async_trait;

use crate::{
    error::{EverpayError, Result},
    service::deposit::ArweaveTransaction,
};

pub const ACCESS_PUBLIC_KEY: &str = "ACCESS_PUBLIC_KEY";
pub const SIGNATURE: &str = "SIGNATURE";
pub const SIGN_TRANSACTION: &str = "SIGN_TRANSACTION";

/// 钱包扩展能力
#[async_trait]
pub trait ArweaveWalletExtension: Send + Sync {
    /// 已授予的权限列表
    async fn get_permissions(&self) -> anyhow::Result<Vec<String>>;

    /// 申请权限
    async fn connect(&self, permissions: &[&str]) -> anyhow::Result<()>;

    /// 当前账户公钥模数 n（base64url）
    async fn get_active_public_key(&self) -> anyhow::Result<String>;

    /// RSA-PSS 签名原始字节
    async fn signature(&self, data: &[u8], salt_length: usize) -> anyhow::Result<Vec<u8>>;

    /// 签名链上交易，返回填好 owner/signature/id 的交易（扩展可能改写 reward）
    async fn sign_transaction(&self, tx: ArweaveTransaction) -> anyhow::Result<ArweaveTransaction>;
}

/// 确保扩展已授予全部权限，缺失时申请
pub async fn check_permissions(
    extension: &dyn ArweaveWalletExtension,
    permissions: &[&str],
) -> Result<()> {
    let existing = extension
        .get_permissions()
        .await
        .map_err(|e| EverpayError::extension_not_found(e.to_string()))?;

    if permissions.is_empty() {
        return Ok(());
    }

    let missing = permissions
        .iter()
        .any(|p| !existing.iter().any(|granted| granted == p));
    if missing {
        tracing::debug!(permissions = ?permissions, "requesting wallet extension permissions");
        extension
            .connect(permissions)
            .await
            .map_err(|e| EverpayError::access_permission_needed(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::ErrorCode;

    struct FakeExtension {
        installed: bool,
        granted: Mutex<Vec<String>>,
        allow_connect: bool,
        connects: Mutex<usize>,
    }

    impl FakeExtension {
        fn new(granted: &[&str], allow_connect: bool) -> Self {
            Self {
                installed: true,
                granted: Mutex::new(granted.iter().map(|s| s.to_string()).collect()),
                allow_connect,
                connects: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl ArweaveWalletExtension for FakeExtension {
        async fn get_permissions(&self) -> anyhow::Result<Vec<String>> {
            if !self.installed {
                anyhow::bail!("arweaveWallet is undefined");
            }
            Ok(self.granted.lock().unwrap().clone())
        }

        async fn connect(&self, permissions: &[&str]) -> anyhow::Result<()> {
            *self.connects.lock().unwrap() += 1;
            if !self.allow_connect {
                anyhow::bail!("user rejected");
            }
            let mut granted = self.granted.lock().unwrap();
            granted.extend(permissions.iter().map(|s| s.to_string()));
            Ok(())
        }

        async fn get_active_public_key(&self) -> anyhow::Result<String> {
            Ok("owner".into())
        }

        async fn signature(&self, _data: &[u8], _salt_length: usize) -> anyhow::Result<Vec<u8>> {
            Ok(vec![0u8; 4])
        }

        async fn sign_transaction(&self, tx: ArweaveTransaction) -> anyhow::Result<ArweaveTransaction> {
            Ok(tx)
        }
    }

    #[tokio::test]
    async fn test_granted_permissions_skip_connect() {
        let ext = FakeExtension::new(&[ACCESS_PUBLIC_KEY, SIGNATURE], true);
        check_permissions(&ext, &[SIGNATURE]).await.unwrap();
        assert_eq!(*ext.connects.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_permission_is_requested() {
        let ext = FakeExtension::new(&[], true);
        check_permissions(&ext, &[ACCESS_PUBLIC_KEY]).await.unwrap();
        assert_eq!(*ext.connects.lock().unwrap(), 1);
        assert!(ext.granted.lock().unwrap().contains(&ACCESS_PUBLIC_KEY.to_string()));
    }

    #[tokio::test]
    async fn test_rejected_connect_maps_to_permission_needed() {
        let ext = FakeExtension::new(&[], false);
        let err = check_permissions(&ext, &[SIGNATURE]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AccessPermissionNeeded);
    }

    #[tokio::test]
    async fn test_missing_extension() {
        let mut ext = FakeExtension::new(&[], true);
        ext.installed = false;
        let err = check_permissions(&ext, &[SIGNATURE]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ExtensionNotFound);
        assert_eq!(err.code.as_str(), "PLEASE_INSTALL_ARCONNECT");
    }
}
