//! 统一错误类型
//!
//! 扁平错误码：所有失败都以 `EverpayError` 原样返回给调用方，本地不做重试

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // 配置与请求
    InvalidConfigParams,
    RequestTimeout,
    UpstreamError,

    // 签名者
    SignerNotFound,
    JwkNotFound,
    InvalidAccountType,

    // 参数校验
    RecipientNotFound,
    SymbolNotFound,
    TokenNotFound,
    AccountNotFound,
    TransactionHashNotFound,
    ChainTxHashNotFound,
    AmountInvalid,
    ChainNotSupported,

    // Arweave 签名扩展
    ExtensionNotFound,
    AccessPermissionNeeded,
    AccessPublicKeyFailed,
    SignatureFailed,
    TransactionPostError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidConfigParams => "INVALID_CONFIG_PARAMS",
            ErrorCode::RequestTimeout => "REQUEST_5S_TIMEOUT",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::SignerNotFound => "ETH_SIGNER_NOT_FOUND",
            ErrorCode::JwkNotFound => "AR_JWK_NOT_FOUND",
            ErrorCode::InvalidAccountType => "INVALID_ACCOUNT_TYPE",
            ErrorCode::RecipientNotFound => "TO_NOT_FOUND",
            ErrorCode::SymbolNotFound => "SYMBOL_NOT_FOUND",
            ErrorCode::TokenNotFound => "TOKEN_NOT_FOUND",
            ErrorCode::AccountNotFound => "ACCOUNT_NOT_FOUND",
            ErrorCode::TransactionHashNotFound => "EVERHASH_NOT_FOUND",
            ErrorCode::ChainTxHashNotFound => "CHAIN_TX_HASH_NOT_FOUND",
            ErrorCode::AmountInvalid => "AMOUNT_INVALID",
            ErrorCode::ChainNotSupported => "CHAIN_NOT_SUPPORTED",
            ErrorCode::ExtensionNotFound => "PLEASE_INSTALL_ARCONNECT",
            ErrorCode::AccessPermissionNeeded => "ACCESS_PERMISSION_NEEDED",
            ErrorCode::AccessPublicKeyFailed => "ACCESS_PUBLIC_KEY_FAILED",
            ErrorCode::SignatureFailed => "SIGNATURE_FAILED",
            ErrorCode::TransactionPostError => "TRANSACTION_POST_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {message}")]
pub struct EverpayError {
    pub code: ErrorCode,
    pub message: String,
    /// 上游 HTTP 状态码（仅 UpstreamError / TransactionPostError）
    pub status: Option<u16>,
}

pub type Result<T> = std::result::Result<T, EverpayError>;

impl EverpayError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn invalid_config_params(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfigParams, msg)
    }

    pub fn request_timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RequestTimeout, msg)
    }

    pub fn upstream(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::UpstreamError,
            message: msg.into(),
            status,
        }
    }

    pub fn signer_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SignerNotFound, msg)
    }

    pub fn jwk_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::JwkNotFound, msg)
    }

    pub fn invalid_account_type(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAccountType, msg)
    }

    pub fn recipient_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RecipientNotFound, msg)
    }

    pub fn symbol_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SymbolNotFound, msg)
    }

    pub fn token_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TokenNotFound, msg)
    }

    pub fn account_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccountNotFound, msg)
    }

    pub fn transaction_hash_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransactionHashNotFound, msg)
    }

    pub fn chain_tx_hash_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChainTxHashNotFound, msg)
    }

    pub fn amount_invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AmountInvalid, msg)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ChainNotSupported, msg)
    }

    // Arweave 扩展相关
    pub fn extension_not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExtensionNotFound, msg)
    }

    pub fn access_permission_needed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccessPermissionNeeded, msg)
    }

    pub fn access_public_key_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccessPublicKeyFailed, msg)
    }

    pub fn signature_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SignatureFailed, msg)
    }

    pub fn transaction_post_error(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::TransactionPostError,
            message: msg.into(),
            status,
        }
    }
}

// 从 reqwest 错误转换：超时单独归类
impl From<reqwest::Error> for EverpayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::request_timeout(format!("request timed out: {}", err));
        }
        Self::upstream(
            err.status().map(|s| s.as_u16()),
            format!("HTTP request failed: {}", err),
        )
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for EverpayError {
    fn from(err: serde_json::Error) -> Self {
        Self::upstream(None, format!("JSON serialization error: {}", err))
    }
}
