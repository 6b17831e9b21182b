//! Arweave 账户签名：RSA-PSS(SHA-256, salt 32)
//!
//! 签名对象是 everHash 的 32 字节原文；签名串格式 `b64url(signature),owner`

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rsa::{
    pss::{Signature, SigningKey, VerifyingKey},
    signature::{RandomizedSigner, SignatureEncoding, Verifier},
    traits::{PrivateKeyParts, PublicKeyParts},
    BigUint, RsaPrivateKey, RsaPublicKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{
    extension::{check_permissions, ArweaveWalletExtension, ACCESS_PUBLIC_KEY, SIGNATURE},
    ChainSigner, SignedMessage,
};
use crate::{
    domain::{ever_hash_of, AccountKind},
    error::{EverpayError, Result},
};

/// PSS 盐长度（与 Arweave 网关一致）
pub const PSS_SALT_LENGTH: usize = 32;

/// Arweave 公钥指数固定为 65537
const ARWEAVE_PUBLIC_EXPONENT: u32 = 65_537;

/// Arweave JWK 钱包文件
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ArweaveJwk {
    pub kty: String,
    pub e: String,
    pub n: String,
    pub d: String,
    pub p: String,
    pub q: String,
    #[serde(default)]
    pub dp: String,
    #[serde(default)]
    pub dq: String,
    #[serde(default)]
    pub qi: String,
}

impl fmt::Debug for ArweaveJwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArweaveJwk")
            .field("kty", &self.kty)
            .field("n", &self.n)
            .field("d", &"<redacted>")
            .finish()
    }
}

impl ArweaveJwk {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| EverpayError::invalid_config_params(format!("invalid JWK: {}", e)))
    }

    /// 由 RSA 私钥导出 JWK
    pub fn from_rsa(key: &RsaPrivateKey) -> Self {
        let b64 = |n: &BigUint| URL_SAFE_NO_PAD.encode(n.to_bytes_be());
        let primes = key.primes();
        Self {
            kty: "RSA".into(),
            e: b64(key.e()),
            n: b64(key.n()),
            d: b64(key.d()),
            p: primes.first().map(b64).unwrap_or_default(),
            q: primes.get(1).map(b64).unwrap_or_default(),
            dp: key.dp().map(b64).unwrap_or_default(),
            dq: key.dq().map(b64).unwrap_or_default(),
            qi: key.crt_coefficient().as_ref().map(b64).unwrap_or_default(),
        }
    }

    pub fn to_private_key(&self) -> Result<RsaPrivateKey> {
        let n = decode_uint(&self.n, "n")?;
        let e = decode_uint(&self.e, "e")?;
        let d = decode_uint(&self.d, "d")?;
        let p = decode_uint(&self.p, "p")?;
        let q = decode_uint(&self.q, "q")?;
        RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| EverpayError::invalid_config_params(format!("invalid JWK: {}", e)))
    }

    /// 钱包地址
    pub fn address(&self) -> Result<String> {
        owner_to_address(&self.n)
    }
}

fn decode_uint(value: &str, name: &str) -> Result<BigUint> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map(|bytes| BigUint::from_bytes_be(&bytes))
        .map_err(|e| EverpayError::invalid_config_params(format!("invalid JWK field {}: {}", name, e)))
}

/// owner（公钥模数 n 的 base64url）→ 地址：`b64url(sha256(n))`
pub fn owner_to_address(owner: &str) -> Result<String> {
    let n = URL_SAFE_NO_PAD
        .decode(owner)
        .map_err(|e| EverpayError::invalid_account_type(format!("invalid owner: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(Sha256::digest(&n)))
}

/// 本地私钥或钱包扩展
#[derive(Clone)]
enum KeySource {
    Jwk { key: RsaPrivateKey, owner: String },
    Extension(Arc<dyn ArweaveWalletExtension>),
}

#[derive(Clone)]
pub struct ArweaveSigner {
    source: KeySource,
}

impl fmt::Debug for ArweaveSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            KeySource::Jwk { owner, .. } => f.debug_struct("ArweaveSigner").field("owner", owner).finish(),
            KeySource::Extension(_) => f.write_str("ArweaveSigner(extension)"),
        }
    }
}

impl ArweaveSigner {
    pub fn from_jwk(jwk: &ArweaveJwk) -> Result<Self> {
        Ok(Self {
            source: KeySource::Jwk {
                key: jwk.to_private_key()?,
                owner: jwk.n.clone(),
            },
        })
    }

    pub fn with_extension(extension: Arc<dyn ArweaveWalletExtension>) -> Self {
        Self {
            source: KeySource::Extension(extension),
        }
    }

    pub fn extension(&self) -> Option<&Arc<dyn ArweaveWalletExtension>> {
        match &self.source {
            KeySource::Extension(ext) => Some(ext),
            KeySource::Jwk { .. } => None,
        }
    }

    /// 当前账户 owner；扩展模式需要 ACCESS_PUBLIC_KEY 权限
    pub async fn owner(&self) -> Result<String> {
        match &self.source {
            KeySource::Jwk { owner, .. } => Ok(owner.clone()),
            KeySource::Extension(ext) => {
                check_permissions(ext.as_ref(), &[ACCESS_PUBLIC_KEY]).await?;
                ext.get_active_public_key()
                    .await
                    .map_err(|e| EverpayError::access_public_key_failed(e.to_string()))
            }
        }
    }

    /// 对原始字节做 RSA-PSS 签名
    pub async fn sign_bytes(&self, data: &[u8]) -> Result<Vec<u8>> {
        match &self.source {
            KeySource::Jwk { key, .. } => {
                let signing_key = SigningKey::<Sha256>::new_with_salt_len(key.clone(), PSS_SALT_LENGTH);
                let signature = signing_key.sign_with_rng(&mut rand::thread_rng(), data);
                Ok(signature.to_vec())
            }
            KeySource::Extension(ext) => {
                check_permissions(ext.as_ref(), &[SIGNATURE]).await?;
                ext.signature(data, PSS_SALT_LENGTH)
                    .await
                    .map_err(|e| EverpayError::signature_failed(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ChainSigner for ArweaveSigner {
    fn account_kind(&self) -> AccountKind {
        AccountKind::Arweave
    }

    async fn tx_data_field(&self) -> Result<String> {
        let owner = self.owner().await?;
        Ok(serde_json::json!({ "arOwner": owner }).to_string())
    }

    async fn sign_message(&self, message: &str) -> Result<SignedMessage> {
        let ever_hash = ever_hash_of(message);
        let hash_bytes = hex::decode(ever_hash.trim_start_matches("0x"))
            .map_err(|e| EverpayError::signature_failed(e.to_string()))?;

        // 扩展模式先取公钥再签名，与权限申请顺序一致
        let owner = self.owner().await?;
        let signature = self.sign_bytes(&hash_bytes).await?;

        Ok(SignedMessage {
            ever_hash,
            sig: format!("{},{}", URL_SAFE_NO_PAD.encode(signature), owner),
        })
    }
}

/// 校验 `signature,owner` 签名串
pub fn verify(address: &str, message: &str, sig: &str) -> bool {
    let Some((signature, owner)) = sig.split_once(',') else {
        return false;
    };
    match owner_to_address(owner) {
        Ok(owner_address) if owner_address == address => {}
        _ => return false,
    }

    let hash = ethers::utils::hash_message(message);
    match verify_pss(owner, hash.as_bytes(), signature) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::debug!(error = %e, "arweave signature verification failed");
            false
        }
    }
}

fn verify_pss(owner: &str, data: &[u8], signature: &str) -> anyhow::Result<bool> {
    let n = BigUint::from_bytes_be(&URL_SAFE_NO_PAD.decode(owner)?);
    let public_key = RsaPublicKey::new(n, BigUint::from(ARWEAVE_PUBLIC_EXPONENT))?;
    let signature = Signature::try_from(URL_SAFE_NO_PAD.decode(signature)?.as_slice())?;
    let verifying_key = VerifyingKey::<Sha256>::new_with_salt_len(public_key, PSS_SALT_LENGTH);
    Ok(verifying_key.verify(data, &signature).is_ok())
}

/// 校验原始字节签名（充值交易签名复核用）
pub fn verify_bytes(owner: &str, data: &[u8], signature: &[u8]) -> bool {
    verify_pss(owner, data, &URL_SAFE_NO_PAD.encode(signature)).unwrap_or(false)
}
