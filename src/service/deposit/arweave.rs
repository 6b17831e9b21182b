//! Arweave 充值：format 2 交易
//!
//! AR 为原生转账；其他代币走 SmartWeave PST `transfer` 交互（通过标签携带）

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha384};

use super::{ChainTransfer, DepositTransfer};
use crate::{
    domain::{ChainTxReceipt, ChainType},
    error::{EverpayError, Result},
    service::signer::{
        extension::{check_permissions, SIGN_TRANSACTION},
        ArweaveSigner,
    },
};

/// 网关请求超时
const GATEWAY_TIMEOUT: Duration = Duration::from_secs(20);
/// 单块上限，超过需要分块上传
const MAX_CHUNK_SIZE: usize = 256 * 1024;
const NOTE_SIZE: usize = 32;

const SMARTWEAVE_APP_NAME: &str = "SmartWeaveAction";
const SMARTWEAVE_APP_VERSION: &str = "0.3.0";

/// 交易标签，name/value 均为 base64url
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArweaveTag {
    pub name: String,
    pub value: String,
}

impl ArweaveTag {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: URL_SAFE_NO_PAD.encode(name),
            value: URL_SAFE_NO_PAD.encode(value),
        }
    }
}

/// 网关 `POST /tx` 的交易 JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArweaveTransaction {
    pub format: u8,
    pub id: String,
    pub last_tx: String,
    pub owner: String,
    pub tags: Vec<ArweaveTag>,
    pub target: String,
    pub quantity: String,
    pub data: String,
    pub data_size: String,
    pub data_root: String,
    pub reward: String,
    pub signature: String,
}

impl ArweaveTransaction {
    fn new() -> Self {
        Self {
            format: 2,
            quantity: "0".into(),
            data_size: "0".into(),
            ..Self::default()
        }
    }

    pub fn add_tag(&mut self, name: &str, value: &str) {
        self.tags.push(ArweaveTag::new(name, value));
    }

    pub fn set_data(&mut self, data: &[u8]) -> Result<()> {
        self.data = URL_SAFE_NO_PAD.encode(data);
        self.data_size = data.len().to_string();
        self.data_root = data_root(data)?;
        Ok(())
    }

    /// 填入签名与 owner，id = b64url(sha256(signature))
    pub fn set_signature(&mut self, owner: &str, signature: &[u8]) {
        self.owner = owner.to_string();
        self.signature = URL_SAFE_NO_PAD.encode(signature);
        self.id = URL_SAFE_NO_PAD.encode(Sha256::digest(signature));
    }

    /// 待签名数据：format 2 字段的 deep hash
    pub fn signature_data(&self) -> Result<Vec<u8>> {
        let tags = self
            .tags
            .iter()
            .map(|tag| {
                Ok(DeepHashItem::List(vec![
                    DeepHashItem::Blob(b64_decode(&tag.name)?),
                    DeepHashItem::Blob(b64_decode(&tag.value)?),
                ]))
            })
            .collect::<Result<Vec<_>>>()?;

        let item = DeepHashItem::List(vec![
            DeepHashItem::Blob(self.format.to_string().into_bytes()),
            DeepHashItem::Blob(b64_decode(&self.owner)?),
            DeepHashItem::Blob(b64_decode(&self.target)?),
            DeepHashItem::Blob(self.quantity.as_bytes().to_vec()),
            DeepHashItem::Blob(self.reward.as_bytes().to_vec()),
            DeepHashItem::Blob(b64_decode(&self.last_tx)?),
            DeepHashItem::List(tags),
            DeepHashItem::Blob(self.data_size.as_bytes().to_vec()),
            DeepHashItem::Blob(b64_decode(&self.data_root)?),
        ]);
        Ok(deep_hash(&item))
    }
}

fn b64_decode(value: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| EverpayError::signature_failed(format!("invalid base64url field: {}", e)))
}

pub enum DeepHashItem {
    Blob(Vec<u8>),
    List(Vec<DeepHashItem>),
}

/// SHA-384 deep hash
pub fn deep_hash(item: &DeepHashItem) -> Vec<u8> {
    match item {
        DeepHashItem::Blob(data) => {
            let tag = format!("blob{}", data.len());
            let mut hasher = Sha384::new();
            hasher.update(Sha384::digest(tag.as_bytes()));
            hasher.update(Sha384::digest(data));
            hasher.finalize().to_vec()
        }
        DeepHashItem::List(items) => {
            let tag = format!("list{}", items.len());
            items.iter().fold(Sha384::digest(tag.as_bytes()).to_vec(), |acc, child| {
                let mut hasher = Sha384::new();
                hasher.update(&acc);
                hasher.update(deep_hash(child));
                hasher.finalize().to_vec()
            })
        }
    }
}

/// 单块数据的 merkle 根
pub fn data_root(data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }
    if data.len() > MAX_CHUNK_SIZE {
        return Err(EverpayError::amount_invalid(format!(
            "data of {} bytes needs chunked upload",
            data.len()
        )));
    }
    let mut note = [0u8; NOTE_SIZE];
    let size = (data.len() as u64).to_be_bytes();
    note[NOTE_SIZE - size.len()..].copy_from_slice(&size);

    let data_hash = Sha256::digest(data);
    let mut hasher = Sha256::new();
    hasher.update(Sha256::digest(data_hash));
    hasher.update(Sha256::digest(note));
    Ok(URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

/// 生成未签名交易（不含 last_tx / reward）
pub fn draft_transaction(request: &DepositTransfer) -> Result<ArweaveTransaction> {
    let mut tx = ArweaveTransaction::new();
    if request.symbol.eq_ignore_ascii_case("AR") {
        tx.target = request.to.clone();
        tx.quantity = request.value.to_string();
        return Ok(tx);
    }

    let contract = request.token.address_on(ChainType::Arweave).ok_or_else(|| {
        EverpayError::chain_not_supported(format!("{} has no arweave contract", request.token.symbol))
    })?;
    if request.value > u64::MAX.into() {
        return Err(EverpayError::amount_invalid(format!(
            "PST quantity too large: {}",
            request.value
        )));
    }
    let input = serde_json::json!({
        "function": "transfer",
        "qty": request.value.as_u64(),
        "target": request.to,
    });

    let filler: u32 = rand::thread_rng().gen_range(0..10_000);
    tx.set_data(filler.to_string().as_bytes())?;
    tx.add_tag("App-Name", SMARTWEAVE_APP_NAME);
    tx.add_tag("App-Version", SMARTWEAVE_APP_VERSION);
    tx.add_tag("Contract", contract);
    tx.add_tag("Input", &input.to_string());
    Ok(tx)
}

pub struct ArweaveTransfer {
    signer: ArweaveSigner,
    gateway_url: String,
    client: reqwest::Client,
}

impl ArweaveTransfer {
    pub fn new(signer: ArweaveSigner, gateway_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(GATEWAY_TIMEOUT)
            .build()
            .map_err(|e| EverpayError::invalid_config_params(e.to_string()))?;
        Ok(Self {
            signer,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}{}", self.gateway_url, path))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(EverpayError::upstream(Some(status.as_u16()), body));
        }
        Ok(body.trim().to_string())
    }

    async fn sign(&self, mut tx: ArweaveTransaction) -> Result<ArweaveTransaction> {
        if let Some(extension) = self.signer.extension() {
            // 权限已授予时扩展可能拒绝重复 connect，忽略
            if let Err(e) = check_permissions(extension.as_ref(), &[SIGN_TRANSACTION]).await {
                tracing::warn!(error = %e, "SIGN_TRANSACTION permission check failed");
            }
            return extension
                .sign_transaction(tx)
                .await
                .map_err(|e| EverpayError::signature_failed(e.to_string()));
        }

        let owner = self.signer.owner().await?;
        tx.owner = owner.clone();
        let signature = self.signer.sign_bytes(&tx.signature_data()?).await?;
        tx.set_signature(&owner, &signature);
        Ok(tx)
    }

    async fn post(&self, tx: &ArweaveTransaction) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/tx", self.gateway_url))
            .json(tx)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if status.as_u16() != 200 {
            return Err(EverpayError::transaction_post_error(Some(status.as_u16()), body));
        }
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(error) = value.get("error") {
                return Err(EverpayError::transaction_post_error(Some(200), error.to_string()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChainTransfer for ArweaveTransfer {
    fn chain_type(&self) -> ChainType {
        ChainType::Arweave
    }

    async fn transfer(&self, request: &DepositTransfer) -> Result<ChainTxReceipt> {
        let mut tx = draft_transaction(request)?;
        tx.last_tx = self.get_text("/tx_anchor").await?;
        let price_path = if tx.target.is_empty() {
            format!("/price/{}", tx.data_size)
        } else {
            format!("/price/{}/{}", tx.data_size, tx.target)
        };
        tx.reward = self.get_text(&price_path).await?;

        let tx = self.sign(tx).await?;
        self.post(&tx).await?;

        tracing::info!(
            symbol = %request.symbol,
            from = %request.from,
            to = %request.to,
            tx_id = %tx.id,
            "arweave deposit posted"
        );
        Ok(ChainTxReceipt {
            chain_type: ChainType::Arweave,
            tx_hash: tx.id,
        })
    }
}
