//! 测试辅助模块
//! 内存版结算服务、测试钱包与钱包扩展

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use everpay::{
    domain::{
        BalanceResponse, BalancesResponse, EverpayTransaction, EverpayTx, NetworkInfo,
        PostTxResult, RawBalance, TxsResult,
    },
    error::{EverpayError, Result},
    infrastructure::EverpayApi,
    service::{
        deposit::ArweaveTransaction,
        signer::{arweave::PSS_SALT_LENGTH, ArweaveSigner},
        ArweaveJwk, ArweaveWalletExtension,
    },
    ApiSettings, Config,
};
use once_cell::sync::Lazy;
use rsa::RsaPrivateKey;

pub const EVM_PRIVATE_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const AR_BURN_FEE: u64 = 7687;
pub const AR_LOCKER: &str = "dH-9mWVB5-lCpyMdE-TKFfV9e6ifgMp8OUQYmdmRMJM";
pub const ETH_LOCKER: &str = "0xa7ae99c13d82dd32fc6445ec09e38d197335f38a";

/// 进程内共享的测试 JWK（RSA 生成较慢）
pub static TEST_JWK: Lazy<ArweaveJwk> = Lazy::new(|| {
    let key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("rsa keygen");
    ArweaveJwk::from_rsa(&key)
});

pub fn ar_address() -> String {
    TEST_JWK.address().expect("jwk address")
}

pub fn evm_address() -> String {
    use ethers::signers::{LocalWallet, Signer};
    let wallet: LocalWallet = EVM_PRIVATE_KEY.trim_start_matches("0x").parse().unwrap();
    format!("{:?}", wallet.address())
}

fn offline_settings() -> ApiSettings {
    ApiSettings {
        api_host: Some("http://127.0.0.1:9".into()),
        timeout_ms: 5_000,
        info_ttl_secs: 180,
        eth_rpc_url: "http://127.0.0.1:9".into(),
        arweave_gateway_url: "http://127.0.0.1:9".into(),
    }
}

pub fn ar_config() -> Config {
    Config::new(ar_address())
        .with_ar_jwk(TEST_JWK.clone())
        .with_api_settings(offline_settings())
}

pub fn evm_config() -> Config {
    Config::new(evm_address())
        .with_eth_private_key(EVM_PRIVATE_KEY)
        .unwrap()
        .with_api_settings(offline_settings())
}

pub fn extension_config(extension: Arc<dyn ArweaveWalletExtension>) -> Config {
    Config::new(ar_address())
        .with_arweave_wallet(extension)
        .with_api_settings(offline_settings())
}

pub fn network_info() -> NetworkInfo {
    serde_json::from_value(serde_json::json!({
        "ethLocker": ETH_LOCKER,
        "arLocker": AR_LOCKER,
        "owner": "0x26361130d5d6e798e9319114643af8c868412859",
        "ethChainID": "42",
        "arChainID": "0",
        "feeRecipient": "0x6451EB7F668de69FB4C943Db72bCF2A73DeeC6B1",
        "tokenList": [
            {
                "id": "AR,0xcc9141efa8c20c7df0778748255b1487957811be",
                "symbol": "AR",
                "chainType": "arweave,ethereum",
                "chainID": "0,42",
                "everDecimals": 12,
                "decimals": 12,
                "totalSupply": "0",
                "burnFee": AR_BURN_FEE.to_string(),
                "transferFee": "0"
            },
            {
                "id": "0xd85476c906b5301e8e9eb58d174a6f96b9dfc5ee",
                "symbol": "USDT",
                "chainType": "ethereum",
                "chainID": "42",
                "everDecimals": 6,
                "decimals": 6,
                "totalSupply": "0",
                "burnFee": "1000000",
                "transferFee": "0"
            }
        ]
    }))
    .unwrap()
}

/// 内存版结算服务
#[derive(Clone, Default)]
pub struct MockApi {
    pub info_fetches: Arc<AtomicUsize>,
    pub submitted: Arc<Mutex<Vec<EverpayTx>>>,
    pub balance_queries: Arc<Mutex<Vec<String>>>,
    pub reject_with: Option<String>,
}

impl MockApi {
    pub fn info_fetches(&self) -> usize {
        self.info_fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<EverpayTx> {
        self.submitted.lock().unwrap().clone()
    }

    /// 记录的单币种余额查询，格式 `{id}-{chainType}/{account}`
    pub fn balance_queries(&self) -> Vec<String> {
        self.balance_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl EverpayApi for MockApi {
    async fn get_info(&self) -> Result<NetworkInfo> {
        self.info_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(network_info())
    }

    async fn get_balance(
        &self,
        token_id: &str,
        chain_type: &str,
        account: &str,
    ) -> Result<BalanceResponse> {
        self.balance_queries
            .lock()
            .unwrap()
            .push(format!("{}-{}/{}", token_id, chain_type, account));
        Ok(BalanceResponse {
            accid: account.to_string(),
            balance: RawBalance {
                tag: format!("{}-token-{}", chain_type, token_id),
                amount: "1500000".into(),
                decimals: 6,
            },
        })
    }

    async fn get_balances(&self, account: &str) -> Result<BalancesResponse> {
        Ok(BalancesResponse {
            accid: account.to_string(),
            balances: vec![
                RawBalance {
                    tag: "ethereum-usdt-0xd85476c906b5301e8e9eb58d174a6f96b9dfc5ee".into(),
                    amount: "1000000".into(),
                    decimals: 6,
                },
                RawBalance {
                    tag: "arweave,ethereum-ar-AR,0xcc9141efa8c20c7df0778748255b1487957811be".into(),
                    amount: "10001000".into(),
                    decimals: 12,
                },
            ],
        })
    }

    async fn get_transactions(&self, page: u32) -> Result<TxsResult> {
        Ok(TxsResult {
            accid: None,
            current_page: page,
            total_pages: 1,
            txs: self.stored(None),
        })
    }

    async fn get_transactions_by_account(&self, account: &str, page: u32) -> Result<TxsResult> {
        Ok(TxsResult {
            accid: Some(account.to_string()),
            current_page: page,
            total_pages: 1,
            txs: self.stored(Some(account)),
        })
    }

    async fn get_transaction(&self, ever_hash: &str) -> Result<EverpayTransaction> {
        self.stored(None)
            .into_iter()
            .find(|tx| tx.ever_hash == ever_hash)
            .ok_or_else(|| EverpayError::upstream(Some(404), "tx not found"))
    }

    async fn submit_transaction(&self, tx: &EverpayTx) -> Result<PostTxResult> {
        if let Some(reason) = &self.reject_with {
            return Err(EverpayError::upstream(Some(400), reason.clone()));
        }
        self.submitted.lock().unwrap().push(tx.clone());
        Ok(serde_json::from_value(serde_json::json!({ "status": "ok" })).unwrap())
    }
}

impl MockApi {
    fn stored(&self, account: Option<&str>) -> Vec<EverpayTransaction> {
        self.submitted()
            .into_iter()
            .filter(|tx| account.map_or(true, |a| tx.tx.from == a))
            .map(|tx| EverpayTransaction {
                ever_hash: tx.tx.ever_hash(),
                token_symbol: tx.tx.token_symbol.clone(),
                action: tx.tx.action.to_string(),
                from: tx.tx.from.clone(),
                to: tx.tx.to.clone(),
                amount: tx.tx.amount.clone(),
                fee: tx.tx.fee.clone(),
                sig: tx.sig.clone(),
                status: "confirmed".into(),
                ..Default::default()
            })
            .collect()
    }
}

/// 用本地 JWK 模拟浏览器钱包扩展
pub struct MockExtension {
    pub installed: bool,
    pub granted: Mutex<Vec<String>>,
    pub connect_requests: Mutex<Vec<Vec<String>>>,
    signer: ArweaveSigner,
}

impl MockExtension {
    pub fn new(granted: &[&str]) -> Self {
        Self {
            installed: true,
            granted: Mutex::new(granted.iter().map(|p| p.to_string()).collect()),
            connect_requests: Mutex::new(vec![]),
            signer: ArweaveSigner::from_jwk(&TEST_JWK).unwrap(),
        }
    }

    pub fn not_installed() -> Self {
        Self {
            installed: false,
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl ArweaveWalletExtension for MockExtension {
    async fn get_permissions(&self) -> anyhow::Result<Vec<String>> {
        if !self.installed {
            anyhow::bail!("window.arweaveWallet is undefined");
        }
        Ok(self.granted.lock().unwrap().clone())
    }

    async fn connect(&self, permissions: &[&str]) -> anyhow::Result<()> {
        let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
        self.connect_requests.lock().unwrap().push(permissions.clone());
        self.granted.lock().unwrap().extend(permissions);
        Ok(())
    }

    async fn get_active_public_key(&self) -> anyhow::Result<String> {
        Ok(TEST_JWK.n.clone())
    }

    async fn signature(&self, data: &[u8], salt_length: usize) -> anyhow::Result<Vec<u8>> {
        anyhow::ensure!(salt_length == PSS_SALT_LENGTH, "unexpected salt length");
        Ok(self.signer.sign_bytes(data).await?)
    }

    async fn sign_transaction(&self, mut tx: ArweaveTransaction) -> anyhow::Result<ArweaveTransaction> {
        tx.owner = TEST_JWK.n.clone();
        let signature = self.signer.sign_bytes(&tx.signature_data()?).await?;
        tx.set_signature(&TEST_JWK.n, &signature);
        Ok(tx)
    }
}
