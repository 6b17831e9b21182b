//! everpay 客户端门面
//!
//! 读操作直接转发到结算服务；transfer/withdraw 走 构建 → 签名 → 提交 流水线；
//! deposit 不经过结算服务，直接在账户所在链上转入锁仓地址

use std::sync::Arc;

use crate::{
    config::Config,
    domain::{
        classify_account, BalanceItem, ChainTxReceipt, ChainType, EverpayAction, EverpayTransaction,
        EverpayTx, NetworkInfo, TransferOrWithdrawResult, TxsResult,
    },
    error::{EverpayError, Result},
    infrastructure::{EverpayApi, HttpEverpayApi, InfoCache},
    service::{
        deposit::{resolve_transfer, ChainTransfer, DepositTransfer},
        signer::{self, resolve_signer},
        transaction_builder::{
            BalanceParams, DepositParams, EverpayTxParams, TransactionBuilder,
            TransferParams, WithdrawParams,
        },
    },
    utils::{check_params, from_base_units, to_base_units, Param},
};

pub struct Everpay<A: EverpayApi = HttpEverpayApi> {
    config: Config,
    api: A,
    cache: InfoCache,
}

impl Everpay<HttpEverpayApi> {
    /// 使用配置中的 API 地址创建客户端
    pub fn new(config: Config) -> Result<Self> {
        let api = HttpEverpayApi::new(config.api_host(), &config.api)?;
        tracing::debug!(host = %api.host(), account = %config.account, "everpay client created");
        Ok(Self::with_api(config, api))
    }
}

impl<A: EverpayApi> Everpay<A> {
    pub fn with_api(config: Config, api: A) -> Self {
        let cache = InfoCache::new(config.api.info_ttl());
        Self { config, api, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// 配置账户的原生链
    pub fn account_chain_type(&self) -> Result<ChainType> {
        classify_account(&self.config.account)
            .native_chain()
            .ok_or_else(|| {
                EverpayError::invalid_account_type(format!(
                    "unrecognized account: {}",
                    self.config.account
                ))
            })
    }

    /// 网络信息，180s 内使用缓存
    pub async fn info(&self) -> Result<Arc<NetworkInfo>> {
        self.cache.get_or_refresh(|| self.api.get_info()).await
    }

    /// 单币种余额（十进制字符串）
    pub async fn balance(&self, params: BalanceParams) -> Result<String> {
        let account = params
            .account
            .clone()
            .unwrap_or_else(|| self.config.account.clone());
        check_params(&[Param::Account(&account), Param::Symbol(&params.symbol)])?;

        let info = self.info().await?;
        let token = info.token_by_symbol(&params.symbol);
        check_params(&[Param::Token(token)])?;
        let token = token.ok_or_else(|| EverpayError::token_not_found(params.symbol.clone()))?;

        // 多链代币按完整链列表查询，与服务端余额标签一致
        let resp = self
            .api
            .get_balance(&token.id, &token.chain_type, &account)
            .await?;
        from_base_units(&resp.balance.amount, resp.balance.decimals)
    }

    /// 账户全部余额
    pub async fn balances(&self, account: Option<&str>) -> Result<Vec<BalanceItem>> {
        let account = account.unwrap_or(self.config.account.as_str());
        check_params(&[Param::Account(account)])?;
        self.info().await?;

        let resp = self.api.get_balances(account).await?;
        resp.balances.iter().map(BalanceItem::try_from).collect()
    }

    pub async fn txs(&self, page: u32) -> Result<TxsResult> {
        self.api.get_transactions(page).await
    }

    pub async fn txs_by_account(&self, account: Option<&str>, page: u32) -> Result<TxsResult> {
        let account = account.unwrap_or(self.config.account.as_str());
        check_params(&[Param::Account(account)])?;
        self.api.get_transactions_by_account(account, page).await
    }

    pub async fn tx_by_hash(&self, ever_hash: &str) -> Result<EverpayTransaction> {
        check_params(&[Param::EverHash(ever_hash)])?;
        self.api.get_transaction(ever_hash).await
    }

    /// 充值：链上转账到锁仓地址
    pub async fn deposit(&self, params: DepositParams) -> Result<ChainTxReceipt> {
        check_params(&[
            Param::Account(&self.config.account),
            Param::Symbol(&params.symbol),
            Param::Amount(&params.amount),
        ])?;
        let backend = resolve_transfer(&self.config)?;
        self.deposit_with(params, backend.as_ref()).await
    }

    /// 使用指定后端充值
    pub async fn deposit_with(
        &self,
        params: DepositParams,
        backend: &dyn ChainTransfer,
    ) -> Result<ChainTxReceipt> {
        let info = self.info().await?;
        let token = info.token_by_symbol(&params.symbol);
        check_params(&[
            Param::Account(&self.config.account),
            Param::Symbol(&params.symbol),
            Param::Token(token),
            Param::Amount(&params.amount),
        ])?;
        let token = token.ok_or_else(|| EverpayError::token_not_found(params.symbol.clone()))?;

        let chain_type = backend.chain_type();
        if !token.supports(chain_type) {
            return Err(EverpayError::chain_not_supported(format!(
                "{} cannot be deposited from {}",
                token.symbol, chain_type
            )));
        }

        let request = DepositTransfer {
            symbol: params.symbol.clone(),
            token: token.clone(),
            from: self.config.account.clone(),
            to: info.locker(chain_type)?.to_string(),
            value: to_base_units(&params.amount, token.decimals)?,
            chain_id: info.chain_id(chain_type)?,
        };
        tracing::info!(
            account = %self.config.account,
            symbol = %request.symbol,
            chain_type = %chain_type,
            value = %request.value,
            "depositing to locker"
        );
        let receipt = backend.transfer(&request).await?;
        if receipt.tx_hash.is_empty() {
            return Err(EverpayError::chain_tx_hash_not_found(format!(
                "{} transfer returned no transaction hash",
                chain_type
            )));
        }
        Ok(receipt)
    }

    pub async fn transfer(&self, params: TransferParams) -> Result<TransferOrWithdrawResult> {
        check_params(&[
            Param::Account(&self.config.account),
            Param::Symbol(&params.symbol),
            Param::Amount(&params.amount),
            Param::To(&params.to),
        ])?;
        self.info().await?;
        self.send_everpay_tx(EverpayAction::Transfer, params.into())
            .await
    }

    pub async fn withdraw(&self, params: WithdrawParams) -> Result<TransferOrWithdrawResult> {
        check_params(&[
            Param::Account(&self.config.account),
            Param::Symbol(&params.symbol),
            Param::Amount(&params.amount),
        ])?;
        self.info().await?;
        self.send_everpay_tx(EverpayAction::Withdraw, params.into())
            .await
    }

    /// 构建、签名并提交交易
    pub async fn send_everpay_tx(
        &self,
        action: EverpayAction,
        params: EverpayTxParams,
    ) -> Result<TransferOrWithdrawResult> {
        check_params(&[Param::Account(&self.config.account)])?;
        let info = self.info().await?;
        let signer = resolve_signer(&self.config)?;

        let unsigned = TransactionBuilder::new(&info, &self.config)
            .build(action, &params, signer.as_ref())
            .await?;
        let signed = signer.sign_message(&unsigned.message()).await?;
        let everpay_tx: EverpayTx = unsigned.with_sig(signed.sig);

        let result = self.api.submit_transaction(&everpay_tx).await?;
        tracing::info!(
            action = %action,
            account = %self.config.account,
            symbol = %everpay_tx.tx.token_symbol,
            ever_hash = %signed.ever_hash,
            status = %result.status,
            "everpay transaction submitted"
        );

        Ok(TransferOrWithdrawResult::new(result, signed.ever_hash, everpay_tx))
    }

    /// 校验签名，失败返回 false
    pub fn verify_signature(&self, address: &str, message: &str, sig: &str) -> bool {
        signer::verify_signature(address, message, sig)
    }
}
