//! 交易记录构建器
//!
//! 由网络信息 + 调用参数生成未签名的 everpay 交易记录。
//! 所有必填参数在接触签名者之前统一校验

use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    config::{Config, EVERPAY_TX_VERSION},
    domain::{classify_account, ChainType, EverpayAction, EverpayTxWithoutSig, NetworkInfo, Token},
    error::{EverpayError, Result},
    service::signer::ChainSigner,
    utils::{check_params, next_nonce, to_base_units, Param},
};

/// 转账参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferParams {
    pub symbol: String,
    /// 十进制金额
    pub amount: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_type: Option<ChainType>,
}

/// 提现参数，`to` 缺省为本账户
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawParams {
    pub symbol: String,
    pub amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_type: Option<ChainType>,
}

/// 充值参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositParams {
    pub symbol: String,
    pub amount: String,
}

/// 单币种余额查询参数，缺省字段取自配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceParams {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// transfer / withdraw 共用的内部参数
#[derive(Debug, Clone)]
pub struct EverpayTxParams {
    pub symbol: String,
    pub amount: String,
    pub to: Option<String>,
    pub chain_type: Option<ChainType>,
}

impl From<TransferParams> for EverpayTxParams {
    fn from(p: TransferParams) -> Self {
        Self {
            symbol: p.symbol,
            amount: p.amount,
            to: Some(p.to),
            chain_type: p.chain_type,
        }
    }
}

impl From<WithdrawParams> for EverpayTxParams {
    fn from(p: WithdrawParams) -> Self {
        Self {
            symbol: p.symbol,
            amount: p.amount,
            to: p.to,
            chain_type: p.chain_type,
        }
    }
}

/// 目标链：参数 → 配置 → 账户原生链，且代币必须支持
pub fn resolve_chain_type(
    requested: Option<ChainType>,
    config: &Config,
    token: &Token,
) -> Result<ChainType> {
    let chain_type = requested
        .or(config.chain_type)
        .or_else(|| classify_account(&config.account).native_chain())
        .ok_or_else(|| {
            EverpayError::invalid_account_type(format!("unrecognized account: {}", config.account))
        })?;
    if !token.supports(chain_type) {
        return Err(EverpayError::chain_not_supported(format!(
            "{} is not available on {}",
            token.symbol, chain_type
        )));
    }
    Ok(chain_type)
}

pub struct TransactionBuilder<'a> {
    info: &'a NetworkInfo,
    config: &'a Config,
}

impl<'a> TransactionBuilder<'a> {
    pub fn new(info: &'a NetworkInfo, config: &'a Config) -> Self {
        Self { info, config }
    }

    /// 构建未签名交易
    ///
    /// # 流程
    /// 1. 查找代币，补全收款人并统一校验参数
    /// 2. 解析目标链
    /// 3. 计算金额与手续费（最小单位）
    /// 4. 向签名者取 data 字段并组装记录
    pub async fn build(
        &self,
        action: EverpayAction,
        params: &EverpayTxParams,
        signer: &dyn ChainSigner,
    ) -> Result<EverpayTxWithoutSig> {
        let sender = self.config.account.as_str();

        // 1. 校验
        let token = self.info.token_by_symbol(&params.symbol);
        let to = match (&params.to, action) {
            (Some(to), _) => to.clone(),
            (None, EverpayAction::Withdraw) => sender.to_string(),
            (None, EverpayAction::Transfer) => String::new(),
        };
        check_params(&[
            Param::Account(sender),
            Param::Symbol(&params.symbol),
            Param::Token(token),
            Param::Amount(&params.amount),
            Param::To(&to),
        ])?;
        let token = token.ok_or_else(|| EverpayError::token_not_found(params.symbol.clone()))?;

        // 2. 目标链
        let chain_type = resolve_chain_type(params.chain_type, self.config, token)?;
        let chain_id = self.info.chain_id(chain_type)?;

        // 3. 金额
        let (amount, fee) = Self::amount_and_fee(action, &params.amount, token)?;

        // 4. 组装
        let data = signer.tx_data_field().await?;
        Ok(EverpayTxWithoutSig {
            token_symbol: token.symbol.clone(),
            action,
            from: sender.to_string(),
            to,
            amount: amount.to_string(),
            fee: fee.to_string(),
            fee_recipient: self.info.fee_recipient.to_lowercase(),
            nonce: next_nonce(),
            token_id: token.id.to_lowercase(),
            chain_type,
            chain_id,
            data,
            version: EVERPAY_TX_VERSION.to_string(),
        })
    }

    /// 提现扣除销毁费：amount = base(A) - burnFee，fee = burnFee；转账无手续费
    pub fn amount_and_fee(action: EverpayAction, amount: &str, token: &Token) -> Result<(U256, U256)> {
        let base = to_base_units(amount, token.decimals)?;
        match action {
            EverpayAction::Transfer => Ok((base, U256::zero())),
            EverpayAction::Withdraw => {
                let fee = U256::from_dec_str(token.burn_fee.trim()).map_err(|e| {
                    EverpayError::amount_invalid(format!("invalid burn fee {}: {}", token.burn_fee, e))
                })?;
                let net = base.checked_sub(fee).ok_or_else(|| {
                    EverpayError::amount_invalid(format!(
                        "amount {} {} does not cover the burn fee",
                        amount, token.symbol
                    ))
                })?;
                Ok((net, fee))
            }
        }
    }
}
