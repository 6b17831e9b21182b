//! 参数校验
//!
//! 所有必填参数在发起任何网络/钱包调用之前统一检查

use crate::{
    domain::Token,
    error::{EverpayError, Result},
    utils::units::split_amount,
};

/// 待校验参数
#[derive(Debug, Clone, Copy)]
pub enum Param<'a> {
    Account(&'a str),
    Symbol(&'a str),
    Token(Option<&'a Token>),
    Amount(&'a str),
    To(&'a str),
    EverHash(&'a str),
}

/// 按顺序校验，遇到第一个失败立即返回
pub fn check_params(params: &[Param<'_>]) -> Result<()> {
    for param in params {
        match *param {
            Param::Account(account) if account.trim().is_empty() => {
                return Err(EverpayError::account_not_found("account is required"));
            }
            Param::Symbol(symbol) if symbol.trim().is_empty() => {
                return Err(EverpayError::symbol_not_found("symbol is required"));
            }
            Param::Token(None) => {
                return Err(EverpayError::token_not_found("token not found in token list"));
            }
            Param::Amount(amount) => validate_amount(amount)?,
            Param::To(to) if to.trim().is_empty() => {
                return Err(EverpayError::recipient_not_found("recipient is required"));
            }
            Param::EverHash(hash) if hash.trim().is_empty() => {
                return Err(EverpayError::transaction_hash_not_found("everHash is required"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// 金额必须是非负十进制数
fn validate_amount(amount: &str) -> Result<()> {
    split_amount(amount).map(|_| ())
}
