//! 金额单位换算
//!
//! 十进制金额 <-> 链上最小单位整数。按字符串切分整数/小数部分后直接得到 256 位整数，不经过浮点或定长十进制

use ethers::{types::U256, utils::format_units};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EverpayError, Result};

// 至少一位数字；允许 `.5`、`5.`
static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d*)(?:\.(\d*))?$").expect("valid regex"));

/// U256 能容纳的最大精度
const MAX_DECIMALS: u32 = 76;

/// 拆分十进制金额为 (整数部分, 小数部分)
pub fn split_amount(amount: &str) -> Result<(&str, &str)> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(EverpayError::amount_invalid("amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(EverpayError::amount_invalid(format!(
            "amount must not be negative: {}",
            trimmed
        )));
    }
    let caps = AMOUNT_RE
        .captures(trimmed)
        .ok_or_else(|| EverpayError::amount_invalid(format!("invalid amount: {}", trimmed)))?;
    let int_part = caps.get(1).map_or("", |m| m.as_str());
    let frac_part = caps.get(2).map_or("", |m| m.as_str());
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(EverpayError::amount_invalid(format!("invalid amount: {}", trimmed)));
    }
    Ok((int_part, frac_part))
}

/// 十进制金额转最小单位
///
/// 超出精度的小数位直接截断（向零），不报错
pub fn to_base_units(amount: &str, decimals: u32) -> Result<U256> {
    let (int_part, frac_part) = split_amount(amount)?;
    if decimals > MAX_DECIMALS {
        return Err(EverpayError::amount_invalid(format!(
            "unsupported precision: {}",
            decimals
        )));
    }

    let width = decimals as usize;
    let frac_part = &frac_part[..frac_part.len().min(width)];
    let digits = format!("{}{:0<width$}", int_part, frac_part, width = width);
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| {
        EverpayError::amount_invalid(format!("amount overflows: {}", amount.trim()))
    })
}

/// 最小单位转十进制金额，去掉多余的尾随零
pub fn from_base_units(raw: &str, decimals: u32) -> Result<String> {
    let value = U256::from_dec_str(raw.trim())
        .map_err(|e| EverpayError::amount_invalid(format!("invalid base units {}: {}", raw, e)))?;
    format_base_units(value, decimals)
}

pub fn format_base_units(value: U256, decimals: u32) -> Result<String> {
    let formatted = format_units(value, decimals).map_err(|e| {
        EverpayError::amount_invalid(format!("unsupported precision {}: {}", decimals, e))
    })?;
    Ok(formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string())
}
