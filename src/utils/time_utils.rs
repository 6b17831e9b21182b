//! 时间工具模块

use chrono::Utc;

/// 获取当前时间戳（毫秒），用作交易 nonce
///
/// 依赖本地时钟：时钟回拨或同一毫秒内重复调用会产生重复 nonce
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// 交易 nonce（十进制毫秒字符串）
pub fn next_nonce() -> String {
    current_timestamp_ms().to_string()
}
