use std::str::FromStr;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// 上游以空字串或 '-' 表示無資料
fn is_placeholder(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed == "-"
}

/// 去除空白與千分位逗號
fn clean_number(s: &str) -> String {
    s.trim().replace(',', "")
}

/// 安全轉換浮點數
///
/// 無資料（None、空字串、'-'）或解析失敗一律回傳預設值，
/// 確保任何欄位缺漏都不會讓報價組裝中斷。
pub fn safe_f64(value: Option<&str>, default: f64) -> f64 {
    match value {
        Some(s) if !is_placeholder(s) => f64::from_str(&clean_number(s)).unwrap_or(default),
        _ => default,
    }
}

/// 安全轉換整數，規則同 [`safe_f64`]
pub fn safe_i64(value: Option<&str>, default: i64) -> i64 {
    match value {
        Some(s) if !is_placeholder(s) => {
            let cleaned = clean_number(s);
            i64::from_str(&cleaned)
                .or_else(|_| f64::from_str(&cleaned).map(|f| f as i64))
                .unwrap_or(default)
        }
        _ => default,
    }
}

/// 安全轉換 Decimal，無資料或解析失敗回傳零
pub fn safe_decimal(value: Option<&str>) -> Decimal {
    match value {
        Some(s) if !is_placeholder(s) => {
            Decimal::from_str(&clean_number(s)).unwrap_or_default()
        }
        _ => Decimal::ZERO,
    }
}

/// Converts a GBK encoded byte slice to a UTF-8 `String`.
///
/// 解碼過程中無法辨識的位元組以替代字元帶過，不視為錯誤；
/// 只有完全無法產出內容時才回傳錯誤。
pub fn gbk_2_utf8(data: &[u8]) -> Result<String> {
    let (decoded, _, _) = encoding_rs::GBK.decode(data);

    if decoded.is_empty() && !data.is_empty() {
        return Err(anyhow!("Failed to GBK.decode {} bytes", data.len()));
    }

    Ok(decoded.into_owned())
}
