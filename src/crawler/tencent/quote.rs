use async_trait::async_trait;
use chrono::Local;

use crate::{
    crawler::{tencent, tencent::Tencent, QuoteSource},
    declare::{ChinaExchange, Market},
    error::QuoteError,
    quote::{BookLevel, StockQuote},
    util::{http, text},
};

/// 回應欄位少於此數視為休市或格式錯誤
const MIN_FIELDS: usize = 40;

/// 報價字串中對應到通用報價的欄位
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum QuoteField {
    /// 名稱
    Name,
    /// 當前價
    Last,
    /// 昨收價
    PrevClose,
    /// 開盤價
    Open,
    /// 成交量（手）
    Volume,
    /// 最高價
    High,
    /// 最低價
    Low,
    /// 成交額（萬）
    Turnover,
}

/// 波浪號分隔字串的欄位位置對照表
///
/// 位置由騰訊接口固定，對照表集中於此，解析時逐項套用。
const FIELD_MAP: [(usize, QuoteField); 8] = [
    (1, QuoteField::Name),
    (3, QuoteField::Last),
    (4, QuoteField::PrevClose),
    (5, QuoteField::Open),
    (6, QuoteField::Volume),
    (33, QuoteField::High),
    (34, QuoteField::Low),
    (37, QuoteField::Turnover),
];

/// 委買五檔的（價, 量）欄位位置，買一到買五
const BID_LEVEL_INDICES: [(usize, usize); 5] = [(9, 10), (13, 14), (17, 18), (21, 22), (25, 26)];

/// 委賣五檔的（價, 量）欄位位置，賣一到賣五
const ASK_LEVEL_INDICES: [(usize, usize); 5] = [(11, 12), (15, 16), (19, 20), (23, 24), (27, 28)];

/// 將代碼正規化成騰訊接口用的符號，例如 600519 -> sh600519
///
/// 已帶 SH/SZ 前綴的代碼會先去除前綴再判斷交易所。
fn to_tencent_symbol(stock_symbol: &str) -> String {
    let code = stock_symbol.trim().to_uppercase();
    let bare = code
        .strip_prefix("SH")
        .or_else(|| code.strip_prefix("SZ"))
        .unwrap_or(&code);

    format!("{}{}", ChinaExchange::from_code(bare).prefix(), bare)
}

/// 從騰訊回應本文中取出引號內的報價字串
///
/// 本文形如 `v_sh600519="..."；`，沒有 `="` 或引號內為空都視為查無資料。
fn extract_payload(body: &str) -> Option<&str> {
    let start = body.find("=\"")? + 2;
    let end = body.rfind('"')?;

    if end <= start {
        return None;
    }

    let payload = &body[start..end];
    if payload.trim().is_empty() {
        return None;
    }

    Some(payload)
}

/// 依位置對照表把報價字串正規化成通用報價
fn to_quote(tencent_symbol: &str, payload: &str) -> Result<StockQuote, QuoteError> {
    let parts: Vec<&str> = payload.split('~').collect();

    if parts.len() < MIN_FIELDS {
        return Err(QuoteError::upstream_message("數據格式錯誤或市場休市"));
    }

    let mut quote = StockQuote::new(Market::China, tencent_symbol.to_uppercase());

    for (index, field) in FIELD_MAP {
        let raw = parts.get(index).copied();

        match field {
            QuoteField::Name => quote.name = raw.unwrap_or_default().to_string(),
            QuoteField::Last => quote.last = text::safe_f64(raw, 0.0),
            QuoteField::PrevClose => quote.prev_close = text::safe_f64(raw, 0.0),
            QuoteField::Open => quote.open = text::safe_f64(raw, 0.0),
            // 手（百股）轉張
            QuoteField::Volume => quote.volume = (text::safe_f64(raw, 0.0) / 100.0) as i64,
            QuoteField::High => quote.high = text::safe_f64(raw, 0.0),
            QuoteField::Low => quote.low = text::safe_f64(raw, 0.0),
            QuoteField::Turnover => quote.turnover = Some(text::safe_f64(raw, 0.0)),
        }
    }

    quote.bids = parse_levels(&parts, &BID_LEVEL_INDICES);
    quote.asks = parse_levels(&parts, &ASK_LEVEL_INDICES);
    quote.timestamp_millis = Local::now().timestamp_millis();

    Ok(quote)
}

/// 依（價, 量）位置取出五檔，價格為零或缺漏的檔位略過
fn parse_levels(parts: &[&str], indices: &[(usize, usize)]) -> Vec<BookLevel> {
    indices
        .iter()
        .filter_map(|(price_index, volume_index)| {
            let price = text::safe_decimal(parts.get(*price_index).copied());

            if price.is_zero() {
                return None;
            }

            Some(BookLevel {
                price,
                volume: text::safe_i64(parts.get(*volume_index).copied(), 0),
            })
        })
        .collect()
}

#[async_trait]
impl QuoteSource for Tencent {
    /// 取得A股即時報價
    async fn get_quote(stock_symbol: &str) -> Result<StockQuote, QuoteError> {
        let tencent_symbol = to_tencent_symbol(stock_symbol);
        let url = format!("http://{}/q={}", tencent::HOST, tencent_symbol);

        let body = http::get_use_gbk(&url)
            .await
            .map_err(|why| QuoteError::upstream("無法連接騰訊財經 API", why))?;

        let payload = extract_payload(&body)
            .ok_or_else(|| QuoteError::NotFound(stock_symbol.to_string()))?;

        to_quote(&tencent_symbol, payload)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::logging;

    use super::*;

    /// 依騰訊欄位位置組出最小可用的報價字串
    fn payload() -> String {
        let mut parts = vec![""; 50];
        parts[1] = "贵州茅台";
        parts[2] = "600519";
        parts[3] = "1700.00";
        parts[4] = "1690.00";
        parts[5] = "1695.00";
        parts[6] = "32000";
        parts[9] = "1699.99";
        parts[10] = "12";
        parts[11] = "1700.01";
        parts[12] = "8";
        parts[13] = "1699.98";
        parts[14] = "20";
        parts[15] = "1700.02";
        parts[16] = "15";
        parts[33] = "1710.00";
        parts[34] = "1688.00";
        parts[37] = "54321.0";
        parts.join("~")
    }

    #[test]
    fn test_to_tencent_symbol() {
        assert_eq!(to_tencent_symbol("600519"), "sh600519");
        assert_eq!(to_tencent_symbol("000001"), "sz000001");
        assert_eq!(to_tencent_symbol("300750"), "sz300750");
        assert_eq!(to_tencent_symbol("sh600519"), "sh600519");
        assert_eq!(to_tencent_symbol("SZ000001"), "sz000001");
    }

    #[test]
    fn test_extract_payload() {
        assert_eq!(extract_payload(r#"v_sh600519="a~b";"#), Some("a~b"));
        assert_eq!(extract_payload(r#"v_pv_none=""#), None);
        assert_eq!(extract_payload(r#"v_sh000000="";"#), None);
        assert_eq!(extract_payload("garbage"), None);
    }

    #[test]
    fn test_to_quote() {
        let quote = to_quote("sh600519", &payload()).unwrap();

        assert_eq!(quote.market, Market::China);
        assert_eq!(quote.symbol, "SH600519");
        assert_eq!(quote.name, "贵州茅台");
        assert_eq!(quote.last, 1700.0);
        assert_eq!(quote.prev_close, 1690.0);
        assert_eq!(quote.open, 1695.0);
        assert_eq!(quote.high, 1710.0);
        assert_eq!(quote.low, 1688.0);
        // 32000 手 / 100
        assert_eq!(quote.volume, 320);
        assert_eq!(quote.turnover, Some(54321.0));
        assert_eq!(quote.bids.len(), 2);
        assert_eq!(quote.bids[0].price, dec!(1699.99));
        assert_eq!(quote.bids[0].volume, 12);
        assert_eq!(quote.asks[0].price, dec!(1700.01));
        assert_eq!(quote.asks[1].volume, 15);
    }

    #[test]
    fn test_to_quote_too_few_fields() {
        let err = to_quote("sh600519", "51~贵州茅台~600519").unwrap_err();
        assert_eq!(err.to_string(), "數據格式錯誤或市場休市");
    }

    #[test]
    fn test_to_quote_with_missing_numbers() {
        // 缺漏與佔位欄位不得中斷組裝
        let mut parts = vec![""; 40];
        parts[1] = "平安银行";
        parts[3] = "-";
        let quote = to_quote("sz000001", &parts.join("~")).unwrap();

        assert_eq!(quote.name, "平安银行");
        assert_eq!(quote.last, 0.0);
        assert!(quote.bids.is_empty());
        assert!(quote.asks.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_get_quote() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 get_quote".to_string());

        match Tencent::get_quote("600519").await {
            Ok(quote) => {
                logging::debug_file_async(format!("quote : {:#?}", quote));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to get_quote because {:?}", why));
            }
        }

        logging::debug_file_async("結束 get_quote".to_string());
    }
}
