use async_trait::async_trait;
use chrono::Local;
use concat_string::concat_string;
use serde::{Deserialize, Serialize};

use crate::{
    crawler::{twse, twse::Twse, QuoteSource},
    declare::{Market, TaiwanVenue},
    error::QuoteError,
    quote::{BookLevel, StockQuote},
    util::{http, text},
};

/// getStockInfo 的回應信封
#[derive(Serialize, Deserialize, Debug)]
struct StockInfoResponse {
    /// 狀態碼，成功為 "0000"
    pub rtcode: Option<String>,
    pub rtmessage: Option<String>,
    #[serde(rename = "msgArray", default)]
    pub msg_array: Vec<StockMessage>,
}

/// msgArray 內的單檔股票即時資訊
///
/// 盤後或無委託時，數值欄位會是空字串或 '-'。
#[derive(Serialize, Deserialize, Debug, Default)]
struct StockMessage {
    /// 股票代碼
    #[serde(default)]
    pub c: String,
    /// 股票名稱
    #[serde(default)]
    pub n: String,
    /// 成交價
    #[serde(default)]
    pub z: String,
    /// 開盤價
    #[serde(default)]
    pub o: String,
    /// 最高價
    #[serde(default)]
    pub h: String,
    /// 最低價
    #[serde(default)]
    pub l: String,
    /// 昨收價
    #[serde(default)]
    pub y: String,
    /// 成交量（張）
    #[serde(default)]
    pub v: String,
    /// 委買五檔價，底線分隔
    #[serde(default)]
    pub b: String,
    /// 委買五檔量，底線分隔
    #[serde(default)]
    pub g: String,
    /// 委賣五檔價，底線分隔
    #[serde(default)]
    pub a: String,
    /// 委賣五檔量，底線分隔
    #[serde(default)]
    pub f: String,
    /// 報價時間（epoch 毫秒）
    #[serde(default)]
    pub tlong: String,
}

/// 從證交所 API 取得指定市場的股票即時資料
///
/// 一個請求可以帶多檔代碼（以 | 串接）。msgArray 為空代表該市場
/// 查無此代碼，不是錯誤，由呼叫端決定是否改查其他市場。
pub async fn visit(
    stock_symbols: &[&str],
    venue: TaiwanVenue,
) -> Result<Vec<StockQuote>, QuoteError> {
    let ex_ch = stock_symbols
        .iter()
        .map(|symbol| concat_string!(venue.key(), "_", *symbol, ".tw"))
        .collect::<Vec<String>>()
        .join("|");
    let url = format!(
        "https://{}/stock/api/getStockInfo.jsp?ex_ch={}&json=1&delay=0",
        twse::HOST,
        urlencoding::encode(&ex_ch)
    );

    let data = http::get_json::<StockInfoResponse>(&url)
        .await
        .map_err(|why| QuoteError::upstream("無法連接證交所 API", why))?;

    if data.rtcode.as_deref() != Some("0000") {
        return Err(QuoteError::upstream_message(format!(
            "API 回應錯誤: {}",
            data.rtmessage.as_deref().unwrap_or("Unknown error")
        )));
    }

    Ok(data.msg_array.into_iter().map(to_quote).collect())
}

/// 將 msgArray 的單筆資料正規化成通用報價
///
/// 數值轉換不會失敗：缺漏欄位以 0 帶入。成交價為空或為零視為盤後。
fn to_quote(msg: StockMessage) -> StockQuote {
    let mut quote = StockQuote::new(Market::Taiwan, msg.c);
    quote.name = msg.n;
    quote.last = text::safe_f64(Some(&msg.z), 0.0);
    quote.open = text::safe_f64(Some(&msg.o), 0.0);
    quote.high = text::safe_f64(Some(&msg.h), 0.0);
    quote.low = text::safe_f64(Some(&msg.l), 0.0);
    quote.prev_close = text::safe_f64(Some(&msg.y), 0.0);
    quote.volume = text::safe_i64(Some(&msg.v), 0);
    quote.after_hours = quote.last == 0.0;
    quote.bids = parse_five_levels(&msg.b, &msg.g);
    quote.asks = parse_five_levels(&msg.a, &msg.f);
    quote.timestamp_millis = text::safe_i64(Some(&msg.tlong), 0);

    if quote.timestamp_millis == 0 {
        quote.timestamp_millis = Local::now().timestamp_millis();
    }

    quote
}

/// 解析底線分隔的五檔價量字串
///
/// 價與量逐檔配對，最佳檔在前；價格為佔位符的檔位直接略過，
/// 保持 bids/asks 為等長的平行序列。
fn parse_five_levels(prices: &str, volumes: &str) -> Vec<BookLevel> {
    prices
        .split('_')
        .zip(volumes.split('_'))
        .take(5)
        .filter(|(price, _)| !price.trim().is_empty() && price.trim() != "-")
        .map(|(price, volume)| BookLevel {
            price: text::safe_decimal(Some(price)),
            volume: text::safe_i64(Some(volume), 0),
        })
        .collect()
}

#[async_trait]
impl QuoteSource for Twse {
    /// 取得台股即時報價：先查上市，查無再查上櫃
    async fn get_quote(stock_symbol: &str) -> Result<StockQuote, QuoteError> {
        for venue in TaiwanVenue::iterator() {
            let mut quotes = visit(&[stock_symbol], venue).await?;

            if !quotes.is_empty() {
                return Ok(quotes.remove(0));
            }
        }

        Err(QuoteError::NotFound(stock_symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::logging;

    use super::*;

    fn msg_from_json(json: &str) -> StockMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_to_quote() {
        let msg = msg_from_json(
            r#"{
                "c": "2330", "n": "台積電",
                "z": "605.00", "o": "600.00", "h": "610.00", "l": "598.00",
                "y": "602.00", "v": "25468",
                "b": "604.00_603.00_602.00_601.00_600.00",
                "g": "120_85_60_45_30",
                "a": "605.00_606.00_607.00_608.00_609.00",
                "f": "95_110_70_55_40",
                "tlong": "1700000000000"
            }"#,
        );

        let quote = to_quote(msg);
        assert_eq!(quote.market, Market::Taiwan);
        assert_eq!(quote.market_name, "台灣股市");
        assert_eq!(quote.symbol, "2330");
        assert_eq!(quote.name, "台積電");
        assert_eq!(quote.last, 605.0);
        assert_eq!(quote.prev_close, 602.0);
        assert_eq!(quote.volume, 25468);
        assert!(!quote.after_hours);
        assert_eq!(quote.bids.len(), 5);
        assert_eq!(quote.asks.len(), 5);
        assert_eq!(quote.bids[0].price, dec!(604.00));
        assert_eq!(quote.bids[0].volume, 120);
        assert_eq!(quote.asks[0].price, dec!(605.00));
        assert_eq!(quote.timestamp_millis, 1_700_000_000_000);
    }

    #[test]
    fn test_to_quote_after_hours() {
        // 盤後成交價為 '-'，其餘欄位缺漏也不得中斷
        let msg = msg_from_json(
            r#"{"c": "2330", "n": "台積電", "z": "-", "y": "602.00"}"#,
        );

        let quote = to_quote(msg);
        assert!(quote.after_hours);
        assert_eq!(quote.last, 0.0);
        assert_eq!(quote.prev_close, 602.0);
        assert_eq!(quote.open, 0.0);
        assert!(quote.bids.is_empty());
        assert!(quote.timestamp_millis > 0);
    }

    #[test]
    fn test_parse_five_levels_partial() {
        let levels = parse_five_levels("604.00_-_602.00__", "120_85_60_45_30");
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].price, dec!(604.00));
        assert_eq!(levels[1].price, dec!(602.00));
        assert_eq!(levels[1].volume, 60);
    }

    #[test]
    fn test_envelope_error_code() {
        let data: StockInfoResponse =
            serde_json::from_str(r#"{"rtcode": "5001", "rtmessage": "pari is invalid."}"#).unwrap();
        assert_ne!(data.rtcode.as_deref(), Some("0000"));
        assert!(data.msg_array.is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_visit() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 visit".to_string());

        match visit(&["2330", "2317"], TaiwanVenue::Tse).await {
            Ok(quotes) => {
                logging::debug_file_async(format!("quotes : {:#?}", quotes));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to visit because {:?}", why));
            }
        }

        logging::debug_file_async("結束 visit".to_string());
    }
}
