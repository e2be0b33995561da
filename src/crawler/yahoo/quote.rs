use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;

use crate::{
    crawler::{yahoo, yahoo::Yahoo, QuoteSource},
    declare::Market,
    error::QuoteError,
    quote::StockQuote,
    util::http,
};

/// v8 chart API 的回應信封
#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: Option<Chart>,
}

#[derive(Deserialize, Debug)]
struct Chart {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    meta: Meta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Deserialize, Debug, Default)]
struct Meta {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
    /// 當前價
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<f64>,
    /// 昨收價
    #[serde(rename = "previousClose", default)]
    previous_close: Option<f64>,
    /// 昨收價的備援欄位
    #[serde(rename = "chartPreviousClose", default)]
    chart_previous_close: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(rename = "exchangeName", default)]
    exchange_name: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

/// 當日 K 線的 OHLV 序列，元素可能為 null
#[derive(Deserialize, Debug, Default)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// 取序列的最後一個值，序列缺漏或尾端為 null 時回傳 0
fn last_value(values: &[Option<f64>]) -> f64 {
    values.last().copied().flatten().unwrap_or(0.0)
}

fn to_quote(symbol: &str, result: ChartResult) -> StockQuote {
    let meta = result.meta;
    let block = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut quote = StockQuote::new(Market::US, symbol.to_string());
    quote.name = meta.symbol.unwrap_or_else(|| symbol.to_string());
    quote.long_name = meta.long_name.filter(|name| !name.is_empty());
    quote.last = meta.regular_market_price.unwrap_or(0.0);
    quote.prev_close = meta
        .previous_close
        .or(meta.chart_previous_close)
        .unwrap_or(0.0);
    quote.open = last_value(&block.open);
    quote.high = last_value(&block.high);
    quote.low = last_value(&block.low);
    // 原始股數除以 100，與其他市場的張數顯示對齊
    quote.volume = (last_value(&block.volume) / 100.0) as i64;
    quote.currency = Some(meta.currency.unwrap_or_else(|| "USD".to_string()));
    quote.exchange_name = Some(meta.exchange_name.unwrap_or_else(|| "NYSE".to_string()));
    quote.timestamp_millis = Local::now().timestamp_millis();

    quote
}

#[async_trait]
impl QuoteSource for Yahoo {
    /// 取得美股即時報價
    async fn get_quote(stock_symbol: &str) -> Result<StockQuote, QuoteError> {
        let symbol = stock_symbol.trim().to_uppercase();
        let url = format!(
            "https://{}/v8/finance/chart/{}?interval=1d&range=1d",
            yahoo::HOST,
            symbol
        );

        let data = http::get_json::<ChartResponse>(&url)
            .await
            .map_err(|why| QuoteError::upstream("無法連接 Yahoo Finance API", why))?;

        let result = data
            .chart
            .and_then(|chart| chart.result)
            .and_then(|mut results| {
                if results.is_empty() {
                    None
                } else {
                    Some(results.remove(0))
                }
            })
            .ok_or_else(|| QuoteError::NotFound(symbol.clone()))?;

        Ok(to_quote(&symbol, result))
    }
}
