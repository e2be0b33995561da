use std::{future::Future, time::Duration};

use serde::Serialize;
use tokio::{
    sync::Mutex,
    time::{sleep_until, Instant},
};

use crate::{
    analysis::{self, suggestion, suggestion::Suggestion, Analysis},
    config::SETTINGS,
    crawler,
    declare::Market,
    error::QuoteError,
    logging,
    quote::StockQuote,
};

/// 單一上游的請求節流器
///
/// 記住上一次放行的時間點，距離不足設定間隔時先等待。
/// 以 tokio 的時鐘實作，測試可在暫停的時間下驗證節奏，不需真實等待。
pub struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Pacer {
            interval,
            last: Mutex::new(None),
        }
    }

    /// 等到與上一次放行至少相隔設定的間隔
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;

        if let Some(previous) = *last {
            let due = previous + self.interval;
            if due > Instant::now() {
                sleep_until(due).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// 批次查詢用的各市場節流器
///
/// 證交所的流量上限是明文規定，騰訊與 Yahoo 則是禮貌間隔；
/// 間隔各自獨立，混合市場的批次不會互相拖慢。
pub struct MarketPacers {
    taiwan: Pacer,
    china: Pacer,
    us: Pacer,
}

impl MarketPacers {
    pub fn from_settings() -> Self {
        MarketPacers {
            taiwan: Pacer::new(Duration::from_millis(SETTINGS.pacing.taiwan_millis)),
            china: Pacer::new(Duration::from_millis(SETTINGS.pacing.china_millis)),
            us: Pacer::new(Duration::from_millis(SETTINGS.pacing.us_millis)),
        }
    }

    pub fn for_market(&self, market: Market) -> &Pacer {
        match market {
            Market::Taiwan => &self.taiwan,
            Market::China => &self.china,
            Market::US => &self.us,
        }
    }
}

/// 批次查詢中單檔股票的結果
///
/// 查詢失敗時 `error` 帶錯誤訊息，其餘欄位為空；
/// 成功時 `quote` 必有值，分析欄位依查詢模式決定。
#[derive(Debug, Serialize)]
pub struct BatchItem {
    /// 呼叫端提供的原始代碼
    pub stock_symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<StockQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    fn from_result(
        stock_symbol: &str,
        result: Result<StockQuote, QuoteError>,
        with_analysis: bool,
    ) -> Self {
        match result {
            Ok(quote) => {
                let (analysis, suggestion) = if with_analysis {
                    let analysis = analysis::analyze(&quote);
                    let suggestion = suggestion::generate(&analysis, &quote);
                    (Some(analysis), Some(suggestion))
                } else {
                    (None, None)
                };

                BatchItem {
                    stock_symbol: stock_symbol.to_string(),
                    quote: Some(quote),
                    analysis,
                    suggestion,
                    error: None,
                }
            }
            Err(why) => BatchItem {
                stock_symbol: stock_symbol.to_string(),
                quote: None,
                analysis: None,
                suggestion: None,
                error: Some(why.to_string()),
            },
        }
    }
}

/// 批次查詢多檔股票（可跨市場）
///
/// 結果依輸入順序排列，單檔失敗只會變成該檔的錯誤記錄，
/// 不會中斷整個批次。`with_analysis` 為真時逐檔附上技術分析與買賣建議。
pub async fn fetch_batch(
    stock_symbols: &[String],
    with_analysis: bool,
) -> Result<Vec<BatchItem>, QuoteError> {
    run_batch(stock_symbols, with_analysis, |symbol| async move {
        crawler::fetch_quote(&symbol, None).await
    })
    .await
}

/// 批次查詢的主迴圈，查價函數由呼叫端注入
async fn run_batch<F, Fut>(
    stock_symbols: &[String],
    with_analysis: bool,
    fetch: F,
) -> Result<Vec<BatchItem>, QuoteError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<StockQuote, QuoteError>>,
{
    if stock_symbols.is_empty() {
        return Err(QuoteError::InvalidBatch("至少需要一檔股票代碼".to_string()));
    }

    let max_codes = SETTINGS.batch.max_codes;
    if stock_symbols.len() > max_codes {
        return Err(QuoteError::InvalidBatch(format!(
            "一次最多查詢 {} 檔股票",
            max_codes
        )));
    }

    let pacers = MarketPacers::from_settings();
    let mut items = Vec::with_capacity(stock_symbols.len());

    for symbol in stock_symbols {
        let market = Market::detect(symbol);
        pacers.for_market(market).wait().await;

        let result = fetch(symbol.to_string()).await;

        if let Err(why) = &result {
            logging::warn_file_async(format!(
                "Failed to fetch quote({}) because {:?}",
                symbol, why
            ));
        }

        items.push(BatchItem::from_result(symbol, result, with_analysis));
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_quote(symbol: &str) -> StockQuote {
        let mut quote = StockQuote::new(Market::detect(symbol), symbol.to_string());
        quote.last = 105.0;
        quote.open = 102.0;
        quote.high = 110.0;
        quote.low = 95.0;
        quote.prev_close = 100.0;
        quote
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacer_spacing() {
        let pacer = Pacer::new(Duration::from_millis(500));
        let start = Instant::now();

        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_millis(500));

        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let codes = vec![
            "2330".to_string(),
            "9999".to_string(),
            "AAPL".to_string(),
        ];

        let items = run_batch(&codes, false, |symbol| async move {
            if symbol == "9999" {
                Err(QuoteError::NotFound(symbol))
            } else {
                Ok(stub_quote(&symbol))
            }
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].stock_symbol, "2330");
        assert!(items[0].quote.is_some());
        assert!(items[0].error.is_none());

        assert_eq!(items[1].stock_symbol, "9999");
        assert!(items[1].quote.is_none());
        assert_eq!(items[1].error.as_deref(), Some("找不到股票代碼 9999"));

        assert_eq!(items[2].stock_symbol, "AAPL");
        assert!(items[2].quote.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_with_analysis() {
        let codes = vec!["2330".to_string()];
        let items = run_batch(&codes, true, |symbol| async move { Ok(stub_quote(&symbol)) })
            .await
            .unwrap();

        let item = &items[0];
        let indicators = item.analysis.as_ref().unwrap().indicators().unwrap();
        assert!((indicators.price_position - 66.666_666).abs() < 0.001);
        assert_eq!(item.suggestion.as_ref().unwrap().action, "觀望或小量買進");
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_paces_same_market_requests() {
        let codes = vec!["2330".to_string(), "2317".to_string(), "0050".to_string()];
        let start = Instant::now();

        run_batch(&codes, false, |symbol| async move { Ok(stub_quote(&symbol)) })
            .await
            .unwrap();

        // 同一上游的三個請求至少間隔兩次設定值
        let expected = Duration::from_millis(SETTINGS.pacing.taiwan_millis * 2);
        assert!(start.elapsed() >= expected);
    }

    #[tokio::test]
    async fn test_batch_rejects_empty_input() {
        let result = fetch_batch(&[], false).await;
        assert!(matches!(result, Err(QuoteError::InvalidBatch(_))));
    }

    #[tokio::test]
    async fn test_batch_rejects_oversized_input() {
        let codes: Vec<String> = (0..SETTINGS.batch.max_codes + 1)
            .map(|i| format!("{:04}", i + 1000))
            .collect();
        let result = fetch_batch(&codes, false).await;
        assert!(matches!(result, Err(QuoteError::InvalidBatch(_))));
    }
}
