use async_trait::async_trait;

use crate::{
    crawler::{tencent::Tencent, twse::Twse, yahoo::Yahoo},
    declare::Market,
    error::QuoteError,
    quote::StockQuote,
};

/// 騰訊財經（A股報價）
pub mod tencent;
/// 台灣證券交易所（上市、上櫃即時報價）
pub mod twse;
/// Yahoo 財經（美股報價）
pub mod yahoo;

/// 各市場報價來源的統一介面
///
/// 每個市場由一個轉接器實作：自行處理線路格式、重試與回退策略，
/// 並把上游資料正規化成 [`StockQuote`]。
#[async_trait]
pub trait QuoteSource {
    async fn get_quote(stock_symbol: &str) -> Result<StockQuote, QuoteError>;
}

/// 取得股票的即時報價
///
/// 未指定市場時依代碼自動識別。三個市場的分派只存在於此處，
/// 呼叫端只依賴 [`QuoteSource`] 的能力，不做市場判斷。
pub async fn fetch_quote(
    stock_symbol: &str,
    market: Option<Market>,
) -> Result<StockQuote, QuoteError> {
    let market = market.unwrap_or_else(|| Market::detect(stock_symbol));

    match market {
        Market::Taiwan => Twse::get_quote(stock_symbol).await,
        Market::China => Tencent::get_quote(stock_symbol).await,
        Market::US => Yahoo::get_quote(stock_symbol).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging;

    #[tokio::test]
    #[ignore]
    async fn test_fetch_quote() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 fetch_quote".to_string());

        match fetch_quote("2330", None).await {
            Ok(quote) => {
                dbg!(&quote);
                logging::debug_file_async(format!("quote : {:#?}", quote));
            }
            Err(why) => {
                logging::debug_file_async(format!("Failed to fetch_quote because {:?}", why));
            }
        }

        logging::debug_file_async("結束 fetch_quote".to_string());
    }
}
