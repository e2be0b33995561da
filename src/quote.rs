use rust_decimal::Decimal;
use serde::Serialize;

use crate::declare::Market;

/// 五檔中的一檔：委託價與委託量
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub volume: i64,
}

/// 各市場轉接器正規化後的報價
///
/// 報價為單次查詢的產物：組裝完成後交給分析與輸出層使用，
/// 不做任何快取。數值欄位在組裝時已完成安全轉換，
/// 缺漏的欄位以 0 表示，不會因單一欄位異常而丟棄整筆報價。
#[derive(Debug, Clone, Serialize)]
pub struct StockQuote {
    /// 所屬市場，由產出報價的轉接器設定，下游不得再推斷
    pub market: Market,
    /// 市場顯示名稱
    pub market_name: &'static str,
    /// 轉接器解析後的代碼，A股會帶交易所前綴（例如 SH600519）
    pub symbol: String,
    /// 證券名稱
    pub name: String,
    /// 公司全名，目前只有美股提供
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
    /// 成交價
    pub last: f64,
    /// 開盤價
    pub open: f64,
    /// 最高價
    pub high: f64,
    /// 最低價
    pub low: f64,
    /// 昨收價
    pub prev_close: f64,
    /// 成交量。台股與A股單位為張（千股），美股為原始股數除以 100
    pub volume: i64,
    /// 成交額（萬），目前只有A股提供
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnover: Option<f64>,
    /// 委買五檔，最佳買價在前；美股無五檔資料
    pub bids: Vec<BookLevel>,
    /// 委賣五檔，最佳賣價在前
    pub asks: Vec<BookLevel>,
    /// 盤後旗標：台股成交價為空或為零時設定
    pub after_hours: bool,
    /// 報價時間（epoch 毫秒），上游未提供時以本地時間補上
    pub timestamp_millis: i64,
    /// 貨幣，目前只有美股提供
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// 交易所名稱，目前只有美股提供
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_name: Option<String>,
}

impl StockQuote {
    /// 建立指定市場的空報價，數值欄位皆為零
    pub fn new(market: Market, symbol: String) -> Self {
        StockQuote {
            market,
            market_name: market.name(),
            symbol,
            name: String::new(),
            long_name: None,
            last: 0.0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            prev_close: 0.0,
            volume: 0,
            turnover: None,
            bids: Vec::new(),
            asks: Vec::new(),
            after_hours: false,
            timestamp_millis: 0,
            currency: None,
            exchange_name: None,
        }
    }

    /// 最佳買價（委買第一檔）
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    /// 最佳賣價（委賣第一檔）
    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }

    /// 計算價格變動
    ///
    /// 回傳（變動金額, 變動百分比）。昨收價不大於零時百分比以 0 計。
    pub fn price_change(&self) -> (f64, f64) {
        let change = self.last - self.prev_close;
        let change_percent = if self.prev_close > 0.0 {
            change / self.prev_close * 100.0
        } else {
            0.0
        };

        (change, change_percent)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn quote() -> StockQuote {
        let mut q = StockQuote::new(Market::Taiwan, "2330".to_string());
        q.last = 105.0;
        q.prev_close = 100.0;
        q
    }

    #[test]
    fn test_price_change() {
        let q = quote();
        let (change, pct) = q.price_change();
        assert_eq!(change, 5.0);
        assert_eq!(pct, 5.0);
    }

    #[test]
    fn test_price_change_without_prev_close() {
        let mut q = quote();
        q.prev_close = 0.0;
        let (change, pct) = q.price_change();
        assert_eq!(change, 105.0);
        assert_eq!(pct, 0.0);
    }

    #[test]
    fn test_market_name_follows_market() {
        assert_eq!(quote().market_name, "台灣股市");
        assert_eq!(
            StockQuote::new(Market::US, "AAPL".to_string()).market_name,
            "美國股市"
        );
    }

    #[test]
    fn test_best_levels() {
        let mut q = quote();
        assert!(q.best_bid().is_none());

        q.bids.push(BookLevel {
            price: dec!(104.5),
            volume: 120,
        });
        q.bids.push(BookLevel {
            price: dec!(104.0),
            volume: 80,
        });

        assert_eq!(q.best_bid().unwrap().price, dec!(104.5));
    }
}
