use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::{
    analysis::{Analysis, Trend},
    quote::StockQuote,
};

/// 買賣建議
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    /// 建議動作
    pub action: &'static str,
    /// 理由，引用價格位置描述
    pub reason: String,
    /// 風險等級
    pub risk_level: &'static str,
    /// 最佳買賣價差，僅在有五檔資料的市場提供
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
}

/// 依（趨勢 × 價格位置）的固定決策表產生買賣建議
///
/// 表是完整的：任何分析結果都有對應的動作與風險等級。
/// 分析失敗時回傳「無法分析」並帶回錯誤訊息。
pub fn generate(analysis: &Analysis, quote: &StockQuote) -> Suggestion {
    let indicators = match analysis {
        Analysis::Ok(indicators) => indicators,
        Analysis::Failed { error } => {
            return Suggestion {
                action: "無法分析",
                reason: error.clone(),
                risk_level: "未知",
                spread: None,
            };
        }
    };

    let price_position = indicators.price_position;
    let position_desc = indicators.position_desc;

    let (action, reason, risk_level) = match indicators.trend {
        Trend::Up => {
            if price_position < 40.0 {
                (
                    "買進",
                    format!("股價處於{}且呈上漲趨勢，具備向上動能", position_desc),
                    "中等",
                )
            } else if price_position < 70.0 {
                (
                    "觀望或小量買進",
                    format!("股價已上漲至{}，可等回檔再進場", position_desc),
                    "中高",
                )
            } else {
                (
                    "觀望",
                    format!("股價已在{}，追高風險較大", position_desc),
                    "高",
                )
            }
        }
        Trend::Down => {
            if price_position > 60.0 {
                (
                    "賣出或減碼",
                    format!("股價雖處{}但呈下跌趨勢，建議減碼", position_desc),
                    "中高",
                )
            } else if price_position > 30.0 {
                (
                    "觀望",
                    format!("股價在{}且下跌中，等待止跌訊號", position_desc),
                    "中等",
                )
            } else {
                (
                    "觀望或小量買進",
                    format!("股價已在{}，可能接近短期支撐", position_desc),
                    "中等",
                )
            }
        }
        Trend::Flat => {
            if price_position < 30.0 {
                (
                    "可考慮買進",
                    format!("股價在{}，風險相對較低", position_desc),
                    "中低",
                )
            } else if price_position > 70.0 {
                (
                    "觀望",
                    format!("股價在{}，等待回檔", position_desc),
                    "中等",
                )
            } else {
                ("觀望", "股價盤整中，等待明確趨勢".to_string(), "中等")
            }
        }
    };

    Suggestion {
        action,
        reason,
        risk_level,
        spread: best_spread(quote),
    }
}

/// 最佳賣價減最佳買價；任一邊沒有掛單就沒有價差
fn best_spread(quote: &StockQuote) -> Option<f64> {
    let bid = quote.best_bid()?.price.to_f64()?;
    let ask = quote.best_ask()?.price.to_f64()?;

    Some(ask - bid)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{analysis, declare::Market, quote::BookLevel};

    use super::*;

    fn quote(last: f64, open: f64, high: f64, low: f64, prev_close: f64) -> StockQuote {
        let mut q = StockQuote::new(Market::Taiwan, "2330".to_string());
        q.last = last;
        q.open = open;
        q.high = high;
        q.low = low;
        q.prev_close = prev_close;
        q
    }

    fn suggest(last: f64, open: f64, high: f64, low: f64, prev_close: f64) -> Suggestion {
        let q = quote(last, open, high, low, prev_close);
        generate(&analysis::analyze(&q), &q)
    }

    #[test]
    fn test_up_trend_bands() {
        // 位置 = (last-95)/15*100，prev=100 以下皆上漲
        let s = suggest(100.5, 102.0, 110.0, 95.0, 100.0);
        assert_eq!(s.action, "買進");
        assert_eq!(s.risk_level, "中等");

        let s = suggest(105.0, 102.0, 110.0, 95.0, 100.0);
        assert_eq!(s.action, "觀望或小量買進");
        assert_eq!(s.risk_level, "中高");
        assert!(s.reason.contains("中高檔區"));

        let s = suggest(108.0, 102.0, 110.0, 95.0, 100.0);
        assert_eq!(s.action, "觀望");
        assert_eq!(s.risk_level, "高");
    }

    #[test]
    fn test_down_trend_bands() {
        let s = suggest(99.0, 99.5, 100.0, 93.0, 100.0);
        // 位置 = 6/7*100 ≈ 85.7，下跌且位置 > 60
        assert_eq!(s.action, "賣出或減碼");
        assert_eq!(s.risk_level, "中高");

        let s = suggest(96.5, 99.5, 100.0, 93.0, 100.0);
        // 位置 = 50，30~60 之間
        assert_eq!(s.action, "觀望");
        assert_eq!(s.risk_level, "中等");

        let s = suggest(94.0, 99.5, 100.0, 93.0, 100.0);
        // 位置 ≈ 14.3，接近支撐
        assert_eq!(s.action, "觀望或小量買進");
        assert_eq!(s.risk_level, "中等");
    }

    #[test]
    fn test_flat_trend_bands() {
        let s = suggest(100.0, 100.5, 105.0, 99.0, 100.0);
        // 位置 = 1/6*100 ≈ 16.7
        assert_eq!(s.action, "可考慮買進");
        assert_eq!(s.risk_level, "中低");

        let s = suggest(100.0, 100.5, 101.0, 96.0, 100.0);
        // 位置 = 4/5*100 = 80
        assert_eq!(s.action, "觀望");
        assert_eq!(s.reason, "股價在高檔區（接近今日最高），等待回檔");

        let s = suggest(100.0, 100.5, 102.0, 98.0, 100.0);
        // 位置 = 50，盤整
        assert_eq!(s.action, "觀望");
        assert_eq!(s.reason, "股價盤整中，等待明確趨勢");
    }

    #[test]
    fn test_deterministic() {
        let first = suggest(105.0, 102.0, 110.0, 95.0, 100.0);
        let second = suggest(105.0, 102.0, 110.0, 95.0, 100.0);

        assert_eq!(first.action, second.action);
        assert_eq!(first.reason, second.reason);
        assert_eq!(first.risk_level, second.risk_level);
    }

    #[test]
    fn test_failed_analysis() {
        let q = quote(0.0, 0.0, 0.0, 0.0, 0.0);
        let failed = Analysis::Failed {
            error: "技術分析錯誤: 數值異常".to_string(),
        };
        let s = generate(&failed, &q);

        assert_eq!(s.action, "無法分析");
        assert_eq!(s.risk_level, "未知");
        assert_eq!(s.reason, "技術分析錯誤: 數值異常");
        assert!(s.spread.is_none());
    }

    #[test]
    fn test_spread_with_book() {
        let mut q = quote(105.0, 102.0, 110.0, 95.0, 100.0);
        q.bids.push(BookLevel {
            price: dec!(104.5),
            volume: 10,
        });
        q.asks.push(BookLevel {
            price: dec!(105.5),
            volume: 12,
        });

        let s = generate(&analysis::analyze(&q), &q);
        assert!((s.spread.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_spread_without_book() {
        let s = suggest(105.0, 102.0, 110.0, 95.0, 100.0);
        assert!(s.spread.is_none());
    }
}
