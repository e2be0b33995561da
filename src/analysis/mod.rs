use serde::{Serialize, Serializer};

use crate::quote::StockQuote;

/// 買賣建議決策子模組
pub mod suggestion;

/// 趨勢
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Trend {
    /// 上漲
    Up,
    /// 下跌
    Down,
    /// 平盤
    Flat,
}

impl Trend {
    pub fn name(&self) -> &'static str {
        match self {
            Trend::Up => "上漲",
            Trend::Down => "下跌",
            Trend::Flat => "平盤",
        }
    }
}

impl Serialize for Trend {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// 技術指標分析結果
#[derive(Debug, Clone, Serialize)]
pub struct TechnicalIndicators {
    pub trend: Trend,
    /// 趨勢強度描述
    pub trend_strength: &'static str,
    /// 成交價在今日高低區間內的百分位，0~100
    pub price_position: f64,
    /// 價格位置描述
    pub position_desc: &'static str,
    pub current: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub prev_close: f64,
    pub volume: i64,
}

/// 技術分析的產出
///
/// 分析異常不往外拋：以 `Failed` 的結果值呈現，
/// 由買賣建議層轉成「無法分析」的回應。
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Analysis {
    Ok(TechnicalIndicators),
    Failed { error: String },
}

impl Analysis {
    pub fn indicators(&self) -> Option<&TechnicalIndicators> {
        match self {
            Analysis::Ok(indicators) => Some(indicators),
            Analysis::Failed { .. } => None,
        }
    }
}

/// 技術指標分析，所有市場通用
///
/// 純函數：輸入報價、輸出分析結果，不做任何 I/O。
pub fn analyze(quote: &StockQuote) -> Analysis {
    let current = quote.last;
    let open = quote.open;
    let high = quote.high;
    let low = quote.low;
    let prev_close = quote.prev_close;

    let inputs = [current, open, high, low, prev_close];
    if inputs.iter().any(|value| !value.is_finite()) {
        return Analysis::Failed {
            error: "技術分析錯誤: 數值異常".to_string(),
        };
    }

    // 高低同價（例如一價到底）時取中間值，不視為錯誤
    let price_position = if high > low {
        ((current - low) / (high - low) * 100.0).clamp(0.0, 100.0)
    } else {
        50.0
    };

    let (trend, trend_strength) = if current > prev_close {
        (Trend::Up, if current > open { "強勢" } else { "震盪上漲" })
    } else if current < prev_close {
        (Trend::Down, if current < open { "弱勢" } else { "震盪下跌" })
    } else {
        (Trend::Flat, "盤整")
    };

    let position_desc = if price_position >= 80.0 {
        "高檔區（接近今日最高）"
    } else if price_position >= 60.0 {
        "中高檔區"
    } else if price_position >= 40.0 {
        "中檔區"
    } else if price_position >= 20.0 {
        "中低檔區"
    } else {
        "低檔區（接近今日最低）"
    };

    Analysis::Ok(TechnicalIndicators {
        trend,
        trend_strength,
        price_position,
        position_desc,
        current,
        open,
        high,
        low,
        prev_close,
        volume: quote.volume,
    })
}
