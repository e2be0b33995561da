use std::fmt::Write as _;

use anyhow::Result;
use chrono::{Local, TimeZone};

use crate::{
    analysis::{suggestion::Suggestion, Analysis},
    batch::BatchItem,
    declare::Market,
    quote::StockQuote,
};

/// 格式化時間戳記，無法解析時原樣回傳
pub fn format_timestamp(timestamp_millis: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_millis).single() {
        Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_millis.to_string(),
    }
}

/// 將單檔報價格式化為 Markdown
///
/// 台股盤後（成交價為空或零）顯示昨收價並加註盤後，
/// 不顯示即時成交價。有五檔資料的市場附上委買賣表。
pub fn stock_markdown(
    quote: &StockQuote,
    analysis: Option<&Analysis>,
    suggestion: Option<&Suggestion>,
) -> String {
    let mut markdown = String::with_capacity(1024);
    let name = if quote.name.is_empty() {
        quote.long_name.as_deref().unwrap_or("N/A")
    } else {
        &quote.name
    };

    let _ = writeln!(markdown, "## 📊 {} ({})", name, quote.symbol);
    let _ = writeln!(markdown, "### 🌏 市場: {}", quote.market_name);
    let _ = writeln!(markdown);
    let _ = writeln!(markdown, "### 即時報價");

    if quote.after_hours {
        let _ = writeln!(
            markdown,
            "- **成交價**: {:.2} (昨收，盤後)",
            quote.prev_close
        );
    } else {
        let (change, change_percent) = quote.price_change();
        let _ = writeln!(
            markdown,
            "- **成交價**: {:.2} ({:+.2}, {:+.2}%)",
            quote.last, change, change_percent
        );
    }

    let _ = writeln!(markdown, "- **開盤**: {:.2}", quote.open);
    let _ = writeln!(markdown, "- **最高**: {:.2}", quote.high);
    let _ = writeln!(markdown, "- **最低**: {:.2}", quote.low);
    let _ = writeln!(markdown, "- **昨收**: {:.2}", quote.prev_close);
    let _ = writeln!(
        markdown,
        "- **成交量**: {} {}",
        quote.volume,
        if quote.market == Market::US { "手" } else { "張" }
    );
    let _ = writeln!(
        markdown,
        "- **時間**: {}",
        format_timestamp(quote.timestamp_millis)
    );

    if let (Some(currency), Some(exchange)) = (&quote.currency, &quote.exchange_name) {
        let _ = writeln!(markdown, "- **交易所**: {}", exchange);
        let _ = writeln!(markdown, "- **貨幣**: {}", currency);
    }

    if !quote.bids.is_empty() || !quote.asks.is_empty() {
        let _ = writeln!(markdown);
        let _ = writeln!(markdown, "### 買賣五檔");
        let _ = writeln!(markdown);
        let _ = writeln!(markdown, "| 委買量 | 委買價 | 委賣價 | 委賣量 |");
        let _ = writeln!(markdown, "|--------|--------|--------|--------|");

        for i in 0..5 {
            let (bid_price, bid_volume) = match quote.bids.get(i) {
                Some(level) => (level.price.to_string(), level.volume.to_string()),
                None => ("-".to_string(), "-".to_string()),
            };
            let (ask_price, ask_volume) = match quote.asks.get(i) {
                Some(level) => (level.price.to_string(), level.volume.to_string()),
                None => ("-".to_string(), "-".to_string()),
            };

            let _ = writeln!(
                markdown,
                "| {} | {} | {} | {} |",
                bid_volume, bid_price, ask_price, ask_volume
            );
        }
    }

    if let (Some(analysis), Some(suggestion)) = (analysis, suggestion) {
        let _ = writeln!(markdown);
        let _ = writeln!(markdown, "### 📈 技術分析");

        match analysis.indicators() {
            Some(indicators) => {
                let _ = writeln!(
                    markdown,
                    "- **趨勢**: {} ({})",
                    indicators.trend.name(),
                    indicators.trend_strength
                );
                let _ = writeln!(
                    markdown,
                    "- **價格位置**: {} ({:.1}%)",
                    indicators.position_desc, indicators.price_position
                );
            }
            None => {
                let _ = writeln!(markdown, "- 無法分析");
            }
        }

        let _ = writeln!(markdown);
        let _ = writeln!(markdown, "### 💡 交易建議");
        let _ = writeln!(markdown, "- **建議動作**: {}", suggestion.action);
        let _ = writeln!(markdown, "- **理由**: {}", suggestion.reason);
        let _ = writeln!(markdown, "- **風險等級**: {}", suggestion.risk_level);

        if let Some(spread) = suggestion.spread {
            let _ = writeln!(markdown, "- **買賣價差**: {:.2}", spread);
        }

        let _ = writeln!(markdown);
        let _ = writeln!(markdown, "---");
        let _ = writeln!(
            markdown,
            "⚠️ **免責聲明**: 以上分析僅供參考，不構成投資建議。投資有風險，請謹慎評估。"
        );
    }

    markdown
}

/// 將批次查詢結果格式化為 Markdown 報告
pub fn batch_markdown(items: &[BatchItem]) -> String {
    let mut markdown = String::from("# 📊 多市場股票即時報價\n\n");

    for item in items {
        match (&item.quote, &item.error) {
            (Some(quote), _) => {
                markdown.push_str(&stock_markdown(
                    quote,
                    item.analysis.as_ref(),
                    item.suggestion.as_ref(),
                ));
                markdown.push_str("\n---\n\n");
            }
            (None, Some(error)) => {
                let _ = writeln!(markdown, "## ❌ {}: {}\n", item.stock_symbol, error);
            }
            (None, None) => {}
        }
    }

    markdown
}

/// 將批次查詢結果格式化為跨市場比較表
pub fn compare_markdown(items: &[BatchItem]) -> String {
    let mut markdown = String::from("# 📊 多市場股票比較分析\n\n");
    markdown.push_str("| 代碼 | 名稱 | 市場 | 現價 | 漲跌幅 | 趨勢 | 位置 | 建議 | 風險 |\n");
    markdown.push_str("|------|------|------|------|--------|------|------|------|------|\n");

    for item in items {
        match (&item.quote, &item.error) {
            (Some(quote), _) => {
                let (_, change_percent) = quote.price_change();
                let (trend, position) = match item.analysis.as_ref().and_then(Analysis::indicators)
                {
                    Some(indicators) => (
                        indicators.trend.name(),
                        format!("{:.1}%", indicators.price_position),
                    ),
                    None => ("N/A", "-".to_string()),
                };
                let (action, risk) = match item.suggestion.as_ref() {
                    Some(suggestion) => (suggestion.action, suggestion.risk_level),
                    None => ("-", "-"),
                };

                let _ = writeln!(
                    markdown,
                    "| {} | {} | {} | {:.2} | {:+.2}% | {} | {} | {} | {} |",
                    quote.symbol,
                    quote.name,
                    quote.market_name,
                    quote.last,
                    change_percent,
                    trend,
                    position,
                    action,
                    risk
                );
            }
            (None, Some(error)) => {
                let _ = writeln!(
                    markdown,
                    "| {} | - | - | - | - | ❌ {} | - | - | - |",
                    item.stock_symbol, error
                );
            }
            (None, None) => {}
        }
    }

    markdown.push_str("\n---\n⚠️ **免責聲明**: 以上分析僅供參考，不構成投資建議。\n");
    markdown
}

/// 將任何可序列化的結果輸出為 JSON 文件
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
