use std::env;

pub mod analysis;
pub mod batch;
pub mod config;
pub mod crawler;
pub mod declare;
pub mod error;
pub mod logging;
pub mod quote;
pub mod util;
pub mod view;

use crate::declare::Market;

/// 解析 --market 參數的值
fn parse_market(value: &str) -> Option<Market> {
    match value.to_lowercase().as_str() {
        "taiwan" | "tw" => Some(Market::Taiwan),
        "china" | "cn" => Some(Market::China),
        "us" => Some(Market::US),
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let with_analysis = args.iter().any(|arg| arg == "--analyze");
    let as_json = args.iter().any(|arg| arg == "--json");
    let market = args
        .iter()
        .position(|arg| arg == "--market")
        .and_then(|index| args.get(index + 1))
        .and_then(|value| parse_market(value));

    let mut codes: Vec<String> = Vec::with_capacity(args.len());
    let mut skip_next = false;
    for arg in &args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--market" {
            skip_next = true;
            continue;
        }
        if !arg.starts_with("--") {
            codes.push(arg.to_string());
        }
    }

    if codes.is_empty() {
        logging::info_console(
            "用法: stock_quote <股票代碼>... [--analyze] [--json] [--market tw|cn|us]".to_string(),
        );
        return;
    }

    if codes.len() == 1 {
        match crawler::fetch_quote(&codes[0], market).await {
            Ok(stock_quote) => {
                let (analysis, suggestion) = if with_analysis {
                    let analysis = analysis::analyze(&stock_quote);
                    let suggestion = analysis::suggestion::generate(&analysis, &stock_quote);
                    (Some(analysis), Some(suggestion))
                } else {
                    (None, None)
                };

                let output = if as_json {
                    view::to_json(&stock_quote).unwrap_or_else(|why| format!("❌ {}", why))
                } else {
                    view::stock_markdown(&stock_quote, analysis.as_ref(), suggestion.as_ref())
                };

                println!("{}", output);
            }
            Err(why) => {
                println!("❌ 查詢失敗: {}", why);
            }
        }

        return;
    }

    match batch::fetch_batch(&codes, with_analysis).await {
        Ok(items) => {
            let output = if as_json {
                view::to_json(&items).unwrap_or_else(|why| format!("❌ {}", why))
            } else if with_analysis {
                view::compare_markdown(&items)
            } else {
                view::batch_markdown(&items)
            };

            println!("{}", output);
        }
        Err(why) => {
            println!("❌ 查詢失敗: {}", why);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market() {
        assert_eq!(parse_market("tw"), Some(Market::Taiwan));
        assert_eq!(parse_market("CHINA"), Some(Market::China));
        assert_eq!(parse_market("us"), Some(Market::US));
        assert_eq!(parse_market("jp"), None);
    }
}
