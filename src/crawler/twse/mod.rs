//! # 台灣證券交易所即時報價採集模組
//!
//! 透過證交所基本市況報導網站（MIS）的 getStockInfo 接口抓取
//! 上市與上櫃股票的即時成交價與委買賣五檔。
//!
//! ## 站點資訊
//!
//! - 來源域名：`mis.twse.com.tw`
//! - 流量限制：每 5 秒最多 3 個請求，批次查詢需由呼叫端控制節奏。

/// 即時報價採集子模組
pub mod quote;

/// 證交所基本市況報導網站的主機域名
const HOST: &str = "mis.twse.com.tw";

/// 台灣證券交易所採集器
pub struct Twse {}
