//! # Yahoo 財經美股報價採集模組
//!
//! 透過 Yahoo Finance v8 chart API 抓取美股即時行情。
//!
//! ## 站點資訊
//!
//! - 來源域名：`query1.finance.yahoo.com`
//! - 無委買賣五檔資料，盤前盤後可能無數據。

/// 即時報價採集子模組
pub mod quote;

/// Yahoo Finance API 的主機域名
const HOST: &str = "query1.finance.yahoo.com";

/// Yahoo 財經採集器
pub struct Yahoo {}
