//! # 騰訊財經A股報價採集模組
//!
//! 透過騰訊財經的報價閘道抓取上海、深圳兩市的即時行情，
//! 免費接口、無需 API key。
//!
//! ## 站點資訊
//!
//! - 來源域名：`qt.gtimg.cn`
//! - 回應編碼：GBK
//! - 回應格式：`v_sh600519="51~贵州茅台~600519~..."` 形式的波浪號分隔字串

/// 即時報價採集子模組
pub mod quote;

/// 騰訊財經報價閘道的主機域名
const HOST: &str = "qt.gtimg.cn";

/// 騰訊財經採集器
pub struct Tencent {}
