use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A股代碼含 SH/SZ 前綴時的格式，例如 SH600519、SZ000001
static CHINA_PREFIXED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(SH|SZ)\d{6}$").expect("regex"));

/// 市場別
#[derive(PartialEq, Eq, Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// 台灣股市（上市、上櫃）
    Taiwan,
    /// 中國A股（上海、深圳）
    China,
    /// 美國股市
    US,
}

impl Market {
    pub fn name(&self) -> &'static str {
        match *self {
            Market::Taiwan => "台灣股市",
            Market::China => "中國A股",
            Market::US => "美國股市",
        }
    }

    /// 依股票代碼自動識別所屬市場
    ///
    /// 規則依序為：
    /// 1. 含英文字母：SH/SZ + 6 位數字視為A股，其餘視為美股。
    /// 2. 純數字 4~6 位視為台股。6 位純數字代碼與A股重疊，
    ///    此處刻意先判定為台股，A股需帶 SH/SZ 前綴或明確指定市場。
    /// 3. 其餘一律視為台股。
    pub fn detect(raw_code: &str) -> Market {
        let code = raw_code.trim().to_uppercase();

        if code.chars().any(|c| c.is_ascii_alphabetic()) {
            if CHINA_PREFIXED_CODE.is_match(&code) {
                return Market::China;
            }
            return Market::US;
        }

        if code.chars().all(|c| c.is_ascii_digit()) && (4..=6).contains(&code.len()) {
            return Market::Taiwan;
        }

        Market::Taiwan
    }

}

/// 台股交易市場
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum TaiwanVenue {
    /// 上市
    Tse,
    /// 上櫃
    Otc,
}

impl TaiwanVenue {
    /// 證交所 getStockInfo 的 ex_ch 參數用的市場代號
    pub fn key(&self) -> &'static str {
        match self {
            TaiwanVenue::Tse => "tse",
            TaiwanVenue::Otc => "otc",
        }
    }

    /// 查價時的嘗試順序：上市優先，查無再轉上櫃
    pub fn iterator() -> impl Iterator<Item = Self> {
        [Self::Tse, Self::Otc].iter().copied()
    }
}

/// A股交易所
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum ChinaExchange {
    /// 上海證券交易所
    Shanghai,
    /// 深圳證券交易所
    Shenzhen,
}

impl ChinaExchange {
    /// 依代碼開頭判斷交易所
    ///
    /// 60xxxx 上海主板、688xxx/689xxx 科創板；
    /// 00xxxx 深圳主板、002xxx 中小板、30xxxx 創業板；其餘預設上海。
    pub fn from_code(code: &str) -> ChinaExchange {
        const SHANGHAI_PREFIXES: [&str; 3] = ["60", "688", "689"];
        const SHENZHEN_PREFIXES: [&str; 3] = ["00", "002", "30"];

        if SHANGHAI_PREFIXES.iter().any(|p| code.starts_with(p)) {
            return ChinaExchange::Shanghai;
        }

        if SHENZHEN_PREFIXES.iter().any(|p| code.starts_with(p)) {
            return ChinaExchange::Shenzhen;
        }

        ChinaExchange::Shanghai
    }

    /// 騰訊財經報價接口用的市場前綴
    pub fn prefix(&self) -> &'static str {
        match self {
            ChinaExchange::Shanghai => "sh",
            ChinaExchange::Shenzhen => "sz",
        }
    }
}
