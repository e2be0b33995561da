use thiserror::Error;

/// 報價流程的錯誤分類
///
/// 轉接器只會丟出 `NotFound` 與 `Upstream` 兩類；
/// 批次查詢的輸入檢查使用 `InvalidBatch`。
/// 技術分析的異常不屬於此列舉，它以 [`crate::analysis::Analysis::Failed`]
/// 的結果值呈現，不會中斷流程。
#[derive(Error, Debug)]
pub enum QuoteError {
    /// 股票代碼在該市場所有可查詢的交易所都查無資料
    #[error("找不到股票代碼 {0}")]
    NotFound(String),

    /// 上游連線失敗、回應狀態異常或資料無法解析
    #[error("{message}")]
    Upstream {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// 批次查詢的輸入不合法
    #[error("{0}")]
    InvalidBatch(String),
}

impl QuoteError {
    /// 帶有底層原因的上游錯誤
    pub fn upstream(message: impl Into<String>, source: anyhow::Error) -> Self {
        QuoteError::Upstream {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 只有訊息的上游錯誤（例如上游回應了失敗的狀態碼）
    pub fn upstream_message(message: impl Into<String>) -> Self {
        QuoteError::Upstream {
            message: message.into(),
            source: None,
        }
    }
}
