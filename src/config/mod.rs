use std::{env, path::PathBuf, str::FromStr};

use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::declare::Market;

const CONFIG_PATH: &str = "app.json";

/// 全域設定，啟動時讀取一次
pub static SETTINGS: Lazy<App> = Lazy::new(|| App::get().expect("Config error"));

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub pacing: Pacing,
    #[serde(default)]
    pub batch: Batch,
}

const REQUEST_TIMEOUT_SECONDS: &str = "REQUEST_TIMEOUT_SECONDS";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Http {
    /// 單一請求的逾時秒數
    #[serde(default = "Http::default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Http {
    fn default_timeout_seconds() -> u64 {
        10
    }
}

impl Default for Http {
    fn default() -> Self {
        Http {
            timeout_seconds: Self::default_timeout_seconds(),
        }
    }
}

const TAIWAN_PACING_MILLIS: &str = "TAIWAN_PACING_MILLIS";
const CHINA_PACING_MILLIS: &str = "CHINA_PACING_MILLIS";
const US_PACING_MILLIS: &str = "US_PACING_MILLIS";

/// 批次查詢時對各上游的請求間隔
///
/// 證交所有每 5 秒最多 3 個請求的限制，台股的間隔不可低於禮貌值；
/// 騰訊與 Yahoo 未公告上限，仍保留間隔以示禮貌。
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Pacing {
    #[serde(default = "Pacing::default_taiwan_millis")]
    pub taiwan_millis: u64,
    #[serde(default = "Pacing::default_china_millis")]
    pub china_millis: u64,
    #[serde(default = "Pacing::default_us_millis")]
    pub us_millis: u64,
}

impl Pacing {
    fn default_taiwan_millis() -> u64 {
        500
    }

    fn default_china_millis() -> u64 {
        300
    }

    fn default_us_millis() -> u64 {
        300
    }

    pub fn millis_for(&self, market: Market) -> u64 {
        match market {
            Market::Taiwan => self.taiwan_millis,
            Market::China => self.china_millis,
            Market::US => self.us_millis,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            taiwan_millis: Self::default_taiwan_millis(),
            china_millis: Self::default_china_millis(),
            us_millis: Self::default_us_millis(),
        }
    }
}

const MAX_BATCH_SIZE: &str = "MAX_BATCH_SIZE";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Batch {
    /// 一次批次查詢最多接受的股票檔數
    #[serde(default = "Batch::default_max_codes")]
    pub max_codes: usize,
}

impl Batch {
    fn default_max_codes() -> usize {
        20
    }
}

impl Default for Batch {
    fn default() -> Self {
        Batch {
            max_codes: Self::default_max_codes(),
        }
    }
}

impl Default for App {
    fn default() -> Self {
        App {
            http: Default::default(),
            pacing: Default::default(),
            batch: Default::default(),
        }
    }
}

impl App {
    fn get() -> Result<Self, config::ConfigError> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::default().override_with_env())
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Self {
        if let Ok(timeout) = env::var(REQUEST_TIMEOUT_SECONDS) {
            self.http.timeout_seconds =
                u64::from_str(&timeout).unwrap_or(Http::default_timeout_seconds());
        }

        if let Ok(millis) = env::var(TAIWAN_PACING_MILLIS) {
            self.pacing.taiwan_millis =
                u64::from_str(&millis).unwrap_or(Pacing::default_taiwan_millis());
        }

        if let Ok(millis) = env::var(CHINA_PACING_MILLIS) {
            self.pacing.china_millis =
                u64::from_str(&millis).unwrap_or(Pacing::default_china_millis());
        }

        if let Ok(millis) = env::var(US_PACING_MILLIS) {
            self.pacing.us_millis = u64::from_str(&millis).unwrap_or(Pacing::default_us_millis());
        }

        if let Ok(max) = env::var(MAX_BATCH_SIZE) {
            self.batch.max_codes = usize::from_str(&max).unwrap_or(Batch::default_max_codes());
        }

        self
    }
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
