//! 환경 변수 기반 설정 관리

use std::env;
use std::str::FromStr;

/// 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub host: String,
    pub cors_origins: Vec<String>,
    pub store: StoreConfig,
    pub retention: RetentionConfig,
    pub max_code_bytes: usize,
    pub log_level: String,
}

/// 저장소 설정
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `memory` 또는 sqlx SQLite 접속 URL
    pub url: String,
}

impl StoreConfig {
    pub fn is_memory(&self) -> bool {
        self.url.eq_ignore_ascii_case("memory")
    }
}

/// 방 보존 정책 설정
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    pub window_days: i64,
    /// 0이면 주기적 정리 비활성화
    pub sweep_interval_secs: u64,
}

impl Config {
    /// 환경 변수에서 설정 로드
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 테스트용 설정 (메모리 저장소, 정리 타이머 끔)
    pub fn for_testing() -> Self {
        let mut config = Self::from_lookup(|_| None);
        config.store.url = "memory".to_string();
        config.retention.sweep_interval_secs = 0;
        config
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            port: parse_or(lookup("PORT"), 5000),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            cors_origins: lookup("CORS_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            store: StoreConfig {
                url: lookup("STORE_URL")
                    .unwrap_or_else(|| "sqlite://codeshare.db?mode=rwc".to_string()),
            },
            retention: RetentionConfig {
                window_days: parse_or(lookup("RETENTION_DAYS"), 30),
                sweep_interval_secs: parse_or(lookup("SWEEP_INTERVAL_SECS"), 840),
            },
            max_code_bytes: parse_or(lookup("MAX_CODE_BYTES"), 1024 * 1024),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    /// CORS 허용 목록이 와일드카드인지 여부
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
