//! 환경변수 기반 설정 관리.
//!
//! 전역 가변 상태 대신 명시적으로 구성된 설정 값을 각 컴포넌트에
//! 전달합니다. API 자격증명과 폴백 정책이 모두 여기에 모입니다.

use crate::error::{FxError, FxResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 애플리케이션 전체 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// 정책금리 제공자 (FRED) 설정
    pub fred: FredConfig,
    /// 현물환율 제공자 설정
    pub spot: SpotApiConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인메모리 캐시 설정
    pub cache: CacheConfig,
    /// 스냅샷 조립 설정
    pub assembler: AssemblerConfig,
}

/// FRED API 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FredConfig {
    /// API 키 (https://fred.stlouisfed.org 무료 발급)
    pub api_key: String,
    /// API Base URL
    pub base_url: String,
    /// 관측치 조회 시작일 (YYYY-MM-DD)
    pub observation_start: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl FredConfig {
    /// 요청 타임아웃을 Duration으로 반환합니다.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 현물환율 API (exchangerate.host) 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpotApiConfig {
    /// API Base URL
    pub base_url: String,
    /// 현재가 요청 타임아웃 (초)
    pub latest_timeout_secs: u64,
    /// 과거 시계열 요청 타임아웃 (초)
    pub history_timeout_secs: u64,
}

impl Default for SpotApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.exchangerate.host".to_string(),
            latest_timeout_secs: 10,
            history_timeout_secs: 15,
        }
    }
}

impl SpotApiConfig {
    /// 현재가 요청 타임아웃을 Duration으로 반환합니다.
    pub fn latest_timeout(&self) -> Duration {
        Duration::from_secs(self.latest_timeout_secs)
    }

    /// 시계열 요청 타임아웃을 Duration으로 반환합니다.
    pub fn history_timeout(&self) -> Duration {
        Duration::from_secs(self.history_timeout_secs)
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite 연결 URL
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:fx_data.db?mode=rwc".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// 환경변수에서 데이터베이스 설정만 로드합니다.
    ///
    /// 저장소 조회 경로는 API 자격증명이 필요 없으므로 전체 설정
    /// 로드 없이 사용합니다.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            url: env_var_or("FXLENS_DATABASE_URL", "sqlite:fx_data.db?mode=rwc"),
        }
    }
}

/// 인메모리 스냅샷 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// 캐시 유효 기간 (초)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        // 수 시간 단위 캐시. 수동 갱신으로 언제든 무효화 가능.
        Self { ttl_secs: 6 * 3600 }
    }
}

impl CacheConfig {
    /// 캐시 유효 기간을 Duration으로 반환합니다.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// 스냅샷 조립 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssemblerConfig {
    /// 기준금리 시리즈 ID (미국 연방기금금리)
    pub reference_series: String,
    /// 기준금리 조회 실패 시 폴백 값 (%)
    pub reference_rate_fallback: f64,
    /// 고정환율 통화의 구조적 변동성 상수 (%)
    pub pegged_vol: f64,
    /// 변동성 계산용 과거 시세 조회 기간 (달력일)
    pub history_window_days: i64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            reference_series: "FEDFUNDS".to_string(),
            reference_rate_fallback: 3.75,
            pegged_vol: 0.8,
            history_window_days: 35,
        }
    }
}

impl AppConfig {
    /// 환경변수에서 설정을 로드합니다.
    ///
    /// `FRED_API_KEY`는 필수입니다. 나머지는 기본값이 있습니다.
    pub fn from_env() -> FxResult<Self> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("FRED_API_KEY").map_err(|_| {
            FxError::Config("FRED_API_KEY 환경변수가 설정되지 않았습니다".to_string())
        })?;

        Ok(Self {
            fred: FredConfig {
                api_key,
                base_url: env_var_or("FRED_BASE_URL", "https://api.stlouisfed.org"),
                observation_start: env_var_or("FRED_OBSERVATION_START", "2020-01-01"),
                timeout_secs: env_var_parse("FRED_TIMEOUT_SECS", 10),
            },
            spot: SpotApiConfig {
                base_url: env_var_or("SPOT_BASE_URL", "https://api.exchangerate.host"),
                latest_timeout_secs: env_var_parse("SPOT_LATEST_TIMEOUT_SECS", 10),
                history_timeout_secs: env_var_parse("SPOT_HISTORY_TIMEOUT_SECS", 15),
            },
            database: DatabaseConfig {
                url: env_var_or("FXLENS_DATABASE_URL", "sqlite:fx_data.db?mode=rwc"),
            },
            cache: CacheConfig {
                ttl_secs: env_var_parse("FXLENS_CACHE_TTL_SECS", 6 * 3600),
            },
            assembler: AssemblerConfig {
                reference_series: env_var_or("FXLENS_REFERENCE_SERIES", "FEDFUNDS"),
                reference_rate_fallback: env_var_parse("FXLENS_REFERENCE_FALLBACK", 3.75),
                pegged_vol: env_var_parse("FXLENS_PEGGED_VOL", 0.8),
                history_window_days: env_var_parse("FXLENS_HISTORY_WINDOW_DAYS", 35),
            },
        })
    }
}

/// 환경변수에서 문자열 값 로드 (없으면 기본값 사용).
fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용).
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
