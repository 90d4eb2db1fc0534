//! FRED (St. Louis Fed) 정책금리 클라이언트.
//!
//! `series/observations` 엔드포인트에서 시리즈별 최신 관측치 1건을
//! 내림차순으로 조회합니다. FRED는 결측 관측치를 `"."` 문자열로
//! 표현하므로 이를 "데이터 없음"으로 매핑합니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use fxlens_core::FredConfig;
//! use fxlens_data::provider::{FredClient, PolicyRateProvider};
//!
//! let client = FredClient::new(&config.fred)?;
//! let rate = client.latest_rate("FEDFUNDS").await?;
//! ```

use crate::{DataError, Result};
use async_trait::async_trait;
use fxlens_core::FredConfig;
use serde::Deserialize;
use tracing::debug;

use super::PolicyRateProvider;

/// FRED API 클라이언트.
#[derive(Clone)]
pub struct FredClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    observation_start: String,
}

/// API 응답 래퍼.
#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

/// 관측치 1건.
#[derive(Debug, Deserialize)]
struct RawObservation {
    #[serde(default)]
    date: String,
    /// 수치 문자열, 결측이면 "."
    value: String,
}

impl FredClient {
    /// 새로운 FRED 클라이언트 생성.
    pub fn new(config: &FredConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            observation_start: config.observation_start.clone(),
        })
    }

    /// 환경변수 `FRED_API_KEY`에서 키를 읽어 클라이언트 생성 (폴백용).
    ///
    /// 가능하면 명시적 설정으로 `new()`를 사용하세요.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("FRED_API_KEY").ok()?;
        Self::new(&FredConfig {
            api_key,
            base_url: "https://api.stlouisfed.org".to_string(),
            observation_start: "2020-01-01".to_string(),
            timeout_secs: 10,
        })
        .ok()
    }
}

#[async_trait]
impl PolicyRateProvider for FredClient {
    async fn latest_rate(&self, series_id: &str) -> Result<Option<f64>> {
        let url = format!("{}/fred/series/observations", self.base_url);

        debug!(series_id = series_id, "FRED 관측치 요청");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("sort_order", "desc"),
                ("limit", "1"),
                ("observation_start", self.observation_start.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DataError::FetchError(format!(
                "FRED API 오류 [{}]: {} - {}",
                series_id, status, body
            )));
        }

        let data: ObservationsResponse = response.json().await?;

        // 최신 관측치가 결측(".")이면 데이터 없음으로 처리
        let rate = data
            .observations
            .first()
            .filter(|obs| obs.value != ".")
            .map(|obs| {
                obs.value.parse::<f64>().map_err(|_| {
                    DataError::ParseError(format!(
                        "FRED 관측치 파싱 실패 [{}]: {:?} ({})",
                        series_id, obs.value, obs.date
                    ))
                })
            })
            .transpose()?;

        debug!(series_id = series_id, rate = ?rate, "FRED 관측치 수신");
        Ok(rate)
    }
}
