//! exchangerate.host 현물환율 클라이언트.
//!
//! 키 없이 사용할 수 있는 무료 환율 API입니다. 두 엔드포인트를
//! 사용합니다:
//! - `/latest`: USD 기준 현재 환율 일괄 조회
//! - `/timeseries`: 한 통화의 일별 환율 시계열 조회
//!
//! 반환 환율은 모두 "1 USD당 통화 단위"의 원시값이며, 호가 방향
//! 정규화는 조립기에서 수행합니다.

use crate::{DataError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use fxlens_core::SpotApiConfig;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

use super::SpotRateProvider;

/// exchangerate.host API 클라이언트.
#[derive(Clone)]
pub struct ExchangeRateHostClient {
    client: reqwest::Client,
    base_url: String,
    latest_timeout: Duration,
    history_timeout: Duration,
}

/// `/latest` 응답.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// `/timeseries` 응답. 날짜 → (코드 → 환율).
#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    #[serde(default)]
    rates: BTreeMap<String, HashMap<String, f64>>,
}

impl ExchangeRateHostClient {
    /// 새로운 클라이언트 생성.
    pub fn new(config: &SpotApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            latest_timeout: config.latest_timeout(),
            history_timeout: config.history_timeout(),
        })
    }
}

#[async_trait]
impl SpotRateProvider for ExchangeRateHostClient {
    async fn latest_rates(&self, codes: &[&str]) -> Result<HashMap<String, f64>> {
        let url = format!("{}/latest", self.base_url);
        let symbols = codes.join(",");

        debug!(symbols = %symbols, "현물환율 일괄 요청");

        let response = self
            .client
            .get(&url)
            .query(&[("base", "USD"), ("symbols", symbols.as_str())])
            .timeout(self.latest_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(DataError::FetchError(format!(
                "현물환율 API 오류: {}",
                status
            )));
        }

        let data: LatestResponse = response.json().await?;
        debug!(count = data.rates.len(), "현물환율 수신");

        Ok(data.rates)
    }

    async fn rate_history(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, f64>> {
        let url = format!("{}/timeseries", self.base_url);
        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();

        debug!(code = code, start = %start_str, end = %end_str, "환율 시계열 요청");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("base", "USD"),
                ("symbols", code),
                ("start_date", start_str.as_str()),
                ("end_date", end_str.as_str()),
            ])
            .timeout(self.history_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(DataError::FetchError(format!(
                "환율 시계열 API 오류 [{}]: {}",
                code, status
            )));
        }

        let data: TimeseriesResponse = response.json().await?;

        // BTreeMap이라 날짜 오름차순이 보장됨. 해당 코드가 없는 날짜는 건너뜀.
        let mut history = BTreeMap::new();
        for (date_str, rates) in data.rates {
            let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                .map_err(|e| DataError::ParseError(format!("날짜 파싱 실패 {}: {}", date_str, e)))?;
            if let Some(rate) = rates.get(code) {
                history.insert(date, *rate);
            }
        }

        debug!(code = code, days = history.len(), "환율 시계열 수신");
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(base_url: String) -> SpotApiConfig {
        SpotApiConfig {
            base_url,
            latest_timeout_secs: 10,
            history_timeout_secs: 15,
        }
    }

    #[tokio::test]
    async fn test_latest_rates_parses_map() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/latest")
            .match_query(mockito::Matcher::UrlEncoded("base".into(), "USD".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"base": "USD", "rates": {"EUR": 0.9210, "JPY": 149.32}}"#)
            .create_async()
            .await;

        let client = ExchangeRateHostClient::new(&test_config(server.url())).unwrap();
        let rates = client.latest_rates(&["EUR", "JPY"]).await.unwrap();

        assert_eq!(rates.get("EUR"), Some(&0.9210));
        assert_eq!(rates.get("JPY"), Some(&149.32));
    }

    #[tokio::test]
    async fn test_rate_history_sorted_and_filtered() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/timeseries")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"rates": {
                    "2025-06-03": {"NOK": 10.61},
                    "2025-06-01": {"NOK": 10.55},
                    "2025-06-02": {}
                }}"#,
            )
            .create_async()
            .await;

        let client = ExchangeRateHostClient::new(&test_config(server.url())).unwrap();
        let history = client
            .rate_history(
                "NOK",
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            )
            .await
            .unwrap();

        // 코드가 빠진 날짜는 건너뛰고, 날짜 오름차순 유지
        let dates: Vec<NaiveDate> = history.keys().copied().collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            ]
        );
        assert_eq!(history.values().copied().collect::<Vec<f64>>(), vec![10.55, 10.61]);
    }

    #[tokio::test]
    async fn test_server_error_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/latest")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let client = ExchangeRateHostClient::new(&test_config(server.url())).unwrap();
        let result = client.latest_rates(&["EUR"]).await;

        assert!(matches!(result, Err(DataError::FetchError(_))));
    }

    #[tokio::test]
    #[ignore] // 실제 API 호출 필요
    async fn test_latest_rates_integration() {
        let client = ExchangeRateHostClient::new(&SpotApiConfig::default()).unwrap();
        let rates = client.latest_rates(&["EUR", "JPY"]).await.unwrap();

        assert!(rates.contains_key("EUR"));
        assert!(rates.contains_key("JPY"));
    }
}
