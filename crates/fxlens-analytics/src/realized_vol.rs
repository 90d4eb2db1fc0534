//! 실현 변동성 추정기.
//!
//! 시간순으로 정렬된 일별 시세 시계열에서 로그수익률 표준편차를
//! 구해 연환산 변동성(%)을 계산합니다.
//!
//! # 정책
//!
//! - 관측치 5개 미만 ⇒ `Ok(None)`. 데이터 부족은 에러가 아닙니다.
//! - 모든 가격이 동일 ⇒ `Ok(Some(0.0))`. "변동성 없음"이라는 유효한
//!   답이며 None과 구분됩니다. 이 구분이 하류의 비율 null 여부를
//!   결정합니다.
//! - 0 이하 가격 포함 ⇒ `Err`. 로그가 정의되지 않으므로 호출자가
//!   사전에 걸러야 합니다.

use crate::round_dp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 변동성 계산 오류.
#[derive(Debug, Error)]
pub enum VolError {
    /// 0 이하 가격 관측치
    #[error("0 이하 가격 관측치: index {index}, value {value}")]
    NonPositivePrice { index: usize, value: f64 },
}

/// 변동성 계산 결과 타입.
pub type VolResult<T> = Result<T, VolError>;

/// 실현 변동성 파라미터.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RealizedVolParams {
    /// 최소 관측치 수 (기본: 5)
    pub min_observations: usize,
    /// 연환산 거래일 수 (기본: 252)
    pub annualization_days: u32,
}

impl Default for RealizedVolParams {
    fn default() -> Self {
        Self {
            min_observations: 5,
            annualization_days: 252,
        }
    }
}

/// 실현 변동성 추정기.
#[derive(Debug, Default)]
pub struct RealizedVolEstimator {
    params: RealizedVolParams,
}

impl RealizedVolEstimator {
    /// 기본 파라미터로 추정기 생성.
    pub fn new() -> Self {
        Self::default()
    }

    /// 파라미터를 지정하여 추정기 생성.
    pub fn with_params(params: RealizedVolParams) -> Self {
        Self { params }
    }

    /// 연환산 실현 변동성 계산 (%).
    ///
    /// 1기간 로그수익률의 표본 표준편차(Bessel 보정, 수익률 개수 − 1로
    /// 나눔)에 `sqrt(연환산일수) × 100`을 곱하고 소수 2자리로
    /// 반올림합니다.
    ///
    /// # 인자
    /// * `prices` - 시간순(과거→현재) 양수 가격 시계열
    ///
    /// # 반환
    /// - `Ok(Some(vol))`: 연환산 변동성 (%)
    /// - `Ok(None)`: 관측치 부족
    /// - `Err(...)`: 0 이하 가격 포함
    pub fn annualized_vol(&self, prices: &[f64]) -> VolResult<Option<f64>> {
        if let Some(index) = prices.iter().position(|p| *p <= 0.0) {
            return Err(VolError::NonPositivePrice {
                index,
                value: prices[index],
            });
        }

        if prices.len() < self.params.min_observations {
            return Ok(None);
        }

        let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();

        let mean = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
            / (returns.len() - 1) as f64;

        let daily_std = variance.sqrt();
        let annualized = daily_std * (self.params.annualization_days as f64).sqrt() * 100.0;

        Ok(Some(round_dp(annualized, 2)))
    }
}
