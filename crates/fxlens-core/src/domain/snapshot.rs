//! 스냅샷 행 및 사이클 결과 타입.
//!
//! 한 번의 페치 사이클은 통화당 정확히 한 행을 담은 `SnapshotSet`을
//! 원자적으로 생성합니다. 행은 생성 후 절대 수정되지 않으며, 새
//! 사이클이 완전히 새로운 행 집합을 만듭니다.

use crate::domain::currency::CurrencyGroup;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 과거 캐리/변동성 비율 (1/3/5/10년 룩백).
///
/// 금리/변동성 아카이브에서 추정한 정적 참조 데이터입니다.
/// 런타임에 재계산하지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRatios {
    pub y1: Option<f64>,
    pub y3: Option<f64>,
    pub y5: Option<f64>,
    pub y10: Option<f64>,
}

impl HistoricalRatios {
    const fn new(y1: f64, y3: f64, y5: f64, y10: f64) -> Self {
        Self {
            y1: Some(y1),
            y3: Some(y3),
            y5: Some(y5),
            y10: Some(y10),
        }
    }
}

/// 코드로 과거 캐리/변동성 비율을 조회합니다.
///
/// 테이블에 없는 코드는 네 값 모두 None을 반환합니다.
pub fn historical_ratios(code: &str) -> HistoricalRatios {
    match code {
        "EUR" => HistoricalRatios::new(-0.33, -0.20, -0.14, -0.07),
        "JPY" => HistoricalRatios::new(-0.43, -0.36, -0.26, -0.19),
        "GBP" => HistoricalRatios::new(0.00, -0.06, 0.00, -0.03),
        "CHF" => HistoricalRatios::new(-0.63, -0.40, -0.49, -0.33),
        "AUD" => HistoricalRatios::new(-0.05, -0.03, -0.02, 0.13),
        "NZD" => HistoricalRatios::new(-0.03, 0.05, 0.06, 0.16),
        "CAD" => HistoricalRatios::new(-0.06, 0.00, -0.03, 0.01),
        "NOK" => HistoricalRatios::new(-0.05, -0.03, -0.08, 0.00),
        "DKK" => HistoricalRatios::new(-0.86, -0.53, -0.43, -0.25),
        "PLN" => HistoricalRatios::new(0.08, 0.26, 0.19, 0.11),
        "MXN" => HistoricalRatios::new(0.41, 0.41, 0.38, 0.39),
        "SAR" => HistoricalRatios::new(0.72, 0.52, 0.38, 0.25),
        "AED" => HistoricalRatios::new(-0.08, -0.05, -0.04, -0.02),
        "OMR" => HistoricalRatios::new(0.40, 0.32, 0.27, 0.18),
        "KWD" => HistoricalRatios::new(0.05, 0.08, 0.12, 0.20),
        "QAR" => HistoricalRatios::new(0.52, 0.40, 0.30, 0.20),
        "BHD" => HistoricalRatios::new(0.72, 0.55, 0.42, 0.28),
        _ => HistoricalRatios::default(),
    }
}

/// 폴백으로 대체된 필드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackField {
    /// 기준금리 (사이클당 1회)
    ReferenceRate,
    /// 현물환율
    Spot,
    /// 정책금리
    PolicyRate,
    /// 1개월 변동성
    Volatility,
}

impl std::fmt::Display for FallbackField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FallbackField::ReferenceRate => "reference_rate",
            FallbackField::Spot => "spot",
            FallbackField::PolicyRate => "policy_rate",
            FallbackField::Volatility => "vol_1m",
        };
        f.write_str(s)
    }
}

/// 폴백 발생 기록.
///
/// 어떤 통화의 어떤 필드가 제공자 장애로 폴백 상수로 대체되었는지를
/// 사이클 결과에 남깁니다. 재시도 트리거가 아니라 표시 계층을 위한
/// 가시성 신호입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackEvent {
    /// 통화 코드 (기준금리 폴백은 "USD")
    pub code: String,
    /// 대체된 필드
    pub field: FallbackField,
}

impl FallbackEvent {
    pub fn new(code: impl Into<String>, field: FallbackField) -> Self {
        Self {
            code: code.into(),
            field,
        }
    }
}

/// 통화당 한 행의 스냅샷.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// 통화 코드
    pub code: String,
    /// 표시 이름
    pub name: String,
    /// 통화 그룹
    pub group: CurrencyGroup,
    /// 현물환율 (1 USD당 통화 단위, 소수 4자리)
    pub spot: f64,
    /// 정책금리 (%)
    pub policy_rate: f64,
    /// 기준금리 (페치 시점의 미국 정책금리, %)
    pub reference_rate: f64,
    /// 캐리 = 정책금리 − 기준금리 (소수 2자리)
    pub carry: f64,
    /// 1개월 실현 변동성 (%, 소수 2자리, 데이터 부족 시 None)
    pub vol_1m: Option<f64>,
    /// 현재 캐리/변동성 비율 (변동성이 None이거나 0이면 None)
    pub ratio_now: Option<f64>,
    /// 과거 캐리/변동성 비율 (정적 참조 데이터)
    pub hist: HistoricalRatios,
}

/// 한 페치 사이클의 결과.
///
/// 부수 채널 불리언 대신 폴백 이벤트 목록을 결과 값에 직접 태깅합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSet {
    /// 페치 시각 (UTC)
    pub fetched_at: DateTime<Utc>,
    /// 통화당 한 행
    pub rows: Vec<SnapshotRow>,
    /// 이 사이클에서 발생한 폴백 이벤트
    pub fallbacks: Vec<FallbackEvent>,
}

impl SnapshotSet {
    /// 이 사이클에서 폴백이 하나라도 사용되었는지 여부.
    pub fn fallback_used(&self) -> bool {
        !self.fallbacks.is_empty()
    }

    /// 페치 이후 경과 시간.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_historical_ratios_known_code() {
        let hist = historical_ratios("MXN");
        assert_eq!(hist.y1, Some(0.41));
        assert_eq!(hist.y10, Some(0.39));
    }

    #[test]
    fn test_historical_ratios_unknown_code() {
        let hist = historical_ratios("ZZZ");
        assert_eq!(hist, HistoricalRatios::default());
        assert!(hist.y1.is_none());
    }

    #[test]
    fn test_fallback_used() {
        let mut set = SnapshotSet {
            fetched_at: Utc::now(),
            rows: vec![],
            fallbacks: vec![],
        };
        assert!(!set.fallback_used());

        set.fallbacks
            .push(FallbackEvent::new("EUR", FallbackField::Spot));
        assert!(set.fallback_used());
    }

    #[test]
    fn test_fallback_field_display() {
        assert_eq!(FallbackField::Volatility.to_string(), "vol_1m");
        assert_eq!(FallbackField::ReferenceRate.to_string(), "reference_rate");
    }
}
