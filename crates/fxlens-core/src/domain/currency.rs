//! 통화 정의.
//!
//! 추적 대상 통화의 정적 유니버스를 제공합니다. 각 통화는 정책금리
//! 시리즈 ID, 호가 방향, 고정환율(페그) 파라미터, 제공자 장애 시
//! 사용할 폴백 상수를 가집니다.
//!
//! GCC 통화는 달러 페그라 정책금리 시리즈가 없으며, 기준금리에
//! 고정 스프레드를 더해 정책금리를 산출합니다.

use serde::{Deserialize, Serialize};

/// 통화 그룹.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyGroup {
    /// 기준 통화 (USD)
    Base,
    /// G10 주요 통화
    #[serde(rename = "G10")]
    G10,
    /// 유럽 비유로권 통화
    Europe,
    /// 신흥국 통화
    #[serde(rename = "EM")]
    Em,
    /// 걸프협력회의 달러 페그 통화
    #[serde(rename = "GCC")]
    Gcc,
}

impl CurrencyGroup {
    /// 저장/표시용 문자열 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencyGroup::Base => "Base",
            CurrencyGroup::G10 => "G10",
            CurrencyGroup::Europe => "Europe",
            CurrencyGroup::Em => "EM",
            CurrencyGroup::Gcc => "GCC",
        }
    }
}

impl std::fmt::Display for CurrencyGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CurrencyGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Base" => Ok(CurrencyGroup::Base),
            "G10" => Ok(CurrencyGroup::G10),
            "Europe" => Ok(CurrencyGroup::Europe),
            "EM" => Ok(CurrencyGroup::Em),
            "GCC" => Ok(CurrencyGroup::Gcc),
            _ => Err(format!("Unknown currency group: {}", s)),
        }
    }
}

/// 호가 방향.
///
/// 제공자는 항상 "1 USD당 통화 단위"로 환율을 반환하지만, 관례상
/// USD/단위로 호가되는 통화쌍(EUR, GBP 등)은 저장 전에 역수를
/// 취해 테이블을 "1 USD당 통화 단위"로 통일합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteConvention {
    /// 1 USD당 통화 단위 (예: JPY, NOK). 그대로 저장
    UnitsPerUsd,
    /// 통화 1단위당 USD (예: EUR, GBP). 역수로 변환 후 저장
    UsdPerUnit,
}

impl QuoteConvention {
    /// 제공자 원시 환율을 "1 USD당 통화 단위"로 정규화합니다.
    pub fn normalize(&self, raw: f64) -> f64 {
        match self {
            QuoteConvention::UnitsPerUsd => raw,
            QuoteConvention::UsdPerUnit => 1.0 / raw,
        }
    }
}

/// 달러 페그 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PegParams {
    /// 고정 환율 (연간 변동 0.01% 미만, 중앙은행 조정 시 수동 갱신)
    pub spot: f64,
    /// 기준금리 대비 정책금리 스프레드 (%p)
    pub spread: f64,
}

/// 제공자 장애 시 사용할 통화별 폴백 상수.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackValues {
    /// 현물환율 폴백
    pub spot: f64,
    /// 정책금리 폴백 (없으면 기준금리 자체를 사용)
    pub policy_rate: Option<f64>,
    /// 1개월 변동성 폴백 (%)
    pub vol: f64,
}

/// 통화 정의.
///
/// 유니버스에 한 번 정의되면 불변입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurrencyDefinition {
    /// ISO 4217 3자리 코드
    pub code: &'static str,
    /// 표시 이름
    pub name: &'static str,
    /// 통화 그룹
    pub group: CurrencyGroup,
    /// 중앙은행 정책금리 FRED 시리즈 ID (None ⇒ 달러 페그)
    pub policy_series: Option<&'static str>,
    /// 호가 방향
    pub quote_convention: QuoteConvention,
    /// 페그 파라미터 (policy_series가 None일 때만 존재)
    pub peg: Option<PegParams>,
    /// 폴백 상수
    pub fallbacks: FallbackValues,
}

impl CurrencyDefinition {
    /// 달러 페그 통화 여부.
    pub fn is_pegged(&self) -> bool {
        self.policy_series.is_none()
    }
}

/// 추적 대상 통화 유니버스.
///
/// 정책금리 시리즈: ECB 예금금리, BOJ 콜금리, BOE 기준금리 등
/// 각 중앙은행의 대표 시리즈. GCC 스프레드는 각 중앙은행이 금리를
/// 조정할 때 수동 갱신합니다.
pub const UNIVERSE: &[CurrencyDefinition] = &[
    CurrencyDefinition {
        code: "EUR",
        name: "Euro",
        group: CurrencyGroup::G10,
        policy_series: Some("ECBDFR"),
        quote_convention: QuoteConvention::UsdPerUnit,
        peg: None,
        fallbacks: FallbackValues { spot: 0.93, policy_rate: Some(2.00), vol: 7.5 },
    },
    CurrencyDefinition {
        code: "JPY",
        name: "Japanese Yen",
        group: CurrencyGroup::G10,
        policy_series: Some("IRSTCI01JPM156N"),
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: None,
        fallbacks: FallbackValues { spot: 150.0, policy_rate: Some(0.25), vol: 9.0 },
    },
    CurrencyDefinition {
        code: "GBP",
        name: "British Pound",
        group: CurrencyGroup::G10,
        policy_series: Some("BOEBR"),
        quote_convention: QuoteConvention::UsdPerUnit,
        peg: None,
        fallbacks: FallbackValues { spot: 0.79, policy_rate: Some(4.00), vol: 7.0 },
    },
    CurrencyDefinition {
        code: "CHF",
        name: "Swiss Franc",
        group: CurrencyGroup::G10,
        policy_series: Some("SNBPOLFCIR"),
        quote_convention: QuoteConvention::UsdPerUnit,
        peg: None,
        fallbacks: FallbackValues { spot: 0.88, policy_rate: Some(0.50), vol: 6.5 },
    },
    CurrencyDefinition {
        code: "AUD",
        name: "Australian Dollar",
        group: CurrencyGroup::G10,
        policy_series: Some("RBATCTR"),
        quote_convention: QuoteConvention::UsdPerUnit,
        peg: None,
        fallbacks: FallbackValues { spot: 1.55, policy_rate: Some(3.85), vol: 9.5 },
    },
    CurrencyDefinition {
        code: "NZD",
        name: "New Zealand Dollar",
        group: CurrencyGroup::G10,
        policy_series: Some("RBNZOCR"),
        quote_convention: QuoteConvention::UsdPerUnit,
        peg: None,
        fallbacks: FallbackValues { spot: 1.70, policy_rate: Some(3.25), vol: 10.0 },
    },
    CurrencyDefinition {
        code: "CAD",
        name: "Canadian Dollar",
        group: CurrencyGroup::G10,
        policy_series: Some("CAPCBEPCBREPO"),
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: None,
        fallbacks: FallbackValues { spot: 1.38, policy_rate: Some(2.75), vol: 5.5 },
    },
    CurrencyDefinition {
        code: "NOK",
        name: "Norwegian Krone",
        group: CurrencyGroup::Europe,
        policy_series: Some("IRSTCI01NOM156N"),
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: None,
        fallbacks: FallbackValues { spot: 10.60, policy_rate: Some(4.25), vol: 9.0 },
    },
    CurrencyDefinition {
        code: "DKK",
        name: "Danish Krone",
        group: CurrencyGroup::Europe,
        policy_series: Some("IRSTCI01DKM156N"),
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: None,
        fallbacks: FallbackValues { spot: 6.95, policy_rate: Some(1.60), vol: 7.5 },
    },
    CurrencyDefinition {
        code: "PLN",
        name: "Polish Zloty",
        group: CurrencyGroup::Europe,
        policy_series: Some("IRSTCI01PLM156N"),
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: None,
        fallbacks: FallbackValues { spot: 3.95, policy_rate: Some(5.00), vol: 9.5 },
    },
    CurrencyDefinition {
        code: "MXN",
        name: "Mexican Peso",
        group: CurrencyGroup::Em,
        policy_series: Some("IRSTCI01MXM156N"),
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: None,
        fallbacks: FallbackValues { spot: 18.50, policy_rate: Some(8.00), vol: 11.0 },
    },
    CurrencyDefinition {
        code: "SAR",
        name: "Saudi Riyal",
        group: CurrencyGroup::Gcc,
        policy_series: None,
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: Some(PegParams { spot: 3.7500, spread: 1.00 }),
        fallbacks: FallbackValues { spot: 3.7500, policy_rate: None, vol: 0.8 },
    },
    CurrencyDefinition {
        code: "AED",
        name: "UAE Dirham",
        group: CurrencyGroup::Gcc,
        policy_series: None,
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: Some(PegParams { spot: 3.6725, spread: -0.10 }),
        fallbacks: FallbackValues { spot: 3.6725, policy_rate: None, vol: 0.8 },
    },
    CurrencyDefinition {
        code: "OMR",
        name: "Omani Rial",
        group: CurrencyGroup::Gcc,
        policy_series: None,
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: Some(PegParams { spot: 0.3850, spread: 0.50 }),
        fallbacks: FallbackValues { spot: 0.3850, policy_rate: None, vol: 0.8 },
    },
    CurrencyDefinition {
        code: "KWD",
        name: "Kuwaiti Dinar",
        group: CurrencyGroup::Gcc,
        policy_series: None,
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: Some(PegParams { spot: 0.3075, spread: 0.00 }),
        fallbacks: FallbackValues { spot: 0.3075, policy_rate: None, vol: 0.8 },
    },
    CurrencyDefinition {
        code: "QAR",
        name: "Qatari Riyal",
        group: CurrencyGroup::Gcc,
        policy_series: None,
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: Some(PegParams { spot: 3.6400, spread: 0.60 }),
        fallbacks: FallbackValues { spot: 3.6400, policy_rate: None, vol: 0.8 },
    },
    CurrencyDefinition {
        code: "BHD",
        name: "Bahraini Dinar",
        group: CurrencyGroup::Gcc,
        policy_series: None,
        quote_convention: QuoteConvention::UnitsPerUsd,
        peg: Some(PegParams { spot: 0.3770, spread: 1.00 }),
        fallbacks: FallbackValues { spot: 0.3770, policy_rate: None, vol: 0.8 },
    },
];

/// 코드로 통화 정의를 조회합니다.
pub fn find_currency(code: &str) -> Option<&'static CurrencyDefinition> {
    UNIVERSE.iter().find(|c| c.code == code)
}
