//! 캐리 및 캐리/변동성 비율 계산.

use crate::round_dp;

/// 캐리 계산 (소수 2자리).
///
/// 캐리 = 정책금리 − 기준금리 (금리차, %p).
pub fn carry(policy_rate: f64, reference_rate: f64) -> f64 {
    round_dp(policy_rate - reference_rate, 2)
}

/// 캐리/변동성 비율 계산 (소수 3자리).
///
/// 변동성이 None이거나 0 이하이면 비율은 정의되지 않습니다.
pub fn carry_vol_ratio(carry: f64, vol: Option<f64>) -> Option<f64> {
    match vol {
        Some(v) if v > 0.0 => Some(round_dp(carry / v, 3)),
        _ => None,
    }
}
