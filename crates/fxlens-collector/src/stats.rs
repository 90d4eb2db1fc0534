//! 페치 사이클 통계 구조체.

use fxlens_core::SnapshotSet;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 페치 사이클 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchStats {
    /// 조립된 통화 수
    pub currencies: usize,
    /// 폴백으로 대체된 필드 수
    pub fallbacks: usize,
    /// 변동성이 null인 통화 수 (데이터 부족)
    pub vol_missing: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl FetchStats {
    /// 사이클 결과에서 통계 생성
    pub fn from_snapshot(snapshot: &SnapshotSet, elapsed: Duration) -> Self {
        Self {
            currencies: snapshot.rows.len(),
            fallbacks: snapshot.fallbacks.len(),
            vol_missing: snapshot.rows.iter().filter(|r| r.vol_1m.is_none()).count(),
            elapsed,
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            currencies = self.currencies,
            fallbacks = self.fallbacks,
            vol_missing = self.vol_missing,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "사이클 완료"
        );
    }
}
