//! TTL 기반 인메모리 스냅샷 캐시.
//!
//! 영속 저장소 없이 동작하는 변형에서 사용합니다. 수 시간 단위의
//! 캐시 수명 동안 마지막 사이클 결과를 그대로 재사용하고, 명시적
//! 무효화로 새 사이클을 강제할 수 있습니다.

use fxlens_core::SnapshotSet;
use tokio::sync::RwLock;
use tracing::debug;

/// 인메모리 스냅샷 캐시.
pub struct SnapshotCache {
    inner: RwLock<Option<SnapshotSet>>,
    ttl: chrono::Duration,
}

impl SnapshotCache {
    /// 주어진 TTL로 빈 캐시 생성.
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            inner: RwLock::new(None),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// TTL을 변경합니다.
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        self
    }

    /// 신선한 캐시 항목을 반환합니다.
    ///
    /// 비어 있거나 TTL이 지난 경우 None입니다.
    pub async fn get(&self) -> Option<SnapshotSet> {
        let guard = self.inner.read().await;
        match guard.as_ref() {
            Some(set) if set.age() <= self.ttl => Some(set.clone()),
            Some(set) => {
                debug!(age_secs = set.age().num_seconds(), "캐시 만료");
                None
            }
            None => None,
        }
    }

    /// 새 사이클 결과로 캐시를 교체합니다.
    pub async fn store(&self, set: SnapshotSet) {
        let mut guard = self.inner.write().await;
        *guard = Some(set);
    }

    /// 캐시를 비웁니다 (수동 갱신 트리거).
    pub async fn invalidate(&self) {
        let mut guard = self.inner.write().await;
        if guard.take().is_some() {
            debug!("캐시 무효화");
        }
    }
}
