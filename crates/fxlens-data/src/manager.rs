//! 스냅샷 매니저.
//!
//! 조립기, 영속 저장소, 인메모리 캐시를 조정합니다. 저장소는
//! 선택적입니다: 영속 변형은 사이클마다 저장소에 기록하고, 캐시
//! 전용 변형은 저장소 없이 긴 TTL의 캐시에만 의존합니다.
//!
//! # 동작 흐름
//!
//! - `fetch_cycle`: 조립 → (저장소 있으면) 기록 → 캐시 갱신
//! - `latest`: 캐시 우선, 없으면 저장소의 코드별 최신 뷰
//! - `refresh`: 캐시 무효화 후 강제 재페치 (수동 트리거)

use crate::assembler::SnapshotAssembler;
use crate::cache::SnapshotCache;
use crate::error::Result;
use crate::storage::snapshot::SnapshotStore;
use chrono::Utc;
use fxlens_core::SnapshotSet;
use tracing::{debug, info};

/// 스냅샷 매니저.
pub struct SnapshotManager {
    assembler: SnapshotAssembler,
    store: Option<SnapshotStore>,
    cache: SnapshotCache,
}

impl SnapshotManager {
    /// 새로운 매니저 생성.
    ///
    /// `store`가 None이면 캐시 전용(비영속) 변형으로 동작합니다.
    pub fn new(
        assembler: SnapshotAssembler,
        store: Option<SnapshotStore>,
        cache: SnapshotCache,
    ) -> Self {
        Self {
            assembler,
            store,
            cache,
        }
    }

    /// 한 페치 사이클을 실행합니다.
    ///
    /// 조립은 실패하지 않으며, 저장소 기록 오류만 에러로 전파됩니다.
    pub async fn fetch_cycle(&self) -> Result<SnapshotSet> {
        let result = self.assembler.assemble().await;

        if let Some(store) = &self.store {
            store.save_cycle(&result.snapshot).await?;
            let inserted = store.save_spot_history(&result.history).await?;
            debug!(history_inserted = inserted, "원시 시세 관측치 기록");
        }

        self.cache.store(result.snapshot.clone()).await;

        info!(
            rows = result.snapshot.rows.len(),
            fallback_used = result.snapshot.fallback_used(),
            "사이클 결과 준비 완료"
        );
        Ok(result.snapshot)
    }

    /// 최신 스냅샷을 반환합니다.
    ///
    /// 신선한 캐시가 있으면 그대로, 아니면 저장소의 코드별 최신 뷰를
    /// 읽습니다. 데이터가 한 번도 페치되지 않았으면 None이며, 이는
    /// 표시 계층이 페치를 안내해야 하는 신호입니다.
    pub async fn latest(&self) -> Result<Option<SnapshotSet>> {
        if let Some(set) = self.cache.get().await {
            debug!(fetched_at = %set.fetched_at, "캐시에서 스냅샷 반환");
            return Ok(Some(set));
        }

        if let Some(store) = &self.store {
            let rows = store.latest_rows().await?;
            if rows.is_empty() {
                return Ok(None);
            }

            let fetched_at = store.last_fetched_at().await?.unwrap_or_else(Utc::now);
            debug!(fetched_at = %fetched_at, rows = rows.len(), "저장소에서 스냅샷 반환");

            // 저장소에는 폴백 이벤트가 남지 않음
            return Ok(Some(SnapshotSet {
                fetched_at,
                rows,
                fallbacks: vec![],
            }));
        }

        Ok(None)
    }

    /// 캐시를 무효화하고 새 사이클을 강제합니다.
    pub async fn refresh(&self) -> Result<SnapshotSet> {
        self.cache.invalidate().await;
        self.fetch_cycle().await
    }
}
