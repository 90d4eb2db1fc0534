//! Standalone data collector for the fxlens dashboard.
//!
//! 이 crate는 표시 계층과 독립적으로 FX 데이터를 수집하는 바이너리를
//! 제공합니다:
//! - 페치 사이클 1회 실행 (정책금리 + 현물환율 → 스냅샷 조립/저장)
//! - 저장소의 코드별 최신 스냅샷 조회

pub mod stats;

pub use stats::FetchStats;
