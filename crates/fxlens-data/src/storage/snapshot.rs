//! SQLite 스냅샷 저장소.
//!
//! 두 테이블을 관리합니다:
//! - `fx_snapshots`: append-only 스냅샷 히스토리. 사이클당 전체 행
//!   집합을 페치 타임스탬프로 태깅해 단일 트랜잭션으로 기록합니다.
//!   기존 행은 절대 수정/삭제하지 않습니다.
//! - `spot_history`: 일별 원시 시세 관측치. (date, code) 유니크 제약이
//!   있으며 이미 본 날짜/코드 쌍의 삽입은 조용히 무시됩니다.
//!
//! "최신" 뷰는 별도 current 테이블 없이 코드별 최대 타임스탬프 조인으로
//! 구현합니다.

use crate::error::{DataError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use fxlens_core::{HistoricalRatios, SnapshotRow, SnapshotSet};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tracing::{debug, info};

/// 일별 원시 시세 관측치.
///
/// 호가 방향 정규화 전의 제공자 원시값을 그대로 보존합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotObservation {
    /// 관측일
    pub date: NaiveDate,
    /// 통화 코드
    pub code: String,
    /// 원시 환율 (1 USD당 통화 단위)
    pub spot: f64,
}

/// 스냅샷 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
struct SnapshotRecord {
    code: String,
    name: String,
    grp: String,
    spot: f64,
    policy_rate: f64,
    fed_rate: f64,
    carry: f64,
    vol_1m: Option<f64>,
    ratio_now: Option<f64>,
    hist_1y: Option<f64>,
    hist_3y: Option<f64>,
    hist_5y: Option<f64>,
    hist_10y: Option<f64>,
}

impl SnapshotRecord {
    /// 도메인 행으로 변환.
    fn to_row(&self) -> Result<SnapshotRow> {
        let group = self
            .grp
            .parse()
            .map_err(|e: String| DataError::ParseError(e))?;

        Ok(SnapshotRow {
            code: self.code.clone(),
            name: self.name.clone(),
            group,
            spot: self.spot,
            policy_rate: self.policy_rate,
            reference_rate: self.fed_rate,
            carry: self.carry,
            vol_1m: self.vol_1m,
            ratio_now: self.ratio_now,
            hist: HistoricalRatios {
                y1: self.hist_1y,
                y3: self.hist_3y,
                y5: self.hist_5y,
                y10: self.hist_10y,
            },
        })
    }
}

/// 스냅샷 저장소.
#[derive(Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// 기존 연결 풀로 저장소 생성.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// URL로 연결하고 스키마를 초기화합니다.
    ///
    /// 단일 프로세스 순차 실행이라 연결 1개로 충분합니다.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let store = Self::new(pool);
        store.init_schema().await?;
        Ok(store)
    }

    /// 테이블이 없으면 생성합니다.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS fx_snapshots (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                fetched_at  TEXT NOT NULL,
                code        TEXT NOT NULL,
                name        TEXT NOT NULL,
                grp         TEXT NOT NULL,
                spot        REAL NOT NULL,
                policy_rate REAL NOT NULL,
                fed_rate    REAL NOT NULL,
                carry       REAL NOT NULL,
                vol_1m      REAL,
                ratio_now   REAL,
                hist_1y     REAL,
                hist_3y     REAL,
                hist_5y     REAL,
                hist_10y    REAL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS spot_history (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                date  TEXT NOT NULL,
                code  TEXT NOT NULL,
                spot  REAL,
                UNIQUE(date, code)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("스키마 초기화 완료");
        Ok(())
    }

    /// 한 사이클의 전체 행 집합을 단일 트랜잭션으로 기록합니다.
    ///
    /// 읽는 쪽이 중간 상태의 사이클을 보지 않도록 전부 아니면 전무로
    /// 커밋됩니다.
    pub async fn save_cycle(&self, snapshot: &SnapshotSet) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for row in &snapshot.rows {
            sqlx::query(
                r#"
                INSERT INTO fx_snapshots
                    (fetched_at, code, name, grp, spot, policy_rate, fed_rate, carry,
                     vol_1m, ratio_now, hist_1y, hist_3y, hist_5y, hist_10y)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(snapshot.fetched_at)
            .bind(&row.code)
            .bind(&row.name)
            .bind(row.group.as_str())
            .bind(row.spot)
            .bind(row.policy_rate)
            .bind(row.reference_rate)
            .bind(row.carry)
            .bind(row.vol_1m)
            .bind(row.ratio_now)
            .bind(row.hist.y1)
            .bind(row.hist.y3)
            .bind(row.hist.y5)
            .bind(row.hist.y10)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            rows = snapshot.rows.len(),
            fetched_at = %snapshot.fetched_at,
            "스냅샷 저장 완료"
        );
        Ok(())
    }

    /// 원시 시세 관측치를 저장합니다.
    ///
    /// (date, code) 쌍이 이미 있으면 조용히 무시됩니다. 새로 삽입된
    /// 행 수를 반환합니다.
    pub async fn save_spot_history(&self, observations: &[SpotObservation]) -> Result<u64> {
        if observations.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for obs in observations {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO spot_history (date, code, spot) VALUES (?, ?, ?)",
            )
            .bind(obs.date)
            .bind(&obs.code)
            .bind(obs.spot)
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;

        debug!(
            observations = observations.len(),
            inserted = inserted,
            "시세 관측치 저장"
        );
        Ok(inserted)
    }

    /// 코드별 최신 행만 반환합니다.
    ///
    /// 코드별 최대 fetched_at 조인. 같은 코드에 T1 < T2 두 사이클이
    /// 있으면 T2 행만 나옵니다.
    pub async fn latest_rows(&self) -> Result<Vec<SnapshotRow>> {
        let records: Vec<SnapshotRecord> = sqlx::query_as(
            r#"
            SELECT s.code, s.name, s.grp, s.spot, s.policy_rate,
                   s.fed_rate, s.carry, s.vol_1m, s.ratio_now,
                   s.hist_1y, s.hist_3y, s.hist_5y, s.hist_10y
            FROM fx_snapshots s
            INNER JOIN (
                SELECT code, MAX(fetched_at) AS latest
                FROM fx_snapshots
                GROUP BY code
            ) m ON s.code = m.code AND s.fetched_at = m.latest
            ORDER BY s.grp, s.carry DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        records.iter().map(|r| r.to_row()).collect()
    }

    /// 마지막 페치 시각. 데이터가 한 번도 없으면 None.
    pub async fn last_fetched_at(&self) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<DateTime<Utc>> =
            sqlx::query_scalar("SELECT MAX(fetched_at) FROM fx_snapshots")
                .fetch_one(&self.pool)
                .await?;

        Ok(latest)
    }
}
