//! Standalone FX data collector CLI.

use clap::{Parser, Subcommand};
use fxlens_collector::FetchStats;
use fxlens_core::{init_logging, AppConfig, DatabaseConfig, LogConfig, SnapshotRow};
use fxlens_data::{
    ExchangeRateHostClient, FredClient, SnapshotAssembler, SnapshotCache, SnapshotManager,
    SnapshotStore,
};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fxlens-collector")]
#[command(about = "fxlens FX Data Collector", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// 페치 사이클 1회 실행 (조립 → 저장)
    Fetch {
        /// 영속 저장소를 건너뛰고 인메모리 캐시만 사용
        #[arg(long)]
        no_store: bool,
    },

    /// 저장소의 코드별 최신 스냅샷 출력
    Latest,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(LogConfig::new(cli.log_level.clone()))
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("fxlens Data Collector 시작");

    match cli.command {
        Commands::Fetch { no_store } => {
            let config = AppConfig::from_env()?;

            let policy = Arc::new(FredClient::new(&config.fred)?);
            let spot = Arc::new(ExchangeRateHostClient::new(&config.spot)?);
            let assembler = SnapshotAssembler::new(policy, spot, config.assembler.clone());

            let store = if no_store {
                tracing::info!("영속 저장소 비활성화, 캐시 전용 모드");
                None
            } else {
                Some(SnapshotStore::connect(&config.database.url).await?)
            };
            let manager = SnapshotManager::new(
                assembler,
                store,
                SnapshotCache::new(config.cache.ttl()),
            );

            let start = Instant::now();
            let snapshot = manager.fetch_cycle().await?;

            print_rows(&snapshot.rows);
            if snapshot.fallback_used() {
                tracing::warn!(
                    fallbacks = snapshot.fallbacks.len(),
                    "일부 필드가 폴백 상수로 대체되었습니다"
                );
            }

            let stats = FetchStats::from_snapshot(&snapshot, start.elapsed());
            stats.log_summary("페치 사이클");
        }
        Commands::Latest => {
            let config = DatabaseConfig::from_env();
            let store = SnapshotStore::connect(&config.url).await?;

            let rows = store.latest_rows().await?;
            if rows.is_empty() {
                tracing::warn!("아직 데이터가 없습니다. fetch를 먼저 실행하세요");
                return Ok(());
            }

            if let Some(fetched_at) = store.last_fetched_at().await? {
                tracing::info!(fetched_at = %fetched_at, rows = rows.len(), "최신 스냅샷");
            }
            print_rows(&rows);
        }
    }

    tracing::info!("fxlens Data Collector 종료");
    Ok(())
}

/// 통화별 스냅샷 행을 로그로 출력합니다.
fn print_rows(rows: &[SnapshotRow]) {
    for row in rows {
        tracing::info!(
            code = %row.code,
            group = %row.group,
            spot = row.spot,
            policy_rate = row.policy_rate,
            carry = format!("{:+.2}%", row.carry),
            vol_1m = ?row.vol_1m,
            ratio = ?row.ratio_now,
            "통화 스냅샷"
        );
    }
}
