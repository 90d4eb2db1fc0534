//! Snapshot Assembler.
//!
//! 설정된 각 통화에 대해 정확히 한 행을 조립합니다. 외부 제공자
//! 장애는 절대 사이클을 중단시키지 않습니다. 모든 실패는 통화별
//! 폴백 상수로 강등되고 `FallbackEvent`로 기록됩니다.
//!
//! 통화별 처리 순서:
//! 1. 현물환율 (일괄 조회 결과에서 조회, 호가 방향 정규화)
//! 2. 정책금리 (페그면 기준금리 + 스프레드, 제공자 호출 없음)
//! 3. 캐리 = 정책금리 − 기준금리
//! 4. 변동성 (페그면 구조적 상수, 아니면 과거 시세로 추정)
//! 5. 비율 = 캐리 / 변동성 (변동성 > 0일 때만)
//! 6. 과거 비율 상수 부착

use crate::provider::{PolicyRateProvider, SpotRateProvider};
use crate::storage::snapshot::SpotObservation;
use chrono::{Duration, Utc};
use fxlens_analytics::{carry, carry_vol_ratio, round_dp, RealizedVolEstimator};
use fxlens_core::{
    historical_ratios, AssemblerConfig, CurrencyDefinition, FallbackEvent, FallbackField,
    SnapshotRow, SnapshotSet, UNIVERSE,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 한 사이클의 조립 결과.
///
/// 스냅샷 행 집합과, 재사용을 위해 저장할 원시 과거 시세 관측치를
/// 함께 반환합니다.
#[derive(Debug, Clone)]
pub struct AssemblyResult {
    /// 조립된 스냅샷 (통화당 한 행 + 폴백 이벤트)
    pub snapshot: SnapshotSet,
    /// 원시(정규화 전) 일별 시세 관측치
    pub history: Vec<SpotObservation>,
}

/// 스냅샷 조립기.
pub struct SnapshotAssembler {
    policy: Arc<dyn PolicyRateProvider>,
    spot: Arc<dyn SpotRateProvider>,
    config: AssemblerConfig,
    universe: Vec<CurrencyDefinition>,
    estimator: RealizedVolEstimator,
}

impl SnapshotAssembler {
    /// 새로운 조립기 생성 (기본 통화 유니버스).
    pub fn new(
        policy: Arc<dyn PolicyRateProvider>,
        spot: Arc<dyn SpotRateProvider>,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            policy,
            spot,
            config,
            universe: UNIVERSE.to_vec(),
            estimator: RealizedVolEstimator::new(),
        }
    }

    /// 통화 유니버스를 지정합니다 (테스트용).
    pub fn with_universe(mut self, universe: &[CurrencyDefinition]) -> Self {
        self.universe = universe.to_vec();
        self
    }

    /// 한 페치 사이클을 실행하여 전체 행 집합을 조립합니다.
    ///
    /// 실패하지 않습니다. 개별 제공자 오류는 해당 통화의 해당 필드만
    /// 폴백으로 강등시키고 나머지 통화는 정상 처리됩니다.
    pub async fn assemble(&self) -> AssemblyResult {
        let fetched_at = Utc::now();
        let mut fallbacks: Vec<FallbackEvent> = Vec::new();
        let mut history_out: Vec<SpotObservation> = Vec::new();

        info!(currencies = self.universe.len(), "페치 사이클 시작");

        // 1. 기준금리 (사이클당 1회)
        let reference_rate = match self.policy.latest_rate(&self.config.reference_series).await {
            Ok(Some(rate)) => {
                info!(series = %self.config.reference_series, rate = rate, "기준금리 수신");
                rate
            }
            Ok(None) => {
                warn!(
                    series = %self.config.reference_series,
                    fallback = self.config.reference_rate_fallback,
                    "기준금리 데이터 없음, 폴백 사용"
                );
                fallbacks.push(FallbackEvent::new("USD", FallbackField::ReferenceRate));
                self.config.reference_rate_fallback
            }
            Err(e) => {
                warn!(
                    series = %self.config.reference_series,
                    error = %e,
                    fallback = self.config.reference_rate_fallback,
                    "기준금리 조회 실패, 폴백 사용"
                );
                fallbacks.push(FallbackEvent::new("USD", FallbackField::ReferenceRate));
                self.config.reference_rate_fallback
            }
        };

        // 2. 비페그 통화 현물환율 일괄 조회
        let live_codes: Vec<&str> = self
            .universe
            .iter()
            .filter(|c| !c.is_pegged())
            .map(|c| c.code)
            .collect();

        let spot_rates: HashMap<String, f64> = if live_codes.is_empty() {
            HashMap::new()
        } else {
            match self.spot.latest_rates(&live_codes).await {
                Ok(rates) => {
                    info!(count = rates.len(), "현물환율 수신");
                    rates
                }
                Err(e) => {
                    // 빈 맵을 돌려 통화별 폴백 경로로 처리
                    warn!(error = %e, "현물환율 일괄 조회 실패, 통화별 폴백 사용");
                    HashMap::new()
                }
            }
        };

        // 3. 통화별 행 조립 (순차)
        let mut rows = Vec::with_capacity(self.universe.len());
        for def in &self.universe {
            let row = self
                .assemble_row(def, reference_rate, &spot_rates, &mut fallbacks, &mut history_out)
                .await;
            rows.push(row);
        }

        info!(
            rows = rows.len(),
            fallbacks = fallbacks.len(),
            "페치 사이클 완료"
        );

        AssemblyResult {
            snapshot: SnapshotSet {
                fetched_at,
                rows,
                fallbacks,
            },
            history: history_out,
        }
    }

    /// 한 통화의 스냅샷 행 조립.
    async fn assemble_row(
        &self,
        def: &CurrencyDefinition,
        reference_rate: f64,
        spot_rates: &HashMap<String, f64>,
        fallbacks: &mut Vec<FallbackEvent>,
        history_out: &mut Vec<SpotObservation>,
    ) -> SnapshotRow {
        // 현물환율
        let spot = match def.peg {
            Some(peg) => peg.spot,
            None => match spot_rates.get(def.code) {
                Some(raw) => round_dp(def.quote_convention.normalize(*raw), 4),
                None => {
                    warn!(code = def.code, fallback = def.fallbacks.spot, "현물환율 폴백 사용");
                    fallbacks.push(FallbackEvent::new(def.code, FallbackField::Spot));
                    def.fallbacks.spot
                }
            },
        };

        // 정책금리: 페그 통화는 제공자를 절대 호출하지 않음
        let policy_rate = match def.policy_series {
            None => {
                let spread = def.peg.map(|p| p.spread).unwrap_or(0.0);
                reference_rate + spread
            }
            Some(series) => match self.policy.latest_rate(series).await {
                Ok(Some(rate)) => rate,
                Ok(None) => {
                    let fallback = def.fallbacks.policy_rate.unwrap_or(reference_rate);
                    warn!(code = def.code, series = series, fallback = fallback, "정책금리 데이터 없음, 폴백 사용");
                    fallbacks.push(FallbackEvent::new(def.code, FallbackField::PolicyRate));
                    fallback
                }
                Err(e) => {
                    let fallback = def.fallbacks.policy_rate.unwrap_or(reference_rate);
                    warn!(code = def.code, series = series, error = %e, fallback = fallback, "정책금리 조회 실패, 폴백 사용");
                    fallbacks.push(FallbackEvent::new(def.code, FallbackField::PolicyRate));
                    fallback
                }
            },
        };

        let carry_pct = carry(policy_rate, reference_rate);

        // 변동성: 페그 통화는 추정기를 거치지 않는 구조적 상수
        let vol = match def.peg {
            Some(_) => Some(self.config.pegged_vol),
            None => self.resolve_vol(def, fallbacks, history_out).await,
        };

        let ratio = carry_vol_ratio(carry_pct, vol);
        let hist = historical_ratios(def.code);

        debug!(
            code = def.code,
            spot = spot,
            carry = carry_pct,
            vol = ?vol,
            ratio = ?ratio,
            "행 조립 완료"
        );

        SnapshotRow {
            code: def.code.to_string(),
            name: def.name.to_string(),
            group: def.group,
            spot,
            policy_rate,
            reference_rate,
            carry: carry_pct,
            vol_1m: vol,
            ratio_now: ratio,
            hist,
        }
    }

    /// 과거 시세 기반 1개월 실현 변동성 계산.
    ///
    /// 관측치 부족(`None`)은 유효한 결과이며 폴백 이벤트가 아닙니다.
    /// 제공자 오류나 계산 오류만 통화별 폴백 상수로 강등됩니다.
    async fn resolve_vol(
        &self,
        def: &CurrencyDefinition,
        fallbacks: &mut Vec<FallbackEvent>,
        history_out: &mut Vec<SpotObservation>,
    ) -> Option<f64> {
        let end = Utc::now().date_naive();
        let start = end - Duration::days(self.config.history_window_days);

        match self.spot.rate_history(def.code, start, end).await {
            Ok(history) => {
                // 원시 관측치는 재사용을 위해 그대로 보존
                for (date, raw) in &history {
                    history_out.push(SpotObservation {
                        date: *date,
                        code: def.code.to_string(),
                        spot: *raw,
                    });
                }

                // 0 이하 값은 로그수익률이 정의되지 않으므로 제거 후 정규화
                let prices: Vec<f64> = history
                    .values()
                    .copied()
                    .filter(|raw| *raw > 0.0)
                    .map(|raw| def.quote_convention.normalize(raw))
                    .collect();

                match self.estimator.annualized_vol(&prices) {
                    Ok(vol) => {
                        if vol.is_none() {
                            debug!(code = def.code, observations = prices.len(), "변동성 계산용 관측치 부족");
                        }
                        vol
                    }
                    Err(e) => {
                        warn!(code = def.code, error = %e, fallback = def.fallbacks.vol, "변동성 계산 실패, 폴백 사용");
                        fallbacks.push(FallbackEvent::new(def.code, FallbackField::Volatility));
                        Some(def.fallbacks.vol)
                    }
                }
            }
            Err(e) => {
                warn!(code = def.code, error = %e, fallback = def.fallbacks.vol, "과거 시세 조회 실패, 폴백 사용");
                fallbacks.push(FallbackEvent::new(def.code, FallbackField::Volatility));
                Some(def.fallbacks.vol)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataError, Result};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use fxlens_core::find_currency;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// 정적 테이블 기반 정책금리 목. 요청된 시리즈를 기록합니다.
    #[derive(Default)]
    struct MockPolicyProvider {
        rates: HashMap<String, f64>,
        fail: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PolicyRateProvider for MockPolicyProvider {
        async fn latest_rate(&self, series_id: &str) -> Result<Option<f64>> {
            self.calls.lock().unwrap().push(series_id.to_string());
            if self.fail {
                return Err(DataError::FetchError("connection refused".to_string()));
            }
            Ok(self.rates.get(series_id).copied())
        }
    }

    /// 정적 테이블 기반 현물환율 목.
    #[derive(Default)]
    struct MockSpotProvider {
        rates: HashMap<String, f64>,
        history: BTreeMap<NaiveDate, f64>,
        fail_latest: bool,
        fail_history: bool,
    }

    #[async_trait]
    impl SpotRateProvider for MockSpotProvider {
        async fn latest_rates(&self, _codes: &[&str]) -> Result<HashMap<String, f64>> {
            if self.fail_latest {
                return Err(DataError::FetchError("timeout".to_string()));
            }
            Ok(self.rates.clone())
        }

        async fn rate_history(
            &self,
            _code: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<BTreeMap<NaiveDate, f64>> {
            if self.fail_history {
                return Err(DataError::FetchError("timeout".to_string()));
            }
            Ok(self.history.clone())
        }
    }

    fn sample_history() -> BTreeMap<NaiveDate, f64> {
        [1.00, 1.01, 1.02, 1.01, 1.00, 1.02]
            .iter()
            .enumerate()
            .map(|(i, v)| {
                (
                    NaiveDate::from_ymd_opt(2025, 6, 1 + i as u32).unwrap(),
                    *v,
                )
            })
            .collect()
    }

    fn reference_policy() -> MockPolicyProvider {
        MockPolicyProvider {
            rates: [("FEDFUNDS".to_string(), 3.75)].into_iter().collect(),
            ..Default::default()
        }
    }

    fn assembler(
        policy: Arc<MockPolicyProvider>,
        spot: Arc<MockSpotProvider>,
        universe: &[CurrencyDefinition],
    ) -> SnapshotAssembler {
        SnapshotAssembler::new(policy, spot, AssemblerConfig::default()).with_universe(universe)
    }

    #[tokio::test]
    async fn test_pegged_never_queries_policy_provider() {
        let sar = *find_currency("SAR").unwrap();
        let policy = Arc::new(reference_policy());
        let spot = Arc::new(MockSpotProvider::default());

        let result = assembler(policy.clone(), spot, &[sar]).assemble().await;
        let row = &result.snapshot.rows[0];

        // 기준금리 시리즈만 조회, SAR 시리즈 조회 없음
        assert_eq!(*policy.calls.lock().unwrap(), vec!["FEDFUNDS".to_string()]);

        // 정책금리 = 기준금리 + 스프레드, 변동성은 구조적 상수
        assert_eq!(row.policy_rate, 4.75);
        assert_eq!(row.carry, 1.00);
        assert_eq!(row.spot, 3.7500);
        assert_eq!(row.vol_1m, Some(0.8));
        assert_eq!(row.ratio_now, Some(1.25));
        assert!(result.snapshot.fallbacks.is_empty());
    }

    #[tokio::test]
    async fn test_reference_failure_uses_fallback() {
        let sar = *find_currency("SAR").unwrap();
        let policy = Arc::new(MockPolicyProvider {
            fail: true,
            ..Default::default()
        });
        let spot = Arc::new(MockSpotProvider::default());

        let result = assembler(policy, spot, &[sar]).assemble().await;
        let row = &result.snapshot.rows[0];

        // 폴백 기준금리 3.75 + SAR 스프레드 1.00
        assert_eq!(row.reference_rate, 3.75);
        assert_eq!(row.policy_rate, 4.75);
        assert!(result
            .snapshot
            .fallbacks
            .contains(&FallbackEvent::new("USD", FallbackField::ReferenceRate)));
    }

    #[tokio::test]
    async fn test_live_currency_resolves_and_inverts() {
        let eur = *find_currency("EUR").unwrap();
        let policy = Arc::new(MockPolicyProvider {
            rates: [
                ("FEDFUNDS".to_string(), 3.75),
                ("ECBDFR".to_string(), 2.15),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        let spot = Arc::new(MockSpotProvider {
            rates: [("EUR".to_string(), 0.9210)].into_iter().collect(),
            history: sample_history(),
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur]).assemble().await;
        let row = &result.snapshot.rows[0];

        // USD/단위 호가라 역수 후 소수 4자리
        assert_eq!(row.spot, 1.0858);
        assert_eq!(row.carry, -1.60);

        let vol = row.vol_1m.expect("변동성 존재해야 함");
        assert!(vol > 0.0);
        assert_eq!(row.ratio_now, Some(round_dp(-1.60 / vol, 3)));

        assert!(result.snapshot.fallbacks.is_empty());

        // 원시 관측치는 정규화 없이 그대로 수집됨
        assert_eq!(result.history.len(), 6);
        assert!(result.history.iter().all(|o| o.code == "EUR"));
        assert_eq!(result.history[0].spot, 1.00);
    }

    #[tokio::test]
    async fn test_missing_spot_falls_back() {
        let eur = *find_currency("EUR").unwrap();
        let policy = Arc::new(MockPolicyProvider {
            rates: [
                ("FEDFUNDS".to_string(), 3.75),
                ("ECBDFR".to_string(), 2.15),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        // 일괄 조회 응답에 EUR 없음
        let spot = Arc::new(MockSpotProvider {
            history: sample_history(),
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur]).assemble().await;
        let row = &result.snapshot.rows[0];

        assert_eq!(row.spot, eur.fallbacks.spot);
        assert!(result
            .snapshot
            .fallbacks
            .contains(&FallbackEvent::new("EUR", FallbackField::Spot)));
    }

    #[tokio::test]
    async fn test_policy_missing_falls_back_to_literal() {
        let eur = *find_currency("EUR").unwrap();
        // ECBDFR 시리즈 없음 ⇒ Ok(None)
        let policy = Arc::new(reference_policy());
        let spot = Arc::new(MockSpotProvider {
            rates: [("EUR".to_string(), 0.9210)].into_iter().collect(),
            history: sample_history(),
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur]).assemble().await;
        let row = &result.snapshot.rows[0];

        assert_eq!(row.policy_rate, eur.fallbacks.policy_rate.unwrap());
        assert!(result
            .snapshot
            .fallbacks
            .contains(&FallbackEvent::new("EUR", FallbackField::PolicyRate)));
    }

    #[tokio::test]
    async fn test_policy_falls_back_to_reference_without_literal() {
        let mut eur = *find_currency("EUR").unwrap();
        eur.fallbacks.policy_rate = None;

        let policy = Arc::new(reference_policy());
        let spot = Arc::new(MockSpotProvider {
            rates: [("EUR".to_string(), 0.9210)].into_iter().collect(),
            history: sample_history(),
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur]).assemble().await;
        let row = &result.snapshot.rows[0];

        // 폴백 상수가 없으면 기준금리 자체로 강등 ⇒ 캐리 0
        assert_eq!(row.policy_rate, 3.75);
        assert_eq!(row.carry, 0.00);
    }

    #[tokio::test]
    async fn test_insufficient_history_yields_null_vol_and_ratio() {
        let eur = *find_currency("EUR").unwrap();
        let policy = Arc::new(MockPolicyProvider {
            rates: [
                ("FEDFUNDS".to_string(), 3.75),
                ("ECBDFR".to_string(), 2.15),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        // 관측치 3개뿐
        let history: BTreeMap<NaiveDate, f64> = sample_history().into_iter().take(3).collect();
        let spot = Arc::new(MockSpotProvider {
            rates: [("EUR".to_string(), 0.9210)].into_iter().collect(),
            history,
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur]).assemble().await;
        let row = &result.snapshot.rows[0];

        // 데이터 부족은 null이지 폴백이 아님
        assert_eq!(row.vol_1m, None);
        assert_eq!(row.ratio_now, None);
        assert!(!result
            .snapshot
            .fallbacks
            .iter()
            .any(|f| f.field == FallbackField::Volatility));
    }

    #[tokio::test]
    async fn test_history_failure_falls_back_vol() {
        let eur = *find_currency("EUR").unwrap();
        let policy = Arc::new(MockPolicyProvider {
            rates: [
                ("FEDFUNDS".to_string(), 3.75),
                ("ECBDFR".to_string(), 2.15),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        let spot = Arc::new(MockSpotProvider {
            rates: [("EUR".to_string(), 0.9210)].into_iter().collect(),
            fail_history: true,
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur]).assemble().await;
        let row = &result.snapshot.rows[0];

        assert_eq!(row.vol_1m, Some(eur.fallbacks.vol));
        assert!(result
            .snapshot
            .fallbacks
            .contains(&FallbackEvent::new("EUR", FallbackField::Volatility)));
    }

    #[tokio::test]
    async fn test_single_currency_failure_is_isolated() {
        let eur = *find_currency("EUR").unwrap();
        let jpy = *find_currency("JPY").unwrap();
        let policy = Arc::new(MockPolicyProvider {
            rates: [
                ("FEDFUNDS".to_string(), 3.75),
                ("ECBDFR".to_string(), 2.15),
                ("IRSTCI01JPM156N".to_string(), 0.48),
            ]
            .into_iter()
            .collect(),
            ..Default::default()
        });
        // JPY 환율만 존재, EUR은 누락
        let spot = Arc::new(MockSpotProvider {
            rates: [("JPY".to_string(), 149.32)].into_iter().collect(),
            history: sample_history(),
            ..Default::default()
        });

        let result = assembler(policy, spot, &[eur, jpy]).assemble().await;

        // 두 행 모두 존재, EUR만 현물 폴백
        assert_eq!(result.snapshot.rows.len(), 2);
        let eur_row = &result.snapshot.rows[0];
        let jpy_row = &result.snapshot.rows[1];

        assert_eq!(eur_row.spot, eur.fallbacks.spot);
        assert_eq!(jpy_row.spot, 149.32);

        let spot_fallbacks: Vec<&FallbackEvent> = result
            .snapshot
            .fallbacks
            .iter()
            .filter(|f| f.field == FallbackField::Spot)
            .collect();
        assert_eq!(spot_fallbacks.len(), 1);
        assert_eq!(spot_fallbacks[0].code, "EUR");
    }

    #[tokio::test]
    async fn test_full_universe_produces_one_row_per_currency() {
        // 제공자 전면 장애에서도 통화당 정확히 한 행
        let policy = Arc::new(MockPolicyProvider {
            fail: true,
            ..Default::default()
        });
        let spot = Arc::new(MockSpotProvider {
            fail_latest: true,
            fail_history: true,
            ..Default::default()
        });

        let assembler = SnapshotAssembler::new(policy, spot, AssemblerConfig::default());
        let result = assembler.assemble().await;

        assert_eq!(result.snapshot.rows.len(), UNIVERSE.len());
        assert!(result.snapshot.fallback_used());

        for (def, row) in UNIVERSE.iter().zip(&result.snapshot.rows) {
            assert_eq!(row.code, def.code);
            assert!(row.spot > 0.0);
        }
    }
}
