//! # Simulation モジュール
//!
//! 衝突リスク推定の中核となるモンテカルロ試行ループを提供します。
//!
//! 自船は原点からx軸方向に速さ1で航行し、実行中その状態は変わりません。
//! 各試行では他船を `num_other_ships` 隻ランダムに生成し、最接近距離が
//! 閾値を下回る他船が1隻でもあればその試行を「衝突」と判定します。
//! 最終的な推定値は衝突試行数 / 総試行数です。
//!
//! ## 処理順序
//!
//! 1. **設定検証**: 試行開始前に一度だけ実行（以降エラーは発生しない）
//! 2. **乱数ストリーム準備**: 実行シード（未指定なら一度だけ生成）からワーカーごとのストリームを用意
//! 3. **試行ループ**: ワーカーごとに割り当てられた試行を逐次実行
//! 4. **集計**: ワーカーごとの部分和を合算して確率を算出
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use crate::scenario::{ExecutionConfig, SimulationConfig};
//! use crate::simulation::RiskEstimator;
//!
//! let estimator = RiskEstimator::new(SimulationConfig::default(), ExecutionConfig::default(), 1)?;
//! let report = estimator.run()?;
//! println!("Estimated probability of collision: {:.2}%", report.percentage());
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use crate::error::Result;
use crate::models::{ScenarioSampler, ShipState};
use crate::scenario::{ExecutionConfig, SimulationConfig};

/// 逐次実行で衝突確率を推定
///
/// 呼び出し側が所有する乱数生成器を全試行で使い続けます。
/// `num_trials` が正でない場合などはInvalidConfigを返し、値は返しません。
pub fn estimate_crossing_risk<R: Rng>(config: &SimulationConfig, rng: &mut R) -> Result<f64> {
    config.validate()?;

    let trials = config.trials();
    let mut sampler = ScenarioSampler::new(rng);
    let collisions = count_trial_collisions(config, &mut sampler, trials, |_, _| {});

    Ok(collisions as f64 / trials as f64)
}

/// 試行ループ本体
///
/// `trials` 回の試行を逐次実行し、衝突試行数を返します。
/// `on_trial` は各試行の後に（完了試行数, 累計衝突数）で呼ばれます。
pub fn count_trial_collisions<R, F>(
    config: &SimulationConfig,
    sampler: &mut ScenarioSampler<R>,
    trials: u64,
    mut on_trial: F,
) -> u64
where
    R: Rng,
    F: FnMut(u64, u64),
{
    let primary = ShipState::primary();
    let mut collisions = 0u64;

    for trial in 0..trials {
        if run_trial(&primary, config, sampler) {
            collisions += 1;
        }
        on_trial(trial + 1, collisions);
    }

    collisions
}

/// 衝突判定: 最接近距離が閾値を下回るか
pub fn collides(primary: &ShipState, other: &ShipState, threshold_distance: f64) -> bool {
    let distance = primary.cpa_distance(other);
    trace!("CPA = {:.4}", distance);
    distance < threshold_distance
}

/// 事前に生成した1試行分の他船に対して衝突判定
///
/// 閾値未満の他船が見つかった時点で残りは評価しません。
pub fn trial_collides(primary: &ShipState, others: &[ShipState], threshold_distance: f64) -> bool {
    others
        .iter()
        .any(|other| collides(primary, other, threshold_distance))
}

/// 固定された試行群に対する衝突試行数
pub fn count_collisions(primary: &ShipState, trials: &[Vec<ShipState>], threshold_distance: f64) -> u64 {
    trials
        .iter()
        .filter(|others| trial_collides(primary, others, threshold_distance))
        .fold(0, |count, _| count + 1)
}

/// 1試行を実行（他船は評価の直前に1隻ずつ生成）
fn run_trial<R: Rng>(primary: &ShipState, config: &SimulationConfig, sampler: &mut ScenarioSampler<R>) -> bool {
    (0..config.other_ships()).any(|_| {
        let other = sampler.sample_ship(config.area_size, config.max_speed);
        collides(primary, &other, config.threshold_distance)
    })
}

/// 推定結果
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    pub num_trials: u64,
    pub collisions: u64,
    /// 衝突確率 [0, 1]
    pub probability: f64,
    /// 二項分布の標準誤差
    pub std_error: f64,
    pub seed: u64,
    pub workers: usize,
    pub elapsed: Duration,
}

impl RiskReport {
    pub fn new(num_trials: u64, collisions: u64, seed: u64, workers: usize, elapsed: Duration) -> Self {
        let n = num_trials as f64;
        let probability = collisions as f64 / n;
        let std_error = (probability * (1.0 - probability) / n).sqrt();

        Self {
            num_trials,
            collisions,
            probability,
            std_error,
            seed,
            workers,
            elapsed,
        }
    }

    /// 百分率表記の確率
    pub fn percentage(&self) -> f64 {
        self.probability * 100.0
    }
}

/// モンテカルロ推定エンジン
pub struct RiskEstimator {
    pub config: SimulationConfig,
    pub execution: ExecutionConfig,
    pub verbose_level: u8,
}

impl RiskEstimator {
    /// 設定を検証してエンジンを作成
    pub fn new(config: SimulationConfig, execution: ExecutionConfig, verbose_level: u8) -> Result<Self> {
        config.validate()?;
        execution.validate()?;

        Ok(Self {
            config,
            execution,
            verbose_level,
        })
    }

    pub fn run(&self) -> Result<RiskReport> {
        let start = Instant::now();
        let seed = self.execution.seed.unwrap_or_else(|| rand::rng().random());
        let total = self.config.trials();
        let workers = self
            .execution
            .workers
            .min(usize::try_from(total).unwrap_or(usize::MAX))
            .max(1);

        info!("=== シミュレーション実行開始 ===");
        if self.verbose_level > 0 {
            info!(
                "試行数: {}, 他船数: {}, 閾値: {:.2}, シード: {}, ワーカー: {}",
                total, self.config.num_other_ships, self.config.threshold_distance, seed, workers
            );
        }

        let collisions = if workers == 1 {
            self.run_worker(0, seed, total)
        } else {
            self.run_parallel(seed, workers, total)
        };

        let report = RiskReport::new(total, collisions, seed, workers, start.elapsed());

        info!("=== シミュレーション完了 ===");
        info!("衝突試行数: {}/{}", report.collisions, report.num_trials);
        if self.verbose_level > 0 {
            info!("実行時間: {:.4}秒", report.elapsed.as_secs_f64());
        }

        Ok(report)
    }

    /// ワーカー専用の乱数ストリーム
    ///
    /// 同じシードでもストリーム番号が異なれば互いに独立した系列になる。
    fn worker_rng(seed: u64, index: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index as u64);
        rng
    }

    /// `total` を `workers` 個にできるだけ均等に分割した際の `index` 番目の試行数
    fn trials_for_worker(total: u64, workers: usize, index: usize) -> u64 {
        let workers = workers as u64;
        let index = index as u64;
        total / workers + u64::from(index < total % workers)
    }

    fn run_worker(&self, index: usize, seed: u64, trials: u64) -> u64 {
        debug!("ワーカー{}: {}試行 (ストリーム: {})", index, trials, index);

        let mut sampler = ScenarioSampler::new(Self::worker_rng(seed, index));
        let progress_every = (trials / 10).max(1);
        let verbose = self.verbose_level > 0;

        count_trial_collisions(&self.config, &mut sampler, trials, |done, collisions| {
            if verbose && done % progress_every == 0 {
                let progress = done as f64 / trials as f64 * 100.0;
                info!(
                    "ワーカー{} 進行状況: {:.0}% ({}/{}, 衝突: {})",
                    index, progress, done, trials, collisions
                );
            }
        })
    }

    fn run_parallel(&self, seed: u64, workers: usize, total: u64) -> u64 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|index| {
                    let trials = Self::trials_for_worker(total, workers, index);
                    scope.spawn(move || self.run_worker(index, seed, trials))
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|payload| std::panic::resume_unwind(payload)))
                .sum()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use crate::models::common::Vector2;

    fn small_config(threshold_distance: f64) -> SimulationConfig {
        SimulationConfig {
            num_trials: 2_000,
            threshold_distance,
            ..SimulationConfig::default()
        }
    }

    fn seeded(seed: u64, workers: usize) -> ExecutionConfig {
        ExecutionConfig { seed: Some(seed), workers }
    }

    #[test]
    fn test_no_other_ships_means_no_risk() {
        for trials in [1, 10, 1_000] {
            let config = SimulationConfig {
                num_trials: trials,
                num_other_ships: 0,
                ..SimulationConfig::default()
            };
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            assert_eq!(estimate_crossing_risk(&config, &mut rng).unwrap(), 0.0);
        }
    }

    #[test]
    fn test_invalid_trials_is_an_error() {
        for trials in [0, -10] {
            let config = SimulationConfig { num_trials: trials, ..SimulationConfig::default() };
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let err = estimate_crossing_risk(&config, &mut rng).unwrap_err();
            assert!(matches!(err, RiskError::InvalidConfig { parameter: "num_trials", .. }));

            let err = RiskEstimator::new(config, ExecutionConfig::default(), 0).err().unwrap();
            assert_eq!(err.parameter(), Some("num_trials"));
        }
    }

    #[test]
    fn test_probability_is_within_unit_interval() {
        for (seed, threshold) in [(1, 0.2), (2, 0.5), (3, 2.0), (4, 10.0)] {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let p = estimate_crossing_risk(&small_config(threshold), &mut rng).unwrap();
            assert!((0.0..=1.0).contains(&p), "p = {}", p);
        }
    }

    #[test]
    fn test_zero_threshold_never_collides() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert_eq!(estimate_crossing_risk(&small_config(0.0), &mut rng).unwrap(), 0.0);
    }

    #[test]
    fn test_threshold_beyond_area_always_collides() {
        // 最接近距離は現在距離 (≤ 25√2) を超えない
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        assert_eq!(estimate_crossing_risk(&small_config(100.0), &mut rng).unwrap(), 1.0);
    }

    #[test]
    fn test_fractional_result() {
        let config = SimulationConfig { num_trials: 4_000, ..SimulationConfig::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let p = estimate_crossing_risk(&config, &mut rng).unwrap();
        assert!(p > 0.0 && p < 1.0, "p = {}", p);
    }

    #[test]
    fn test_trial_collides_short_circuits_on_first_hit() {
        let primary = ShipState::primary();
        let near = ShipState::new(Vector2::new(5.0, 0.0), Vector2::ZERO);
        let far = ShipState::new(Vector2::new(0.0, 20.0), Vector2::new(1.0, 0.0));

        assert!(trial_collides(&primary, &[far, near], 0.2));
        assert!(!trial_collides(&primary, &[far], 0.2));
        assert!(!trial_collides(&primary, &[], 0.2));
    }

    #[test]
    fn test_lazy_trial_stops_sampling_after_first_hit() {
        // 閾値100では1隻目で必ず衝突し、残り14隻は生成されない
        let config = SimulationConfig {
            num_trials: 1,
            threshold_distance: 100.0,
            ..SimulationConfig::default()
        };
        let mut lazy = ScenarioSampler::new(ChaCha8Rng::seed_from_u64(15));
        assert_eq!(count_trial_collisions(&config, &mut lazy, 1, |_, _| {}), 1);

        let mut single = ScenarioSampler::new(ChaCha8Rng::seed_from_u64(15));
        single.sample_ship(config.area_size, config.max_speed);

        assert_eq!(
            lazy.sample_ship(config.area_size, config.max_speed),
            single.sample_ship(config.area_size, config.max_speed)
        );
    }

    #[test]
    fn test_loop_reports_every_trial() {
        let config = small_config(100.0);
        let mut sampler = ScenarioSampler::new(ChaCha8Rng::seed_from_u64(16));
        let mut seen = Vec::new();
        let collisions = count_trial_collisions(&config, &mut sampler, 5, |done, hits| seen.push((done, hits)));
        assert_eq!(collisions, 5);
        assert_eq!(seen, vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
    }

    #[test]
    fn test_lazy_and_presampled_classification_agree() {
        // 同じ他船列に対して、逐次生成のループと事前生成の判定が一致する
        let config = small_config(0.5);
        let primary = ShipState::primary();
        let mut presampler = ScenarioSampler::new(ChaCha8Rng::seed_from_u64(17));
        let trials: Vec<Vec<ShipState>> = (0..500)
            .map(|_| presampler.sample_trial(1, config.area_size, config.max_speed))
            .collect();

        let one_ship = SimulationConfig { num_other_ships: 1, ..config.clone() };
        let mut sampler = ScenarioSampler::new(ChaCha8Rng::seed_from_u64(17));
        let lazy = count_trial_collisions(&one_ship, &mut sampler, 500, |_, _| {});

        assert_eq!(lazy, count_collisions(&primary, &trials, config.threshold_distance));
    }

    #[test]
    fn test_collides_is_strict() {
        let primary = ShipState::primary();
        let parallel = ShipState::new(Vector2::new(0.0, 0.5), Vector2::new(1.0, 0.0));
        assert!(!collides(&primary, &parallel, 0.5));
        assert!(collides(&primary, &parallel, 0.5001));
    }

    #[test]
    fn test_monotonic_in_threshold() {
        let mut sampler = ScenarioSampler::new(ChaCha8Rng::seed_from_u64(8));
        let trials: Vec<Vec<ShipState>> = (0..2_000).map(|_| sampler.sample_trial(15, 25.0, 2.0)).collect();
        let primary = ShipState::primary();

        let counts: Vec<u64> = [0.0, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0, 50.0]
            .iter()
            .map(|&threshold| count_collisions(&primary, &trials, threshold))
            .collect();

        assert_eq!(counts[0], 0);
        assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{:?}", counts);
        assert_eq!(*counts.last().unwrap(), 2_000);
    }

    #[test]
    fn test_sequential_estimator_matches_free_function() {
        let config = small_config(0.5);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let expected = estimate_crossing_risk(&config, &mut rng).unwrap();

        let report = RiskEstimator::new(config, seeded(9, 1), 0).unwrap().run().unwrap();
        assert_eq!(report.probability, expected);
        assert_eq!(report.seed, 9);
        assert_eq!(report.workers, 1);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        for workers in [1, 4] {
            let a = RiskEstimator::new(small_config(0.5), seeded(10, workers), 0).unwrap().run().unwrap();
            let b = RiskEstimator::new(small_config(0.5), seeded(10, workers), 0).unwrap().run().unwrap();
            assert_eq!(a.collisions, b.collisions);
        }
    }

    #[test]
    fn test_parallel_counts_every_trial() {
        let report = RiskEstimator::new(small_config(100.0), seeded(11, 3), 0).unwrap().run().unwrap();
        assert_eq!(report.num_trials, 2_000);
        assert_eq!(report.collisions, 2_000);
        assert_eq!(report.probability, 1.0);
    }

    #[test]
    fn test_workers_capped_at_trial_count() {
        let config = SimulationConfig { num_trials: 3, ..SimulationConfig::default() };
        let report = RiskEstimator::new(config, seeded(12, 8), 0).unwrap().run().unwrap();
        assert_eq!(report.workers, 3);
        assert_eq!(report.num_trials, 3);
    }

    #[test]
    fn test_trial_split_is_balanced() {
        let split: Vec<u64> = (0..4).map(|i| RiskEstimator::trials_for_worker(10, 4, i)).collect();
        assert_eq!(split, vec![3, 3, 2, 2]);
        assert_eq!(split.iter().sum::<u64>(), 10);
    }

    #[test]
    fn test_worker_streams_differ() {
        let mut a = ScenarioSampler::new(RiskEstimator::worker_rng(13, 0));
        let mut b = ScenarioSampler::new(RiskEstimator::worker_rng(13, 1));
        assert_ne!(a.sample_trial(5, 25.0, 2.0), b.sample_trial(5, 25.0, 2.0));
    }

    #[test]
    fn test_parallel_agrees_with_sequential() {
        let config = SimulationConfig {
            num_trials: 20_000,
            threshold_distance: 0.5,
            ..SimulationConfig::default()
        };
        let sequential = RiskEstimator::new(config.clone(), seeded(14, 1), 0).unwrap().run().unwrap();
        let parallel = RiskEstimator::new(config, seeded(14, 4), 0).unwrap().run().unwrap();
        assert!(
            (sequential.probability - parallel.probability).abs() < 0.02,
            "sequential {} vs parallel {}",
            sequential.probability,
            parallel.probability
        );
    }

    #[test]
    fn test_report_statistics() {
        let report = RiskReport::new(100, 25, 0, 1, Duration::ZERO);
        assert_eq!(report.probability, 0.25);
        assert!((report.percentage() - 25.0).abs() < 1e-12);
        assert!((report.std_error - (0.25f64 * 0.75 / 100.0).sqrt()).abs() < 1e-12);
        assert_eq!(format!("{:.2}", report.percentage()), "25.00");
    }
}
