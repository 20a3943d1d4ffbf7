use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, RiskError};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Default for ScenarioMeta {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "default".to_string(),
            description: "標準の遭遇シナリオ".to_string(),
        }
    }
}

/// シミュレーション設定
///
/// 試行数と他船数は負の値も読み込めるよう符号付きで保持し、
/// `validate` でInvalidConfigとして報告します。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub num_trials: i64,
    pub num_other_ships: i64,
    /// サンプリング正方形の半幅
    pub area_size: f64,
    pub max_speed: f64,
    /// これ未満の最接近距離を衝突とみなす
    pub threshold_distance: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_trials: 50_000,
            num_other_ships: 15,
            area_size: 25.0,
            max_speed: 2.0,
            threshold_distance: 0.2,
        }
    }
}

impl SimulationConfig {
    /// 設定の検証（試行開始前に一度だけ実行）
    pub fn validate(&self) -> Result<()> {
        if self.num_trials <= 0 {
            return Err(RiskError::invalid(
                "num_trials",
                format!("must be a positive integer (got {})", self.num_trials),
            ));
        }
        if self.num_other_ships < 0 {
            return Err(RiskError::invalid(
                "num_other_ships",
                format!("must not be negative (got {})", self.num_other_ships),
            ));
        }

        check_non_negative("area_size", self.area_size)?;
        check_non_negative("max_speed", self.max_speed)?;
        check_non_negative("threshold_distance", self.threshold_distance)?;

        // [-a, a] の幅がオーバーフローすると一様分布を構築できない
        if !(self.area_size * 2.0).is_finite() {
            return Err(RiskError::invalid(
                "area_size",
                format!("is too large to sample (got {})", self.area_size),
            ));
        }

        Ok(())
    }

    /// 検証済みの試行数
    pub fn trials(&self) -> u64 {
        self.num_trials.max(0) as u64
    }

    /// 検証済みの他船数
    pub fn other_ships(&self) -> usize {
        self.num_other_ships.max(0) as usize
    }
}

fn check_non_negative(parameter: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(RiskError::invalid(parameter, format!("must be finite (got {})", value)));
    }
    if value < 0.0 {
        return Err(RiskError::invalid(parameter, format!("must not be negative (got {})", value)));
    }
    Ok(())
}

/// 実行設定（乱数シードとワーカー数）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// 未指定の場合は実行ごとに一度だけエントロピーから生成
    pub seed: Option<u64>,
    /// 1 なら逐次実行
    pub workers: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { seed: None, workers: 1 }
    }
}

impl ExecutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(RiskError::invalid("workers", "must be at least 1"));
        }
        Ok(())
    }
}

/// 閾値のプリセット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// 閾値 0.2
    Standard,
    /// 閾値 0.5
    Cautious,
}

impl Preset {
    pub fn config(self) -> SimulationConfig {
        let threshold_distance = match self {
            Preset::Standard => 0.2,
            Preset::Cautious => 0.5,
        };
        SimulationConfig {
            threshold_distance,
            ..SimulationConfig::default()
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "default" => Ok(Preset::Standard),
            "cautious" | "wide" => Ok(Preset::Cautious),
            _ => Err(format!("無効なプリセット: {}. 利用可能: standard, cautious", s)),
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(RiskError::FileNotFound(path.to_path_buf()));
        }

        let contents = fs::read_to_string(path).map_err(|source| RiskError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_yaml(&contents, path)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        Self::parse_yaml(contents, Path::new("<inline>"))
    }

    /// 解析と検証（`source` はエラー表示用）
    fn parse_yaml(contents: &str, source: &Path) -> Result<Self> {
        let config: ScenarioConfig = serde_yaml::from_str(contents).map_err(|e| RiskError::Parse {
            path: source.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sim.validate()?;
        self.execution.validate()
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        if !self.meta.description.is_empty() {
            println!("説明: {}", self.meta.description);
        }
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("試行数: {}", self.sim.num_trials);
        println!("他船数: {}隻/試行", self.sim.num_other_ships);
        println!("領域半幅: {:.2}", self.sim.area_size);
        println!("最大速度: {:.2}", self.sim.max_speed);
        println!("衝突閾値: {:.2}", self.sim.threshold_distance);
        println!();

        println!("=== 実行設定 ===");
        match self.execution.seed {
            Some(seed) => println!("シード値: {}", seed),
            None => println!("シード値: 自動"),
        }
        println!("ワーカー数: {}", self.execution.workers);
    }
}
