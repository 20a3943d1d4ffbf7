//! # Error モジュール
//!
//! 設定検証・シナリオ読み込み・ログ初期化で発生するエラーを一つの型にまとめます。
//! シミュレーション本体は検証済みの入力に対する全域関数なので、
//! 試行ループの途中でエラーが発生することはありません。

use std::path::PathBuf;
use thiserror::Error;

/// クレート共通のResult型
pub type Result<T> = std::result::Result<T, RiskError>;

/// 衝突リスク推定のエラー
#[derive(Debug, Error)]
pub enum RiskError {
    /// 設定値が制約を満たさない（どのパラメータかを保持）
    #[error("設定検証エラー: {parameter} {reason}")]
    InvalidConfig {
        parameter: &'static str,
        reason: String,
    },

    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML解析エラー {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("ログ初期化エラー: {0}")]
    Logging(String),
}

impl RiskError {
    /// InvalidConfigを生成する
    pub fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        RiskError::InvalidConfig {
            parameter,
            reason: reason.into(),
        }
    }

    /// InvalidConfigの場合、違反したパラメータ名を返す
    pub fn parameter(&self) -> Option<&'static str> {
        match self {
            RiskError::InvalidConfig { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}
