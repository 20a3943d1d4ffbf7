//! モンテカルロ法による船舶衝突リスク推定
//!
//! - `models`: ベクトル・船舶状態・最接近点計算・他船サンプリング
//! - `simulation`: 試行ループと推定エンジン
//! - `scenario`: 設定の読み込みと検証
//! - `logging`: ログ初期化

pub mod error;
pub mod logging;
pub mod models;
pub mod scenario;
pub mod simulation;
