// 基本的なデータ型（ベクトル・船舶状態）
pub mod common;

// 最接近点（CPA）の幾何計算
pub mod cpa;

// 他船状態のランダム生成
pub mod sampler;

// 便利な re-export
pub use common::ShipState;
pub use sampler::ScenarioSampler;
