use rand::Rng;
use std::f64::consts::TAU;

use crate::models::common::{ShipState, Vector2};

/// 他船の初期状態をランダムに生成するサンプラー
///
/// 乱数生成器は実行（またはワーカー）ごとに一度だけ用意し、
/// すべての抽選で同じストリームを使い続けます。
#[derive(Debug)]
pub struct ScenarioSampler<R: Rng> {
    rng: R,
}

impl<R: Rng> ScenarioSampler<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// [-area_size, area_size]² から一様に位置を抽選
    ///
    /// `area_size` は0以上であること。0の場合は常に原点を返します。
    pub fn sample_position(&mut self, area_size: f64) -> Vector2 {
        let x = self.rng.random_range(-area_size..=area_size);
        let y = self.rng.random_range(-area_size..=area_size);
        Vector2::new(x, y)
    }

    /// 速さを [0, max_speed]、方位を [0, 2π) から一様に抽選して速度ベクトルを返す
    pub fn sample_velocity(&mut self, max_speed: f64) -> Vector2 {
        let heading = self.rng.random_range(0.0..TAU);
        let speed = self.rng.random_range(0.0..=max_speed);
        Vector2::from_polar(speed, heading)
    }

    /// 他船1隻分の状態
    pub fn sample_ship(&mut self, area_size: f64, max_speed: f64) -> ShipState {
        let position = self.sample_position(area_size);
        let velocity = self.sample_velocity(max_speed);
        ShipState::new(position, velocity)
    }

    /// 1試行分（`count` 隻）の他船をまとめて生成
    pub fn sample_trial(&mut self, count: usize, area_size: f64, max_speed: f64) -> Vec<ShipState> {
        (0..count).map(|_| self.sample_ship(area_size, max_speed)).collect()
    }
}
