//! 最接近点（CPA: Closest Point of Approach）の計算
//!
//! 2隻が現在から等速直線運動を続けると仮定し、t ≥ 0 の範囲で到達する最小距離を求めます。
//! 過去の最接近は考慮しません。

use crate::models::common::{ShipState, Vector2};

/// 最接近の計算結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    /// 最接近距離（t ≥ 0 の範囲）
    pub distance: f64,
    /// 最接近時刻。相対運動がない場合と離反中の場合は 0.0
    pub time: f64,
}

/// 最接近距離と時刻を計算
///
/// 相対速度が厳密に0の場合、または最接近時刻が過去（t* < 0）の場合は
/// 現在の距離をそのまま返します。
pub fn closest_approach(pos1: Vector2, vel1: Vector2, pos2: Vector2, vel2: Vector2) -> ClosestApproach {
    let rel_pos = pos2 - pos1;
    let rel_vel = vel2 - vel1;
    let rel_speed_sq = rel_vel.norm_squared();

    if rel_speed_sq == 0.0 {
        return ClosestApproach { distance: rel_pos.norm(), time: 0.0 };
    }

    let t = -rel_pos.dot(&rel_vel) / rel_speed_sq;
    if t < 0.0 {
        return ClosestApproach { distance: rel_pos.norm(), time: 0.0 };
    }

    ClosestApproach {
        distance: (rel_pos + rel_vel * t).norm(),
        time: t,
    }
}

/// 最接近距離のみを計算
pub fn cpa_distance(pos1: Vector2, vel1: Vector2, pos2: Vector2, vel2: Vector2) -> f64 {
    closest_approach(pos1, vel1, pos2, vel2).distance
}

impl ShipState {
    /// 他船との最接近距離
    pub fn cpa_distance(&self, other: &ShipState) -> f64 {
        cpa_distance(self.position, self.velocity, other.position, other.velocity)
    }
}
