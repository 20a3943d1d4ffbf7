use std::ops::{Add, Mul, Neg, Sub};

/// 2次元ベクトル（位置・速度の両方に使用）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 速さと方位角（ラジアン、x軸基準・反時計回り）からベクトルを生成
    pub fn from_polar(magnitude: f64, angle_rad: f64) -> Self {
        Self::new(magnitude * angle_rad.cos(), magnitude * angle_rad.sin())
    }

    /// 内積
    pub fn dot(&self, other: &Vector2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 長さの2乗
    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    /// ベクトルの長さ
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// 2点間の距離
    pub fn distance(&self, other: &Vector2) -> f64 {
        (*other - *self).norm()
    }
}

impl Add for Vector2 {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2 {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vector2 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl Neg for Vector2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// 等速直線運動する船舶の状態
///
/// 現在時刻以降、`velocity` のまま `position` から移動し続けるものとして扱います。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipState {
    pub position: Vector2,
    pub velocity: Vector2,
}

impl ShipState {
    pub fn new(position: Vector2, velocity: Vector2) -> Self {
        Self { position, velocity }
    }

    /// 自船の状態: 原点からx軸方向に速さ1で航行
    pub fn primary() -> Self {
        Self::new(Vector2::ZERO, Vector2::new(1.0, 0.0))
    }
}
