use std::ops::{Add, Sub, Mul};

/// 2次元平面上の位置を表す構造体
///
/// 画面座標系（x は右向き、y は下向き）で表現します。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 2点間のユークリッド距離
    pub fn distance(&self, other: &Vector2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// 2点間の距離の2乗（衝突判定用）
    pub fn distance_squared(&self, other: &Vector2) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2)
    }

    /// フィールド矩形 [0, width] × [0, height] 内に各軸を独立にクランプ
    pub fn clamp_to_field(&self, width: f64, height: f64) -> Self {
        Self::new(self.x.max(0.0).min(width), self.y.max(0.0).min(height))
    }

    /// フィールド矩形内にあるかどうか（境界を含む）
    pub fn is_in_field(&self, width: f64, height: f64) -> bool {
        self.x >= 0.0 && self.x <= width && self.y >= 0.0 && self.y <= height
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
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

/// セクター数（360° を 60° ずつ分割）
pub const SECTOR_COUNT: usize = 6;

/// 1セクターの角度幅（度）
pub const SECTOR_ANGLE_DEG: f64 = 60.0;

/// 方位角・座標変換のユーティリティ関数
///
/// 方位角はすべてコンパス規約（0° = 北 = 画面上方向、時計回りが正）です。
pub mod math_utils {
    use super::Vector2;

    /// 方位角を [0, 360) の範囲に正規化
    pub fn normalize_heading(heading_deg: f64) -> f64 {
        let normalized = heading_deg.rem_euclid(360.0);
        // rem_euclid は丸めにより 360.0 を返すことがある。−0.0 も 0.0 に揃える
        if normalized >= 360.0 || normalized == 0.0 { 0.0 } else { normalized }
    }

    /// 方位角を画面座標系の単位ベクトルに変換
    ///
    /// センサーのレイ方向と同じ規約: (sin θ, −cos θ)
    pub fn heading_to_ray(heading_deg: f64) -> Vector2 {
        let rad = heading_deg.to_radians();
        Vector2::new(rad.sin(), -rad.cos())
    }

    /// 方位角を運動用の単位ベクトルに変換
    ///
    /// 数学座標系の角度 (90° − θ) を経由し、y 軸を反転して画面座標系に戻します。
    pub fn heading_to_motion(heading_deg: f64) -> Vector2 {
        let math_angle = (90.0 - heading_deg).to_radians();
        Vector2::new(math_angle.cos(), -math_angle.sin())
    }

    /// `from` から `to` への方位角（度、正規化前）
    pub fn bearing(from: &Vector2, to: &Vector2) -> f64 {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        dx.atan2(-dy).to_degrees()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::math_utils::*;

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(-60.0), 300.0);
        assert_eq!(normalize_heading(725.0), 5.0);
        assert!(normalize_heading(-1e-20) < 360.0);
    }

    #[test]
    fn test_bearing_compass_convention() {
        let origin = Vector2::new(100.0, 100.0);
        assert_eq!(normalize_heading(bearing(&origin, &Vector2::new(100.0, 50.0))), 0.0);
        assert!((normalize_heading(bearing(&origin, &Vector2::new(150.0, 100.0))) - 90.0).abs() < 1e-9);
        assert!((normalize_heading(bearing(&origin, &Vector2::new(100.0, 150.0))) - 180.0).abs() < 1e-9);
        assert!((normalize_heading(bearing(&origin, &Vector2::new(50.0, 100.0))) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_to_field() {
        let p = Vector2::new(-5.0, 700.0).clamp_to_field(800.0, 600.0);
        assert_eq!(p, Vector2::new(0.0, 600.0));
        assert!(p.is_in_field(800.0, 600.0));
    }
}
