use thiserror::Error;

use crate::models::{
    common::Vector2,
    obstacle::{Obstacle, is_colliding},
};

/// フィールド設定の検証エラー
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    /// フィールドの幅・高さが正でない
    #[error("field size must be positive and finite: {width} x {height}")]
    InvalidSize { width: f64, height: f64 },

    /// 円形障害物の半径が正でない
    #[error("obstacle #{index}: circle radius must be positive, got {radius}")]
    InvalidRadius { index: usize, radius: f64 },

    /// 矩形障害物の寸法が正でない
    #[error("obstacle #{index}: rectangle extents must be positive, got {width} x {height}")]
    InvalidExtent { index: usize, width: f64, height: f64 },

    /// 座標が有限値でない
    #[error("{0}: coordinates must be finite")]
    NonFiniteCoordinate(String),

    /// 開始位置・終了位置がフィールド外
    #[error("{name} ({x}, {y}) lies outside the field")]
    OutOfField { name: &'static str, x: f64, y: f64 },
}

/// フィールド設定
///
/// フィールドの大きさ、障害物、開始位置、目標位置を保持します。
/// 構築時に検証され、以降は変更されません。
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    width: f64,
    height: f64,
    obstacles: Vec<Obstacle>,
    start_position: Vector2,
    end_position: Vector2,
}

impl FieldConfig {
    /// 検証付きでフィールド設定を作成します
    ///
    /// # 引数
    ///
    /// * `width` / `height` - フィールドの大きさ（正の有限値）
    /// * `obstacles` - 障害物の順序付きリスト
    /// * `start_position` - 車両の開始位置
    /// * `end_position` - 目標位置
    ///
    /// # 戻り値
    ///
    /// 検証に成功した場合はフィールド設定、失敗した場合は `FieldError`
    pub fn new(
        width: f64,
        height: f64,
        obstacles: Vec<Obstacle>,
        start_position: Vector2,
        end_position: Vector2,
    ) -> Result<Self, FieldError> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(FieldError::InvalidSize { width, height });
        }

        for (index, obstacle) in obstacles.iter().enumerate() {
            match *obstacle {
                Obstacle::Circle { center, radius } => {
                    if !center.is_finite() {
                        return Err(FieldError::NonFiniteCoordinate(format!("obstacle #{index}")));
                    }
                    if !(radius.is_finite() && radius > 0.0) {
                        return Err(FieldError::InvalidRadius { index, radius });
                    }
                }
                Obstacle::Rectangle { origin, width, height } => {
                    if !origin.is_finite() {
                        return Err(FieldError::NonFiniteCoordinate(format!("obstacle #{index}")));
                    }
                    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
                        return Err(FieldError::InvalidExtent { index, width, height });
                    }
                }
            }
        }

        for (name, position) in [("start_position", start_position), ("end_position", end_position)] {
            if !position.is_finite() {
                return Err(FieldError::NonFiniteCoordinate(name.to_string()));
            }
            if !position.is_in_field(width, height) {
                return Err(FieldError::OutOfField { name, x: position.x, y: position.y });
            }
        }

        Ok(Self {
            width,
            height,
            obstacles,
            start_position,
            end_position,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// (幅, 高さ) の組
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn start_position(&self) -> Vector2 {
        self.start_position
    }

    pub fn end_position(&self) -> Vector2 {
        self.end_position
    }

    /// 外部から受け取った座標がフィールド内かつ障害物外にあるか
    pub fn is_free(&self, point: &Vector2) -> bool {
        point.is_finite()
            && point.is_in_field(self.width, self.height)
            && !is_colliding(point, &self.obstacles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(obstacles: Vec<Obstacle>) -> Result<FieldConfig, FieldError> {
        FieldConfig::new(
            800.0,
            600.0,
            obstacles,
            Vector2::new(20.0, 20.0),
            Vector2::new(691.0, 68.0),
        )
    }

    #[test]
    fn test_valid_field() {
        let field = field_with(vec![Obstacle::circle(Vector2::new(325.0, 150.0), 45.0)]).unwrap();
        assert_eq!(field.size(), (800.0, 600.0));
        assert_eq!(field.obstacles().len(), 1);
        assert!(field.is_free(&field.start_position()));
        assert!(!field.is_free(&Vector2::new(325.0, 150.0)));
        assert!(!field.is_free(&Vector2::new(900.0, 10.0)));
    }

    #[test]
    fn test_rejects_degenerate_size() {
        let result = FieldConfig::new(0.0, 600.0, vec![], Vector2::default(), Vector2::default());
        assert!(matches!(result, Err(FieldError::InvalidSize { .. })));
    }

    #[test]
    fn test_rejects_non_positive_radius() {
        let result = field_with(vec![Obstacle::circle(Vector2::new(10.0, 10.0), 0.0)]);
        assert_eq!(result, Err(FieldError::InvalidRadius { index: 0, radius: 0.0 }));
    }

    #[test]
    fn test_rejects_non_positive_rectangle() {
        let result = field_with(vec![
            Obstacle::circle(Vector2::new(10.0, 10.0), 5.0),
            Obstacle::rectangle(Vector2::new(0.0, 0.0), 30.0, -1.0),
        ]);
        assert!(matches!(result, Err(FieldError::InvalidExtent { index: 1, .. })));
    }

    #[test]
    fn test_rejects_target_outside_field() {
        let result = FieldConfig::new(
            100.0,
            100.0,
            vec![],
            Vector2::new(10.0, 10.0),
            Vector2::new(150.0, 10.0),
        );
        assert!(matches!(result, Err(FieldError::OutOfField { name: "end_position", .. })));
    }
}
