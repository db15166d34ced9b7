use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use thiserror::Error;

use crate::models::{FieldConfig, FieldError, NavigationParams, Obstacle, Vector2};

/// シナリオメタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioMeta {
    pub version: String,
    pub name: String,
    pub description: String,
}

/// シミュレーション設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    pub dt_s: f64,
    pub t_max_s: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

fn default_max_steps() -> u64 {
    100_000
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl From<Position2D> for Vector2 {
    fn from(p: Position2D) -> Self {
        Vector2::new(p.x, p.y)
    }
}

/// 障害物設定
///
/// 矩形の `origin` の解釈はモデル側の `Obstacle` を参照してください。
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObstacleConfig {
    Circle {
        center: Position2D,
        radius: f64,
    },
    Rectangle {
        origin: Position2D,
        width: f64,
        height: f64,
    },
}

impl From<&ObstacleConfig> for Obstacle {
    fn from(config: &ObstacleConfig) -> Self {
        match config {
            ObstacleConfig::Circle { center, radius } => Obstacle::circle((*center).into(), *radius),
            ObstacleConfig::Rectangle { origin, width, height } => {
                Obstacle::rectangle((*origin).into(), *width, *height)
            }
        }
    }
}

/// フィールド設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FieldSection {
    pub width: f64,
    pub height: f64,
    pub start_position: Position2D,
    pub end_position: Position2D,
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
}

/// 車両性能設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VehicleConfig {
    pub max_speed: f64,
    pub max_detect_distance: f64,
}

/// 航法パラメータ設定（省略時は既定値）
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NavigationConfig {
    #[serde(default = "default_stop_radius")]
    pub stop_radius: f64,
    #[serde(default = "default_safe_distance")]
    pub safe_distance: f64,
    #[serde(default = "default_accel_step")]
    pub accel_step: f64,
    #[serde(default)]
    pub heading_offset_deg: f64,
    #[serde(default = "default_step_size")]
    pub step_size: f64,
}

fn default_stop_radius() -> f64 {
    NavigationParams::default().stop_radius
}

fn default_safe_distance() -> f64 {
    NavigationParams::default().safe_distance
}

fn default_accel_step() -> f64 {
    NavigationParams::default().accel_step
}

fn default_step_size() -> f64 {
    2.0
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            stop_radius: default_stop_radius(),
            safe_distance: default_safe_distance(),
            accel_step: default_accel_step(),
            heading_offset_deg: 0.0,
            step_size: default_step_size(),
        }
    }
}

impl NavigationConfig {
    pub fn params(&self) -> NavigationParams {
        NavigationParams {
            stop_radius: self.stop_radius,
            safe_distance: self.safe_distance,
            accel_step: self.accel_step,
            heading_offset_deg: self.heading_offset_deg,
        }
    }
}

/// 完全なシナリオ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenarioConfig {
    pub meta: ScenarioMeta,
    pub sim: SimulationConfig,
    pub field: FieldSection,
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

impl ScenarioConfig {
    /// YAMLファイルからシナリオ設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();

        // ファイル存在チェック
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.to_path_buf()));
        }

        // ファイル読み込み
        let contents = fs::read_to_string(path)
            .map_err(|e| ScenarioError::IoError(path.to_path_buf(), e))?;

        // YAML解析
        let config: ScenarioConfig = serde_yaml::from_str(&contents)
            .map_err(|e| ScenarioError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列からシナリオ設定を読み込み
    pub fn from_yaml_str(contents: &str) -> Result<Self, ScenarioError> {
        let config: ScenarioConfig = serde_yaml::from_str(contents)
            .map_err(|e| ScenarioError::ParseError(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// 組み込みの坑内フィールド（障害物16個）
    pub fn builtin() -> Self {
        let rect = |x: f64, y: f64, width: f64, height: f64| ObstacleConfig::Rectangle {
            origin: Position2D { x, y },
            width,
            height,
        };
        let circle = |x: f64, y: f64, radius: f64| ObstacleConfig::Circle {
            center: Position2D { x, y },
            radius,
        };

        Self {
            meta: ScenarioMeta {
                version: "1.0".to_string(),
                name: "builtin_mine".to_string(),
                description: "組み込みの坑内フィールド".to_string(),
            },
            sim: SimulationConfig {
                dt_s: 0.1,
                t_max_s: 600.0,
                max_steps: default_max_steps(),
            },
            field: FieldSection {
                width: 800.0,
                height: 600.0,
                start_position: Position2D { x: 20.0, y: 20.0 },
                end_position: Position2D { x: 691.0, y: 68.0 },
                obstacles: vec![
                    rect(0.0, 50.0, 300.0, 30.0),
                    circle(325.0, 150.0, 45.0),
                    rect(200.0, 120.0, 30.0, 150.0),
                    rect(425.0, 0.0, 30.0, 400.0),
                    rect(225.0, 300.0, 30.0, 250.0),
                    rect(0.0, 300.0, 225.0, 30.0),
                    rect(320.0, 400.0, 200.0, 30.0),
                    rect(320.0, 490.0, 200.0, 30.0),
                    rect(320.0, 570.0, 200.0, 30.0),
                    circle(600.0, 470.0, 50.0),
                    circle(650.0, 370.0, 50.0),
                    circle(550.0, 270.0, 60.0),
                    circle(700.0, 170.0, 70.0),
                    circle(780.0, 25.0, 70.0),
                    circle(780.0, 575.0, 70.0),
                    circle(50.0, 300.0, 70.0),
                ],
            },
            vehicle: VehicleConfig {
                max_speed: 10.0,
                max_detect_distance: 100.0,
            },
            navigation: NavigationConfig::default(),
        }
    }

    /// 設定の基本的な検証
    pub fn validate(&self) -> Result<(), ScenarioError> {
        // 時間設定の検証
        require_positive_finite("dt_s", self.sim.dt_s)?;
        require_positive_finite("t_max_s", self.sim.t_max_s)?;

        // 車両性能の検証
        require_positive_finite("max_speed", self.vehicle.max_speed)?;
        require_positive_finite("max_detect_distance", self.vehicle.max_detect_distance)?;

        // 航法パラメータの検証
        let nav = &self.navigation;
        if nav.stop_radius < 0.0 || nav.safe_distance < 0.0 || nav.accel_step < 0.0 {
            return Err(ScenarioError::ValidationError(
                "navigation parameters must be non-negative".to_string()
            ));
        }
        if !(nav.step_size > 0.0) {
            return Err(ScenarioError::ValidationError("step_size must be positive".to_string()));
        }

        // フィールドと障害物の検証
        self.field_config()?;

        Ok(())
    }

    /// 検証済みのフィールド設定を構築
    pub fn field_config(&self) -> Result<FieldConfig, FieldError> {
        FieldConfig::new(
            self.field.width,
            self.field.height,
            self.field.obstacles.iter().map(Obstacle::from).collect(),
            self.field.start_position.into(),
            self.field.end_position.into(),
        )
    }

    /// シナリオの概要を表示
    pub fn print_summary(&self) {
        println!("=== シナリオ情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!("バージョン: {}", self.meta.version);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}秒", self.sim.dt_s);
        println!("最大時間: {:.1}秒 ({:.1}分)", self.sim.t_max_s, self.sim.t_max_s / 60.0);
        println!();

        println!("=== フィールド ===");
        println!("大きさ: {:.0} x {:.0}", self.field.width, self.field.height);
        println!("開始位置: ({:.0}, {:.0})", self.field.start_position.x, self.field.start_position.y);
        println!("目標位置: ({:.0}, {:.0})", self.field.end_position.x, self.field.end_position.y);
        let circles = self.field.obstacles
            .iter()
            .filter(|o| matches!(o, ObstacleConfig::Circle { .. }))
            .count();
        println!("障害物: {}個 (円形: {}, 矩形: {})",
                 self.field.obstacles.len(),
                 circles,
                 self.field.obstacles.len() - circles);
        println!();

        println!("=== 車両 ===");
        println!("最大速度: {:.1}", self.vehicle.max_speed);
        println!("最大検知距離: {:.1}", self.vehicle.max_detect_distance);
    }
}

/// 有限かつ正の値であることを確認（NaN と無限大は拒否）
fn require_positive_finite(name: &str, value: f64) -> Result<(), ScenarioError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ScenarioError::ValidationError(format!(
            "{} must be a positive finite number: {}",
            name, value
        )))
    }
}

/// シナリオ読み込みエラー
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("シナリオファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    ParseError(PathBuf, #[source] serde_yaml::Error),

    #[error("設定検証エラー: {0}")]
    ValidationError(String),

    #[error("フィールド設定エラー: {0}")]
    FieldError(#[from] FieldError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
meta:
  version: "1.0"
  name: simple
  description: test field
sim:
  dt_s: 0.1
  t_max_s: 60.0
field:
  width: 200
  height: 100
  start_position: { x: 10, y: 50 }
  end_position: { x: 190, y: 50 }
  obstacles:
    - { type: circle, center: { x: 100, y: 20 }, radius: 10 }
    - { type: rectangle, origin: { x: 50, y: 80 }, width: 20, height: 10 }
vehicle:
  max_speed: 5
  max_detect_distance: 50
"#;

    #[test]
    fn test_parse_simple_scenario() {
        let config = ScenarioConfig::from_yaml_str(SIMPLE).unwrap();
        assert_eq!(config.meta.name, "simple");
        assert_eq!(config.sim.max_steps, 100_000);
        assert_eq!(config.navigation.params(), NavigationParams::default());

        let field = config.field_config().unwrap();
        assert_eq!(field.size(), (200.0, 100.0));
        assert_eq!(field.obstacles()[0], Obstacle::circle(Vector2::new(100.0, 20.0), 10.0));
        assert_eq!(field.obstacles()[1], Obstacle::rectangle(Vector2::new(50.0, 80.0), 20.0, 10.0));
    }

    #[test]
    fn test_navigation_overrides() {
        let yaml = format!("{SIMPLE}navigation:\n  safe_distance: 30\n  heading_offset_deg: -60\n");
        let config = ScenarioConfig::from_yaml_str(&yaml).unwrap();
        let params = config.navigation.params();
        assert_eq!(params.safe_distance, 30.0);
        assert_eq!(params.heading_offset_deg, -60.0);
        assert_eq!(params.stop_radius, 5.0);
    }

    #[test]
    fn test_rejects_bad_radius() {
        let yaml = SIMPLE.replace("radius: 10", "radius: -1");
        let err = ScenarioConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ScenarioError::FieldError(FieldError::InvalidRadius { index: 0, .. })));
    }

    #[test]
    fn test_rejects_bad_time_step() {
        let yaml = SIMPLE.replace("dt_s: 0.1", "dt_s: 0");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::ValidationError(_))
        ));
    }

    #[test]
    fn test_rejects_non_finite_time_settings() {
        for (from, to) in [
            ("dt_s: 0.1", "dt_s: .nan"),
            ("dt_s: 0.1", "dt_s: .inf"),
            ("t_max_s: 60.0", "t_max_s: .nan"),
            ("t_max_s: 60.0", "t_max_s: .inf"),
            ("max_speed: 5", "max_speed: .inf"),
        ] {
            let yaml = SIMPLE.replace(from, to);
            assert!(
                matches!(ScenarioConfig::from_yaml_str(&yaml), Err(ScenarioError::ValidationError(_))),
                "{} should be rejected",
                to
            );
        }

        let mut config = ScenarioConfig::builtin();
        config.sim.dt_s = f64::NAN;
        config.sim.t_max_s = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_obstacle_type() {
        let yaml = SIMPLE.replace("type: circle", "type: triangle");
        assert!(matches!(
            ScenarioConfig::from_yaml_str(&yaml),
            Err(ScenarioError::ParseError(_, _))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ScenarioConfig::from_file("does/not/exist.yaml"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_builtin_is_valid() {
        let config = ScenarioConfig::builtin();
        config.validate().unwrap();
        assert_eq!(config.field.obstacles.len(), 16);
    }
}
