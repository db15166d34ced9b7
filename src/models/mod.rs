// 基本的なデータ型と数学ユーティリティ
pub mod common;

// レイキャスト・衝突判定のインターフェース（trait）定義
pub mod traits;

// フィールドと障害物
pub mod obstacle;
pub mod field;

// 知覚・判断・運動のパイプライン
pub mod sensor;
pub mod controller;
pub mod motion;

// 便利な re-export
pub use common::*;
pub use traits::*;
pub use obstacle::{Obstacle, is_colliding};
pub use field::{FieldConfig, FieldError};
pub use sensor::{SensorReading, cast_sector_distances};
pub use controller::{Command, CommandStatus, NavigationController, NavigationParams, compute_command};
pub use motion::{Advance, MotionIntegrator, VehicleState, advance};
