use tracing::{info, trace};

use crate::models::{
    common::{Vector2, math_utils},
    field::FieldConfig,
    obstacle::is_colliding,
};

/// 車両状態
///
/// 位置・速度・方位・最終更新時刻を保持します。
/// 所有者は外側のドライバ（シミュレーションエンジン）のみで、センサーとコントローラは参照しません。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    /// 現在位置（フィールド内にクランプ済み）
    pub position: Vector2,
    /// 現在速度（0 以上）
    pub speed: f64,
    /// 現在方位（度、コンパス規約）
    pub heading: f64,
    /// 最終更新時刻（シミュレーション開始からの経過秒数）
    pub last_update: f64,
}

impl VehicleState {
    /// 停止状態の車両を作成
    pub fn at_rest(position: Vector2) -> Self {
        Self {
            position,
            speed: 0.0,
            heading: 0.0,
            last_update: 0.0,
        }
    }
}

/// 1回の前進処理の結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Advance {
    /// 更新後の車両状態
    pub state: VehicleState,
    /// 軌跡に追加する点（移動開始前の位置）。停止中は `None`
    pub trail_point: Option<Vector2>,
    /// 障害物との衝突で停止したかどうか
    pub collided: bool,
}

/// サブステップ運動積分器
///
/// 経過時間は呼び出し側が明示的に与えます。1ティックの移動距離を
/// `step_size` 以下の刻みに分割し、刻みごとに衝突判定を行います。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionIntegrator {
    /// サブステップの目安となる刻み幅
    pub step_size: f64,
}

impl Default for MotionIntegrator {
    fn default() -> Self {
        Self { step_size: 2.0 }
    }
}

impl MotionIntegrator {
    pub fn new(step_size: f64) -> Self {
        Self { step_size }
    }

    /// 経過時間分だけ車両を前進させます
    ///
    /// # 引数
    ///
    /// * `state` - 現在の車両状態
    /// * `field` - フィールド設定（境界と障害物）
    /// * `elapsed_seconds` - 前回更新からの経過時間（負または非有限値は0として扱う）
    ///
    /// # 戻り値
    ///
    /// 更新後の状態、軌跡点、衝突有無
    pub fn advance(&self, state: &VehicleState, field: &FieldConfig, elapsed_seconds: f64) -> Advance {
        let elapsed = if elapsed_seconds.is_finite() { elapsed_seconds.max(0.0) } else { 0.0 };

        let mut next = *state;
        next.last_update = state.last_update + elapsed;

        if state.speed <= 0.0 {
            return Advance {
                state: next,
                trail_point: None,
                collided: false,
            };
        }

        let distance = state.speed * elapsed;
        let steps = ((distance / self.step_size).floor() as usize).max(1);
        let direction = math_utils::heading_to_motion(state.heading);
        let step = Vector2::new(
            distance * direction.x / steps as f64,
            distance * direction.y / steps as f64,
        );
        let (width, height) = field.size();

        let mut collided = false;
        for index in 0..steps {
            let candidate = (next.position + step).clamp_to_field(width, height);

            if is_colliding(&candidate, field.obstacles()) {
                next.speed = 0.0;
                collided = true;

                info!(
                    position_x = next.position.x,
                    position_y = next.position.y,
                    blocked_x = candidate.x,
                    blocked_y = candidate.y,
                    heading = state.heading,
                    sub_step = index,
                    sub_steps = steps,
                    "VEHICLE_COLLISION: 障害物に接触したため停止しました"
                );
                break;
            }

            next.position = candidate;
        }

        trace!(
            from_x = state.position.x,
            from_y = state.position.y,
            to_x = next.position.x,
            to_y = next.position.y,
            distance = distance,
            steps = steps,
            "車両位置を更新しました"
        );

        Advance {
            state: next,
            trail_point: Some(state.position),
            collided,
        }
    }
}

/// 既定の刻み幅（2単位）で車両を前進させます
pub fn advance(state: &VehicleState, field: &FieldConfig, elapsed_seconds: f64) -> Advance {
    MotionIntegrator::default().advance(state, field, elapsed_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::obstacle::Obstacle;

    fn field_with(obstacles: Vec<Obstacle>) -> FieldConfig {
        FieldConfig::new(
            800.0,
            600.0,
            obstacles,
            Vector2::new(20.0, 20.0),
            Vector2::new(691.0, 68.0),
        )
        .unwrap()
    }

    fn moving(x: f64, y: f64, speed: f64, heading: f64) -> VehicleState {
        VehicleState {
            position: Vector2::new(x, y),
            speed,
            heading,
            last_update: 10.0,
        }
    }

    #[test]
    fn test_stationary_vehicle_only_updates_timestamp() {
        let field = field_with(vec![]);
        let state = moving(100.0, 100.0, 0.0, 45.0);
        let result = advance(&state, &field, 3.5);
        assert_eq!(result.state.position, state.position);
        assert_eq!(result.state.heading, 45.0);
        assert_eq!(result.state.speed, 0.0);
        assert_eq!(result.state.last_update, 13.5);
        assert_eq!(result.trail_point, None);
        assert!(!result.collided);
    }

    #[test]
    fn test_moves_north() {
        let field = field_with(vec![]);
        let result = advance(&moving(100.0, 100.0, 10.0, 0.0), &field, 1.0);
        assert!((result.state.position.x - 100.0).abs() < 1e-9);
        assert!((result.state.position.y - 90.0).abs() < 1e-9);
        assert_eq!(result.state.speed, 10.0);
        assert_eq!(result.trail_point, Some(Vector2::new(100.0, 100.0)));
    }

    #[test]
    fn test_moves_east() {
        let field = field_with(vec![]);
        let result = advance(&moving(100.0, 100.0, 5.0, 90.0), &field, 2.0);
        assert!((result.state.position.x - 110.0).abs() < 1e-9);
        assert!((result.state.position.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_stops_before_obstacle() {
        let field = field_with(vec![Obstacle::circle(Vector2::new(140.0, 100.0), 10.0)]);
        let result = advance(&moving(100.0, 100.0, 50.0, 90.0), &field, 1.0);
        assert!(result.collided);
        assert_eq!(result.state.speed, 0.0);
        // 2単位刻みで 130 に到達した時点で衝突し、128 に留まる
        assert!((result.state.position.x - 128.0).abs() < 1e-9);
        assert!(!is_colliding(&result.state.position, field.obstacles()));
    }

    #[test]
    fn test_clamps_to_field() {
        let field = field_with(vec![]);
        let result = advance(&moving(5.0, 5.0, 20.0, 0.0), &field, 1.0);
        assert_eq!(result.state.position.y, 0.0);
        assert!((result.state.position.x - 5.0).abs() < 1e-9);
        assert!(!result.collided);
    }

    #[test]
    fn test_short_move_uses_single_step() {
        let field = field_with(vec![Obstacle::circle(Vector2::new(100.0, 98.5), 1.0)]);
        // 移動距離 1 (< 刻み幅 2) なので1サブステップで判定される
        let result = advance(&moving(100.0, 100.0, 1.0, 0.0), &field, 1.0);
        assert!(result.collided);
        assert_eq!(result.state.position, Vector2::new(100.0, 100.0));
    }

    #[test]
    fn test_negative_elapsed_is_ignored() {
        let field = field_with(vec![]);
        let state = moving(100.0, 100.0, 10.0, 0.0);
        let result = advance(&state, &field, -1.0);
        assert_eq!(result.state.position, state.position);
        assert_eq!(result.state.last_update, state.last_update);
    }
}
