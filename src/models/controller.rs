use tracing::{debug, trace};

use crate::models::{
    common::{Vector2, SECTOR_ANGLE_DEG, math_utils},
    sensor::{sector_for_bearing, clearest_sector},
};

/// 指令の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// 目標に到達した（停止指令）
    Success,
    /// 移動を継続する
    Moved,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Success => "success",
            CommandStatus::Moved => "moved",
        }
    }
}

/// 速度・方位指令
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Command {
    /// 新しい速度
    pub speed: f64,
    /// 新しい方位角（度）
    pub heading: f64,
    pub status: CommandStatus,
    /// 目標方位のセクターが塞がっており、回避方位を選択したかどうか
    pub avoided: bool,
}

/// 航法制御パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationParams {
    /// 停止半径（この距離以内で目標到達とみなす）
    pub stop_radius: f64,
    /// 安全距離（これ未満のセクターは塞がっているとみなす）
    pub safe_distance: f64,
    /// 1回の指令あたりの加速量
    pub accel_step: f64,
    /// 方位角に加えるオフセット（度、障害注入用。通常は0）
    pub heading_offset_deg: f64,
}

impl Default for NavigationParams {
    fn default() -> Self {
        Self {
            stop_radius: 5.0,
            safe_distance: 20.0,
            accel_step: 0.5,
            heading_offset_deg: 0.0,
        }
    }
}

/// 反応型の航法コントローラ
///
/// 現在状態・目標位置・セクター距離から次の速度と方位を決定します。
/// 内部状態を持たない純粋な変換で、同じ入力に対して常に同じ指令を返します。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NavigationController {
    pub params: NavigationParams,
}

impl NavigationController {
    pub fn new(params: NavigationParams) -> Self {
        Self { params }
    }

    /// 速度・方位指令を計算します
    ///
    /// 1. 目標までの距離が停止半径以内なら停止指令（方位は維持）
    /// 2. 目標方位へ向け、速度を `accel_step` だけ加速（`max_speed` で頭打ち）
    /// 3. 目標方位のセクターが安全距離未満なら、最も空いているセクターの開始角へ転針
    /// 4. 制動距離（速度×2）より目標が近ければ減速
    ///
    /// # 引数
    ///
    /// * `current_pos` - 現在位置
    /// * `target_pos` - 目標位置
    /// * `current_speed` - 現在速度
    /// * `current_heading` - 現在方位（度）
    /// * `sector_distances` - セクター距離（空の場合は回避処理を行わない）
    /// * `max_speed` - 最大速度
    pub fn compute_command(
        &self,
        current_pos: &Vector2,
        target_pos: &Vector2,
        current_speed: f64,
        current_heading: f64,
        sector_distances: &[f64],
        max_speed: f64,
    ) -> Command {
        let params = &self.params;
        let distance_to_target = current_pos.distance(target_pos);

        if distance_to_target <= params.stop_radius {
            return Command {
                speed: 0.0,
                heading: current_heading,
                status: CommandStatus::Success,
                avoided: false,
            };
        }

        let bearing = math_utils::normalize_heading(math_utils::bearing(current_pos, target_pos));
        let target_sector = sector_for_bearing(bearing);

        let mut new_heading = bearing;
        let mut new_speed = (current_speed + params.accel_step).min(max_speed);
        let mut avoided = false;

        if let Some(&blocked_distance) = sector_distances.get(target_sector) {
            if blocked_distance < params.safe_distance {
                if let Some(best_sector) = clearest_sector(sector_distances) {
                    new_heading = best_sector as f64 * SECTOR_ANGLE_DEG;
                    avoided = true;
                    debug!(
                        bearing = bearing,
                        target_sector = target_sector,
                        blocked_distance = blocked_distance,
                        best_sector = best_sector,
                        new_heading = new_heading,
                        "AVOIDANCE_ENGAGED: 目標方位のセクターが塞がっているため転針します"
                    );
                }
            }
        }

        new_heading -= params.heading_offset_deg;

        let braking_distance = new_speed * 2.0;
        if distance_to_target < braking_distance {
            new_speed = new_speed.min(distance_to_target / 2.0).max(0.0);
        }

        let heading = math_utils::normalize_heading(new_heading.round_ties_even());

        trace!(
            distance_to_target = distance_to_target,
            bearing = bearing,
            speed = new_speed,
            heading = heading,
            "航法指令を計算しました"
        );

        Command {
            speed: new_speed,
            heading,
            status: CommandStatus::Moved,
            avoided,
        }
    }
}

/// 既定パラメータで速度・方位指令を計算します
///
/// 停止半径 5、安全距離 20、加速量 0.5。
pub fn compute_command(
    current_pos: &Vector2,
    target_pos: &Vector2,
    current_speed: f64,
    current_heading: f64,
    sector_distances: &[f64],
    max_speed: f64,
) -> Command {
    NavigationController::default().compute_command(
        current_pos,
        target_pos,
        current_speed,
        current_heading,
        sector_distances,
        max_speed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAR: [f64; 6] = [100.0; 6];

    #[test]
    fn test_stop_within_radius() {
        let pos = Vector2::new(100.0, 100.0);
        for target in [Vector2::new(100.0, 100.0), Vector2::new(103.0, 104.0)] {
            let command = compute_command(&pos, &target, 7.0, 123.0, &[0.0; 6], 10.0);
            assert_eq!(command.speed, 0.0);
            assert_eq!(command.heading, 123.0);
            assert_eq!(command.status, CommandStatus::Success);
        }
    }

    #[test]
    fn test_heads_to_bearing_when_clear() {
        let pos = Vector2::new(100.0, 100.0);
        let command = compute_command(&pos, &Vector2::new(200.0, 100.0), 0.0, 0.0, &CLEAR, 10.0);
        assert_eq!(command.status, CommandStatus::Moved);
        assert_eq!(command.heading, 90.0);
        assert_eq!(command.speed, 0.5);
        assert!(!command.avoided);
    }

    #[test]
    fn test_speed_capped_by_max_speed() {
        let pos = Vector2::new(0.0, 500.0);
        let command = compute_command(&pos, &Vector2::new(0.0, 0.0), 9.8, 0.0, &CLEAR, 10.0);
        assert_eq!(command.speed, 10.0);
        assert_eq!(command.heading, 0.0);
    }

    #[test]
    fn test_clear_sectors_never_override_bearing() {
        let pos = Vector2::new(400.0, 300.0);
        for i in 0..36 {
            let angle = (i as f64 * 10.0 + 3.0).to_radians();
            let target = Vector2::new(400.0 + 200.0 * angle.sin(), 300.0 - 200.0 * angle.cos());
            let distances = [20.0, 35.0, 20.0, 99.0, 20.0, 60.0];
            let command = compute_command(&pos, &target, 1.0, 0.0, &distances, 10.0);
            let expected = math_utils::normalize_heading(
                math_utils::normalize_heading(math_utils::bearing(&pos, &target)).round_ties_even(),
            );
            assert_eq!(command.heading, expected);
            assert!(!command.avoided);
        }
    }

    #[test]
    fn test_blocked_sector_turns_to_clearest() {
        let pos = Vector2::new(100.0, 100.0);
        // 目標は東（セクター1）
        let distances = [30.0, 10.0, 50.0, 50.0, 40.0, 5.0];
        let command = compute_command(&pos, &Vector2::new(300.0, 100.0), 2.0, 90.0, &distances, 10.0);
        assert_eq!(command.heading, 120.0);
        assert_eq!(command.speed, 2.5);
        assert!(command.avoided);
    }

    #[test]
    fn test_empty_distances_skip_avoidance() {
        let pos = Vector2::new(100.0, 100.0);
        let command = compute_command(&pos, &Vector2::new(300.0, 100.0), 2.0, 0.0, &[], 10.0);
        assert_eq!(command.heading, 90.0);
    }

    #[test]
    fn test_braking_near_target() {
        let pos = Vector2::new(100.0, 100.0);
        let target = Vector2::new(100.0, 88.0);
        let command = compute_command(&pos, &target, 9.0, 0.0, &CLEAR, 10.0);
        // 距離 12 < 制動距離 19 → 速度は 6 に制限
        assert_eq!(command.speed, 6.0);
        assert!(command.speed <= 12.0 / 2.0);
    }

    #[test]
    fn test_braking_bound_holds() {
        let pos = Vector2::new(50.0, 50.0);
        for (i, speed) in [0.0, 1.0, 3.5, 8.0, 20.0].iter().enumerate() {
            let target = Vector2::new(56.0 + i as f64 * 3.0, 50.0);
            let d = pos.distance(&target);
            let command = compute_command(&pos, &target, *speed, 0.0, &CLEAR, 25.0);
            assert_eq!(command.status, CommandStatus::Moved);
            assert!(command.speed <= d / 2.0);
        }
    }

    #[test]
    fn test_heading_rounds_half_to_even_and_normalizes() {
        let controller = NavigationController::new(NavigationParams {
            heading_offset_deg: 0.5,
            ..NavigationParams::default()
        });
        let pos = Vector2::new(100.0, 100.0);
        // 方位 0° − 0.5 = −0.5 → 偶数丸めで −0 → 0
        let command = controller.compute_command(&pos, &Vector2::new(100.0, 0.0), 0.0, 0.0, &CLEAR, 10.0);
        assert_eq!(command.heading, 0.0);

        // 方位 90° − 0.5 = 89.5 → 偶数丸めで 90
        let command = controller.compute_command(&pos, &Vector2::new(300.0, 100.0), 0.0, 0.0, &CLEAR, 10.0);
        assert_eq!(command.heading, 90.0);
    }

    #[test]
    fn test_heading_offset_wraps() {
        let controller = NavigationController::new(NavigationParams {
            heading_offset_deg: 60.0,
            ..NavigationParams::default()
        });
        let pos = Vector2::new(100.0, 100.0);
        let command = controller.compute_command(&pos, &Vector2::new(100.0, 0.0), 0.0, 0.0, &CLEAR, 10.0);
        assert_eq!(command.heading, 300.0);
    }
}
