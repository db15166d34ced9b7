//! # Simulation モジュール
//!
//! 車両シミュレーションの外側のドライバを提供します。
//!
//! `SimulationEngine` は唯一の `VehicleState` と軌跡を所有し、不変のフィールド設定に対して
//! 1ティックずつ「知覚 → 判断 → 運動」を実行します。経過時間は常に呼び出し側から
//! 明示的に与えられ、エンジン自身はシステム時計を読みません。
//!
//! ## ティック処理順序
//!
//! 1. **センサー処理**: 現在位置から6セクターの障害物距離を計測
//! 2. **航法処理**: 目標位置とセクター距離から速度・方位指令を決定
//! 3. **運動処理**: 指令を車両状態に反映し、経過時間分だけサブステップ積分
//!
//! ## 使用例
//!
//! ```no_run
//! use fieldnav::scenario::ScenarioConfig;
//! use fieldnav::simulation::SimulationEngine;
//!
//! let config = ScenarioConfig::from_file("scenarios/mine_field.yaml")?;
//! let mut engine = SimulationEngine::new(config, 1)?;
//! let summary = engine.run();
//! println!("{:?}", summary.outcome);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::models::{
    math_utils, cast_sector_distances, Advance, Command, CommandStatus, FieldConfig, MotionIntegrator,
    NavigationController, SensorReading, Vector2, VehicleState,
};
use crate::scenario::{ScenarioConfig, ScenarioError};
use tracing::{info, debug, trace};

/// 1ティックの処理結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// ティック終了時のシミュレーション時刻（秒）
    pub time: f64,
    /// ティック開始時のセンサー計測値
    pub reading: SensorReading,
    /// 航法指令
    pub command: Command,
    /// 障害物に接触して停止したかどうか
    pub collided: bool,
    /// ティック終了時の車両状態
    pub state: VehicleState,
}

/// 外部へ公開する車両状態のスナップショット
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleStatus {
    /// X座標（整数に丸め）
    pub x: f64,
    /// Y座標（整数に丸め）
    pub y: f64,
    pub speed: f64,
    pub heading: f64,
    pub time: f64,
    pub trail_len: usize,
}

/// シミュレーション終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// 目標位置に到達した
    Arrived,
    /// 最大シミュレーション時間に達した
    TimeLimit,
    /// 最大ステップ数に達した
    StepLimit,
}

/// シミュレーション実行結果の統計
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub time: f64,
    pub steps: u64,
    pub collisions: u64,
    pub avoidance_turns: u64,
    pub distance_travelled: f64,
    pub final_position: Vector2,
}

pub struct SimulationEngine {
    pub dt: f64,
    pub max_time: f64,
    pub max_steps: u64,
    pub step_count: u64,

    pub field: FieldConfig,
    pub controller: NavigationController,
    pub integrator: MotionIntegrator,
    pub max_speed: f64,
    pub max_detect_distance: f64,

    state: VehicleState,
    trail: Vec<Vector2>,
    collisions: u64,
    avoidance_turns: u64,
    distance_travelled: f64,

    pub scenario_config: ScenarioConfig,
    pub verbose_level: u8,
}

impl SimulationEngine {
    /// シナリオ設定からエンジンを作成します
    ///
    /// フィールド設定の検証に失敗した場合はエラーを返します。
    pub fn new(scenario: ScenarioConfig, verbose_level: u8) -> Result<Self, ScenarioError> {
        scenario.validate()?;
        let field = scenario.field_config()?;
        let state = VehicleState::at_rest(field.start_position());

        let engine = Self {
            dt: scenario.sim.dt_s,
            max_time: scenario.sim.t_max_s,
            max_steps: scenario.sim.max_steps,
            step_count: 0,
            controller: NavigationController::new(scenario.navigation.params()),
            integrator: MotionIntegrator::new(scenario.navigation.step_size),
            max_speed: scenario.vehicle.max_speed,
            max_detect_distance: scenario.vehicle.max_detect_distance,
            field,
            state,
            trail: Vec::new(),
            collisions: 0,
            avoidance_turns: 0,
            distance_travelled: 0.0,
            scenario_config: scenario,
            verbose_level,
        };

        if verbose_level > 0 {
            info!(
                field_width = engine.field.width(),
                field_height = engine.field.height(),
                obstacles = engine.field.obstacles().len(),
                start_x = engine.state.position.x,
                start_y = engine.state.position.y,
                target_x = engine.field.end_position().x,
                target_y = engine.field.end_position().y,
                "シミュレーションエンジンを初期化しました"
            );
        }

        Ok(engine)
    }

    /// 現在の車両状態
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// これまでの軌跡
    pub fn trail(&self) -> &[Vector2] {
        &self.trail
    }

    /// 現在位置でのセンサー計測
    pub fn sense(&self) -> SensorReading {
        cast_sector_distances(
            &self.state.position,
            self.field.obstacles(),
            self.field.size(),
            self.max_detect_distance,
        )
    }

    /// 1ティック分のシミュレーションを実行します
    ///
    /// # 引数
    ///
    /// * `elapsed` - 前回のティックからの経過時間（秒）
    pub fn step(&mut self, elapsed: f64) -> TickReport {
        let reading = self.sense();

        let command = self.controller.compute_command(
            &self.state.position,
            &self.field.end_position(),
            self.state.speed,
            self.state.heading,
            reading.as_slice(),
            self.max_speed,
        );

        if command.avoided {
            self.avoidance_turns += 1;
        }

        self.state.speed = command.speed;
        self.state.heading = command.heading;

        let result = self.apply_motion(elapsed);
        self.step_count += 1;

        if self.verbose_level > 2 {
            trace!(
                time = self.state.last_update,
                step = self.step_count,
                x = self.state.position.x,
                y = self.state.position.y,
                speed = self.state.speed,
                heading = self.state.heading,
                status = command.status.as_str(),
                "ティック処理完了"
            );
        }

        TickReport {
            time: self.state.last_update,
            reading,
            command,
            collided: result.collided,
            state: self.state,
        }
    }

    /// 航法処理を行わず、現在の速度・方位のまま前進させます
    pub fn advance_only(&mut self, elapsed: f64) -> Advance {
        self.apply_motion(elapsed)
    }

    fn apply_motion(&mut self, elapsed: f64) -> Advance {
        let result = self.integrator.advance(&self.state, &self.field, elapsed);

        self.distance_travelled += self.state.position.distance(&result.state.position);
        if let Some(point) = result.trail_point {
            self.trail.push(point);
        }
        if result.collided {
            self.collisions += 1;
        }

        self.state = result.state;
        result
    }

    /// 速度と方位を直接設定します
    ///
    /// 速度は [0, max_speed] に、方位は [0, 360) に収めます。
    pub fn set_velocity(&mut self, speed: f64, heading: f64) {
        let speed = if speed.is_finite() { speed.clamp(0.0, self.max_speed) } else { 0.0 };
        let heading = if heading.is_finite() { math_utils::normalize_heading(heading) } else { 0.0 };

        self.state.speed = speed;
        self.state.heading = heading;

        debug!(speed = speed, heading = heading, "速度・方位を設定しました");
    }

    /// 車両を開始位置に戻し、速度・方位・軌跡をリセットします
    ///
    /// シミュレーション時刻は巻き戻しません。
    pub fn reset_position(&mut self) {
        self.state.position = self.field.start_position();
        self.state.speed = 0.0;
        self.state.heading = 0.0;
        self.trail.clear();

        info!(
            x = self.state.position.x,
            y = self.state.position.y,
            "VEHICLE_RESET: 車両を開始位置に戻しました"
        );
    }

    /// 外部から与えられた座標がフィールド内かつ障害物外にあるか
    pub fn validate_point(&self, point: &Vector2) -> bool {
        self.field.is_free(point)
    }

    /// 現在の車両状態のスナップショット
    pub fn status(&self) -> VehicleStatus {
        VehicleStatus {
            x: self.state.position.x.round_ties_even(),
            y: self.state.position.y.round_ties_even(),
            speed: self.state.speed,
            heading: self.state.heading,
            time: self.state.last_update,
            trail_len: self.trail.len(),
        }
    }

    /// 現在までの統計
    pub fn summary(&self, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            outcome,
            time: self.state.last_update,
            steps: self.step_count,
            collisions: self.collisions,
            avoidance_turns: self.avoidance_turns,
            distance_travelled: self.distance_travelled,
            final_position: self.state.position,
        }
    }

    /// 固定時間刻みでシミュレーションを実行します
    ///
    /// 目標到達、最大時間、最大ステップ数のいずれかで終了します。
    pub fn run(&mut self) -> RunSummary {
        info!("=== シミュレーション実行開始 ===");

        let outcome = loop {
            if self.state.last_update >= self.max_time {
                break RunOutcome::TimeLimit;
            }
            if self.step_count >= self.max_steps {
                break RunOutcome::StepLimit;
            }

            let report = self.step(self.dt);

            if report.command.status == CommandStatus::Success {
                info!(
                    x = report.state.position.x,
                    y = report.state.position.y,
                    time = report.time,
                    steps = self.step_count,
                    "VEHICLE_ARRIVED: 目標位置に到達しました"
                );
                break RunOutcome::Arrived;
            }

            if self.step_count % 100 == 0 && self.verbose_level > 0 {
                let progress = (self.state.last_update / self.max_time) * 100.0;
                info!(
                    "進行状況: {:.1}% ({:.1}/{:.1}秒) 位置: ({:.0}, {:.0}) 目標まで: {:.1}",
                    progress,
                    self.state.last_update,
                    self.max_time,
                    self.state.position.x,
                    self.state.position.y,
                    self.state.position.distance(&self.field.end_position())
                );
            }
        };

        let summary = self.summary(outcome);

        info!("=== シミュレーション完了 ===");
        info!("終了理由: {:?}", summary.outcome);
        info!("経過時間: {:.1}秒", summary.time);
        info!("総ステップ数: {}", summary.steps);
        info!("走行距離: {:.1}", summary.distance_travelled);
        info!("接触回数: {}", summary.collisions);

        summary
    }
}
