//! # Realtime モジュール
//!
//! 実時間（壁時計）駆動でシミュレーションを進めるドライバです。
//!
//! 車両状態は `SharedSimulation` の排他ロックの内側にのみ存在し、ティック処理
//! （読み取り → 判断 → 書き込み）はロックを保持したまま一括で行われます。
//! 壁時計の経過時間はこのモジュールで計測し、エンジンには明示的な引数として渡します。

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::models::CommandStatus;
use crate::simulation::{RunOutcome, RunSummary, SimulationEngine, TickReport, VehicleStatus};

/// 複数の呼び出し元から共有されるシミュレーション
#[derive(Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<SimulationEngine>>,
}

impl SharedSimulation {
    pub fn new(engine: SimulationEngine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// 1ティック分を排他的に実行
    pub async fn tick(&self, elapsed: f64) -> TickReport {
        self.inner.lock().await.step(elapsed)
    }

    /// 速度・方位を排他的に設定
    pub async fn set_velocity(&self, speed: f64, heading: f64) {
        self.inner.lock().await.set_velocity(speed, heading);
    }

    /// 車両状態のスナップショット
    pub async fn status(&self) -> VehicleStatus {
        self.inner.lock().await.status()
    }

    pub async fn summary(&self, outcome: RunOutcome) -> RunSummary {
        self.inner.lock().await.summary(outcome)
    }
}

/// ティック周期・報告周期の下限
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// 実時間実行の設定エラー
#[derive(Debug, Error, PartialEq)]
pub enum RealtimeError {
    #[error("tick period must be a finite, non-negative number of seconds: {0}")]
    InvalidTickPeriod(f64),

    #[error("tick period {dt_s}s is shorter than the {min_ms} ms minimum for realtime mode")]
    TickPeriodTooShort { dt_s: f64, min_ms: u128 },

    #[error("time scale must be a positive finite number: {0}")]
    InvalidTimeScale(f64),
}

/// 実時間実行の設定
#[derive(Debug, Clone, Copy)]
pub struct RealtimeConfig {
    /// ティック周期
    pub tick_period: Duration,
    /// 状態報告の周期
    pub report_period: Duration,
    /// 壁時計1秒あたりのシミュレーション秒数
    pub time_scale: f64,
    /// シミュレーション時間の上限（秒）
    pub max_sim_time: f64,
    /// 1ティックでエンジンに渡す経過時間の上限（秒）
    ///
    /// ティックが遅延しても、ロック保持中の積分量はこの値までに抑えられます。
    pub max_tick_elapsed: f64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(100),
            report_period: Duration::from_secs(1),
            time_scale: 1.0,
            max_sim_time: 600.0,
            max_tick_elapsed: 1.0,
        }
    }
}

impl RealtimeConfig {
    /// シミュレーション刻み（秒）と時間倍率から設定を作成します
    ///
    /// 刻みが非有限・負、または `MIN_TICK_PERIOD` 未満の場合はエラーを返します。
    pub fn from_step(dt_s: f64, time_scale: f64, max_sim_time: f64) -> Result<Self, RealtimeError> {
        let tick_period = Duration::try_from_secs_f64(dt_s)
            .map_err(|_| RealtimeError::InvalidTickPeriod(dt_s))?;
        if tick_period < MIN_TICK_PERIOD {
            return Err(RealtimeError::TickPeriodTooShort {
                dt_s,
                min_ms: MIN_TICK_PERIOD.as_millis(),
            });
        }
        if !(time_scale.is_finite() && time_scale > 0.0) {
            return Err(RealtimeError::InvalidTimeScale(time_scale));
        }

        Ok(Self {
            tick_period,
            time_scale,
            max_sim_time,
            ..Self::default()
        })
    }
}

/// 実時間でシミュレーションを実行します
///
/// ティックごとに前回からの壁時計経過時間を計測し、`time_scale` 倍してエンジンに渡します。
/// 並行して状態報告タスクが同じロック越しにスナップショットを読み出します。
pub async fn run_realtime(shared: SharedSimulation, config: RealtimeConfig) -> RunSummary {
    info!(
        tick_ms = config.tick_period.as_millis() as u64,
        time_scale = config.time_scale,
        "=== 実時間シミュレーション開始 ==="
    );

    let reporter = {
        let shared = shared.clone();
        let period = config.report_period.max(MIN_TICK_PERIOD);
        tokio::spawn(async move {
            let mut interval = time::interval(period);
            loop {
                interval.tick().await;
                let status = shared.status().await;
                info!(
                    x = status.x,
                    y = status.y,
                    speed = status.speed,
                    heading = status.heading,
                    time = status.time,
                    "VEHICLE_STATUS"
                );
            }
        })
    };

    let mut interval = time::interval(config.tick_period.max(MIN_TICK_PERIOD));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last = Instant::now();
    let outcome = loop {
        interval.tick().await;

        let now = Instant::now();
        let scaled = now.duration_since(last).as_secs_f64() * config.time_scale;
        last = now;

        let elapsed = scaled.min(config.max_tick_elapsed);
        if elapsed < scaled {
            debug!(scaled = scaled, elapsed = elapsed, "ティック遅延のため経過時間を制限しました");
        }

        let report = shared.tick(elapsed).await;

        if report.command.status == CommandStatus::Success {
            info!(x = report.state.position.x, y = report.state.position.y, "VEHICLE_ARRIVED: 目標位置に到達しました");
            break RunOutcome::Arrived;
        }
        if report.time >= config.max_sim_time {
            warn!(time = report.time, "シミュレーション時間の上限に達しました");
            break RunOutcome::TimeLimit;
        }
    };

    reporter.abort();
    shared.summary(outcome).await
}
