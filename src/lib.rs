//! # fieldnav
//!
//! 静的障害物のある2次元フィールドを走行する小型車両のシミュレーション。
//!
//! - `models::sensor`: 6セクターのレイキャスト測距
//! - `models::controller`: 目標追従・障害物回避・制動を行う反応型制御則
//! - `models::motion`: 衝突判定付きのサブステップ運動積分
//! - `simulation` / `realtime`: 車両状態を所有する外側のドライバ

pub mod logging;
pub mod models;
pub mod realtime;
pub mod scenario;
pub mod simulation;
