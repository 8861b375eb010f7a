//! 驱动层模块
//!
//! 本模块提供 SSC-32 六足机器人的设备驱动功能，包括：
//! - 串口会话（整行写入、应答读取、状态查询）
//! - 运动状态机（写入成功后才迁移）
//! - 指令构建器与步态序列的全量/差分下发
//! - 单消费者指令队列（控制线程独占串口）
//!
//! # 使用场景
//!
//! 一次性操作直接使用 [`Controller`]；多个输入源并发时，把控制器交给
//! [`ControllerTask`]，各输入源只发布 [`Intent`]。

mod builder;
pub mod command;
pub mod controller;
mod error;
pub mod metrics;
pub mod pipeline;
mod sequencer;
pub mod ssc32;
pub mod state;

pub use builder::ControllerBuilder;
pub use command::Command;
pub use controller::{Baseline, Controller, ControllerStatus, WalkDirection};
pub use error::DriverError;
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use pipeline::{ControllerTask, Intent, Reply, SPEED_STEP, dispatch};
pub use ssc32::{SessionConfig, Ssc32};
pub use state::{MovementState, RobotModel};
