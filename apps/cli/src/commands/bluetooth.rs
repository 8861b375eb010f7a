//! 蓝牙串口前端
//!
//! 从蓝牙串口（rfcomm）逐行读取行协议指令，提交给控制线程。
//! 遥控端不等待结果，队列满时丢弃指令。

use anyhow::{Context, Result};
use clap::Args;
use crossbeam_channel::Receiver;
use hexbot_driver::{ControllerTask, DriverError, Intent};
use hexbot_serial::{LineBuffer, SerialAdapter, SerialError, SerialPortAdapter};
use hexbot_tools::config::BluetoothSettings;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::actions::{Action, ActionError, parse_action};
use crate::modes::oneshot::{OneShotConfig, interrupt_signal};

/// 启动姿态：各腿垂直舵机抬到同一高度
pub const INIT_POSE_CHANNELS: [u8; 6] = [6, 7, 8, 22, 23, 24];
pub const INIT_POSE_PULSE: u16 = 1000;

const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// 蓝牙前端命令参数
#[derive(Args, Debug)]
pub struct BluetoothCommand {
    /// 蓝牙串口（覆盖配置）
    #[arg(long)]
    pub bt_port: Option<String>,

    /// 蓝牙串口波特率（覆盖配置）
    #[arg(long)]
    pub bt_baud: Option<u32>,

    /// 不移动到启动姿态
    #[arg(long)]
    pub no_init_pose: bool,
}

impl BluetoothCommand {
    pub fn execute(&self, config: &OneShotConfig, bluetooth: &BluetoothSettings) -> Result<()> {
        let port = self.bt_port.as_deref().unwrap_or(&bluetooth.port);
        let baud_rate = self.bt_baud.unwrap_or(bluetooth.baud_rate);

        let controller = config.connect()?;
        let task = ControllerTask::spawn(controller)?;

        if !self.no_init_pose {
            task.request(init_pose())?;
            println!("✅ 已移动到启动姿态");
        }

        println!("⏳ 打开蓝牙串口 {} @ {} bps...", port, baud_rate);
        let mut adapter = SerialPortAdapter::open(port, baud_rate, READ_TIMEOUT)
            .with_context(|| format!("打开蓝牙串口 {} 失败", port))?;
        println!("✅ 等待遥控指令（Ctrl+C 退出）");

        let stop_rx = interrupt_signal()?;
        serve(&mut adapter, &task, &stop_rx)?;

        drop(task);
        println!("👋 已退出");
        Ok(())
    }
}

/// 启动姿态指令
pub fn init_pose() -> Intent {
    Intent::MoveServos(
        INIT_POSE_CHANNELS
            .iter()
            .map(|&channel| (channel, INIT_POSE_PULSE))
            .collect(),
    )
}

/// 读取并分发遥控指令，直到收到 `QUIT` 或退出信号
pub fn serve(
    adapter: &mut dyn SerialAdapter,
    task: &ControllerTask,
    stop_rx: &Receiver<()>,
) -> Result<()> {
    let mut buffer = LineBuffer::new();
    loop {
        if stop_rx.try_recv().is_ok() {
            info!("Interrupted, leaving remote control");
            return Ok(());
        }
        match adapter.read_available(READ_TIMEOUT) {
            Ok(bytes) => buffer.push(&bytes),
            Err(SerialError::Timeout) => continue,
            Err(e) => return Err(e).context("蓝牙串口读取失败"),
        }
        while let Some(line) = buffer.next_line() {
            if !dispatch_remote(task, &line) {
                info!("Remote requested QUIT");
                return Ok(());
            }
        }
    }
}

/// 分发一行遥控指令，返回 false 表示退出
fn dispatch_remote(task: &ControllerTask, line: &str) -> bool {
    match parse_action(line) {
        Ok(Action::Quit) => return false,
        Ok(Action::Help) | Err(ActionError::Empty) => {},
        Ok(Action::Intent(intent)) => {
            debug!("Remote: {:?}", intent);
            match task.send(intent) {
                Ok(()) => {},
                Err(DriverError::ChannelFull) => warn!("Command queue full, dropping '{}'", line),
                Err(e) => warn!("Cannot dispatch '{}': {}", line, e),
            }
        },
        Err(e) => warn!("Ignoring remote line: {}", e),
    }
    true
}
