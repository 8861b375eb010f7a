//! One-shot 模式
//!
//! 每个命令独立执行：
//! 1. 读取配置（命令行参数优先）
//! 2. 打开串口
//! 3. 执行操作
//! 4. 停止行走并关闭串口（`Controller` Drop）

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, bounded};
use hexbot_driver::{Controller, ControllerBuilder, SessionConfig};
use hexbot_protocol::GaitSequence;
use hexbot_tools::{HexbotConfig, load_sequence};
use std::path::{Path, PathBuf};

/// One-shot 模式配置
#[derive(Debug, Clone)]
pub struct OneShotConfig {
    /// SSC-32 串口
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,

    /// 初始速度
    pub speed: u8,

    /// 步态序列文件
    pub sequence: Option<PathBuf>,
}

impl OneShotConfig {
    /// 合并配置文件与命令行参数
    pub fn resolve(config: &HexbotConfig, port: Option<String>, baud_rate: Option<u32>) -> Self {
        Self {
            port: port.unwrap_or_else(|| config.serial.port.clone()),
            baud_rate: baud_rate.unwrap_or(config.serial.baud_rate),
            read_timeout_ms: config.serial.read_timeout_ms,
            speed: config.gait.default_speed,
            sequence: config.gait.sequence.clone(),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            read_timeout_ms: self.read_timeout_ms,
            ..SessionConfig::default()
        }
    }

    /// 序列模板（未配置文件时使用默认序列）
    pub fn template(&self) -> Result<GaitSequence> {
        match &self.sequence {
            Some(path) => load_template(path),
            None => Ok(GaitSequence::default()),
        }
    }

    /// 打开串口并创建控制器
    pub fn connect(&self) -> Result<Controller> {
        self.connect_with(self.template()?)
    }

    /// 使用指定的序列模板打开串口
    pub fn connect_with(&self, template: GaitSequence) -> Result<Controller> {
        println!("⏳ 连接到 SSC-32 ({} @ {} bps)...", self.port, self.baud_rate);
        let controller = ControllerBuilder::new()
            .port(&self.port)
            .baud_rate(self.baud_rate)
            .session_config(self.session_config())
            .speed(self.speed)
            .sequence(template)
            .build()
            .with_context(|| format!("打开串口 {} 失败", self.port))?;
        println!("✅ 已连接");
        Ok(controller)
    }
}

fn load_template(path: &Path) -> Result<GaitSequence> {
    load_sequence(path).with_context(|| format!("加载步态序列 {} 失败", path.display()))
}

/// 安装 Ctrl+C 处理器，返回退出信号通道
pub fn interrupt_signal() -> Result<Receiver<()>> {
    let (tx, rx) = bounded(1);
    ctrlc::set_handler(move || {
        // 信号尚未被处理时忽略重复的 Ctrl+C
        let _ = tx.try_send(());
    })
    .context("安装 Ctrl+C 处理器失败")?;
    Ok(rx)
}
